use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use shared::PhaseToken;

use crate::domain::entities::{Employee, Schedule};
use crate::domain::policy::PairBreakingPolicy;
use crate::domain::services::{coverage, pairing, shift_ops};

/// Result of a balancing pass: the (possibly) mutated schedule, the full
/// attempt log, the accepted-operation log, and the pair score before and
/// after.
#[derive(Debug, Clone)]
pub struct BalanceOutcome {
    pub schedule: Schedule,
    pub ops_log: Vec<String>,
    pub apply_log: Vec<String>,
    pub pair_score_before: i64,
    pub pair_score_after: i64,
    pub solo_after: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    MinusOne,
    PlusOne,
    FlipDay,
    FlipNight,
}

impl OpKind {
    fn label(self) -> &'static str {
        match self {
            OpKind::MinusOne => "-1",
            OpKind::PlusOne => "+1",
            OpKind::FlipDay => "flipD",
            OpKind::FlipNight => "flipN",
        }
    }
}

/// Sum of day overlaps over all pairs: the coarse objective reported before
/// and after a pass.
fn pair_score(pairs: &[pairing::PairOverlap]) -> i64 {
    pairs.iter().map(|p| p.day_overlap as i64).sum()
}

/// Predicted whole-month hour effect of a minus-one shift, read off the
/// end-of-month stage: pulling the tail one day earlier drags next cycle's
/// token onto the last day. A trailing D gains the 4h split tail (−8 net), a
/// trailing O,O gains a full D (±0), anything else gains an O (−12).
fn predicted_minus_delta(schedule: &Schedule, employee_id: &str) -> i32 {
    let dates = schedule.dates();
    let tokens: Vec<PhaseToken> = dates
        .iter()
        .map(|&d| schedule.code_on(employee_id, d).pair_token(d.day() == 1))
        .collect();
    match tokens.last() {
        Some(PhaseToken::D) => -8,
        Some(PhaseToken::N) => -12,
        Some(PhaseToken::O) => {
            let trailing = tokens.iter().rev().take_while(|&&t| t == PhaseToken::O).count();
            if trailing >= 2 {
                0
            } else {
                -12
            }
        }
        None => 0,
    }
}

/// The member whose minus-one costs the least (largest predicted delta)
/// takes the minus role; ties go to the smaller hours deficit against the
/// norm, then to the pair's first member.
fn choose_roles(
    schedule: &Schedule,
    a: &str,
    b: &str,
    norm_hours_month: i32,
    policy: &PairBreakingPolicy,
) -> (String, String) {
    let pred_a = predicted_minus_delta(schedule, a);
    let pred_b = predicted_minus_delta(schedule, b);
    if pred_a > pred_b {
        return (a.to_owned(), b.to_owned());
    }
    if pred_b > pred_a {
        return (b.to_owned(), a.to_owned());
    }
    let norm_for = |id: &str| {
        policy
            .norm_by_employee
            .get(id)
            .copied()
            .unwrap_or(norm_hours_month)
    };
    let deficit_a = norm_for(a) - schedule.employee_hours(a);
    let deficit_b = norm_for(b) - schedule.employee_hours(b);
    if deficit_a <= deficit_b {
        (a.to_owned(), b.to_owned())
    } else {
        (b.to_owned(), a.to_owned())
    }
}

struct Deltas {
    pair_excl: i32,
    solo: i32,
    same_office_window: i32,
    same_office_month: i32,
}

fn deltas(
    before: &Schedule,
    after: &Schedule,
    a: &str,
    b: &str,
    actor: &str,
    window: (NaiveDate, NaiveDate),
) -> Deltas {
    let w = Some(window);
    Deltas {
        pair_excl: pairing::pair_hours(after, a, b, w).total()
            - pairing::pair_hours(before, a, b, w).total(),
        solo: coverage::solo_days_for(after, actor, w) as i32
            - coverage::solo_days_for(before, actor, w) as i32,
        same_office_window: pairing::same_office_hours(after, a, b, w)
            - pairing::same_office_hours(before, a, b, w),
        same_office_month: pairing::same_office_hours(after, a, b, None)
            - pairing::same_office_hours(before, a, b, None),
    }
}

/// First acceptance criterion the candidate violates, if any. Checked in a
/// fixed order so rejection reasons are deterministic.
fn rejection_reason(
    kind: OpKind,
    d: &Deltas,
    predicted: i32,
    predicted_cum: i32,
    hours_budget: i32,
) -> Option<&'static str> {
    if kind == OpKind::MinusOne && d.pair_excl >= 0 {
        return Some("pair_excl");
    }
    if d.solo > 0 {
        return Some("solo");
    }
    if d.same_office_window > 0 {
        return Some("same_office_window");
    }
    if d.same_office_month > 0 {
        return Some("same_office_month");
    }
    if matches!(kind, OpKind::MinusOne | OpKind::PlusOne)
        && predicted_cum + predicted < -hours_budget
    {
        return Some("budget");
    }
    None
}

/// Greedy pair-breaking pass over the previous month's exclusive pairs.
///
/// For each target pair the four operators are tried in order; the first one
/// that applies and passes the acceptance predicate is committed. Every
/// attempt is logged. A disabled policy returns the schedule untouched.
pub fn apply_pair_breaking(
    schedule: &Schedule,
    employees: &[Employee],
    norm_hours_month: i32,
    policy: &PairBreakingPolicy,
) -> BalanceOutcome {
    let pairs_before = pairing::compute_pairs(schedule);
    let pair_score_before = pair_score(&pairs_before);

    if !policy.enabled {
        return BalanceOutcome {
            schedule: schedule.clone(),
            ops_log: Vec::new(),
            apply_log: Vec::new(),
            pair_score_before,
            pair_score_after: pair_score_before,
            solo_after: coverage::solo_days_by_employee(schedule, None),
        };
    }

    let mut targets: Vec<(String, String)> = if policy.fixed_pairs.is_empty() {
        pairing::exclusive_matching(&policy.prev_pairs, policy.overlap_threshold)
            .into_iter()
            .filter(|p| !policy.is_intern(&p.a) && !policy.is_intern(&p.b))
            .map(|p| (p.a, p.b))
            .collect()
    } else {
        policy.fixed_pairs.clone()
    };
    targets.retain(|(a, b)| !(policy.is_intern(a) && policy.is_intern(b)));

    let mut current = schedule.clone();
    let mut ops_log: Vec<String> = Vec::new();
    let mut apply_log: Vec<String> = Vec::new();
    let mut moved: BTreeSet<String> = BTreeSet::new();
    let mut ops_accepted: u32 = 0;
    let mut predicted_cum: i32 = 0;

    let first = current.first_date();
    let last = current.last_date();

    if let (Some(first), Some(last)) = (first, last) {
        for (a, b) in &targets {
            if ops_accepted >= policy.max_ops {
                break;
            }
            if moved.contains(a) || moved.contains(b) {
                continue;
            }

            let (mut minus_emp, mut plus_emp) =
                choose_roles(&current, a, b, norm_hours_month, policy);
            if policy.is_intern(&minus_emp) {
                std::mem::swap(&mut minus_emp, &mut plus_emp);
            }
            if policy.is_intern(&minus_emp) {
                continue;
            }

            let mut w0 = first;
            if current.code_on(&minus_emp, first).is_split_carry() {
                w0 += Duration::days(1);
            }
            let w1 = (first + Duration::days(policy.window_days.saturating_sub(1) as i64)).min(last);
            if w0 > w1 {
                continue;
            }
            let window = (w0, w1);

            let attempts = [
                (OpKind::MinusOne, minus_emp.clone(), plus_emp.clone()),
                (OpKind::PlusOne, plus_emp.clone(), minus_emp.clone()),
                (OpKind::FlipDay, minus_emp.clone(), plus_emp.clone()),
                (OpKind::FlipNight, plus_emp.clone(), minus_emp.clone()),
            ];

            for (kind, actor, partner) in attempts {
                if policy.is_intern(&actor) {
                    ops_log.push(format!(
                        "{actor}: op={} window=[{w0}..{w1}] → REJECT(intern)",
                        kind.label()
                    ));
                    continue;
                }
                let result = match kind {
                    OpKind::MinusOne => shift_ops::phase_shift_minus_one_skip(
                        &current,
                        &actor,
                        window,
                        Some(&partner),
                        policy.anti_align,
                    ),
                    OpKind::PlusOne => shift_ops::phase_shift_plus_one_insert_off(
                        &current,
                        &actor,
                        window,
                        Some(&partner),
                        policy.anti_align,
                    ),
                    OpKind::FlipDay => shift_ops::flip_ab_on_next_token(
                        PhaseToken::D,
                        &current,
                        &actor,
                        window,
                        Some(&partner),
                        policy.anti_align,
                    ),
                    OpKind::FlipNight => shift_ops::flip_ab_on_next_token(
                        PhaseToken::N,
                        &current,
                        &actor,
                        window,
                        Some(&partner),
                        policy.anti_align,
                    ),
                };

                let applied = match result {
                    Ok(op) => op,
                    Err(skip) => {
                        ops_log.push(format!(
                            "{actor}: op={} window=[{w0}..{w1}] → REJECT({skip})",
                            kind.label()
                        ));
                        continue;
                    }
                };

                let predicted = match kind {
                    OpKind::MinusOne => predicted_minus_delta(&current, &actor),
                    OpKind::PlusOne => applied.hours_delta,
                    OpKind::FlipDay | OpKind::FlipNight => 0,
                };
                let d = deltas(&current, &applied.schedule, a, b, &actor, window);
                let reason = rejection_reason(kind, &d, predicted, predicted_cum, policy.hours_budget);
                let verdict = match reason {
                    None => "ACCEPT".to_owned(),
                    Some(why) => format!("REJECT({why})"),
                };
                ops_log.push(format!(
                    "{actor}: op={} window=[{w0}..{w1}] Δpair_excl={} Δsolo={} Δsame_office={}/{} Δhours_pred={} Σpred={} → {verdict}",
                    kind.label(),
                    d.pair_excl,
                    d.solo,
                    d.same_office_window,
                    d.same_office_month,
                    predicted,
                    predicted_cum + predicted,
                ));

                if reason.is_none() {
                    tracing::debug!("pair_breaking: accepted {}", applied.note);
                    apply_log.push(applied.note.clone());
                    current = applied.schedule;
                    moved.insert(actor);
                    ops_accepted += 1;
                    predicted_cum += predicted;
                    break;
                }
            }
        }
    }

    // Month-wide office desync over the targets; accepted only when the
    // same-office hours do not grow.
    if policy.post_desync_all {
        for (a, b) in &targets {
            let before = pairing::same_office_hours(&current, a, b, None);
            let (candidate, flips, notes) = shift_ops::desync_pair_month(&current, a, b);
            if flips == 0 {
                continue;
            }
            let after = pairing::same_office_hours(&candidate, a, b, None);
            if after <= before {
                current = candidate;
                apply_log.push(format!("desync_pair[{a}~{b}] flips={flips}"));
                ops_log.extend(notes);
            } else {
                ops_log.push(format!("{a}~{b}: op=desync → REJECT(same_office_month)"));
            }
        }
    }

    let pairs_after = pairing::compute_pairs(&current);
    let solo_after = coverage::solo_days_by_employee(&current, None);
    BalanceOutcome {
        schedule: current,
        ops_log,
        apply_log,
        pair_score_before,
        pair_score_after: pair_score(&pairs_after),
        solo_after,
    }
}
