use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use shared::PhaseToken;

use crate::domain::entities::Schedule;

/// Day/night overlap counts for one unordered employee pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairOverlap {
    pub a: String,
    pub b: String,
    pub day_overlap: u32,
    pub night_overlap: u32,
}

/// Matched pair-hours split into the day and night buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairHours {
    pub day: i32,
    pub night: i32,
}

impl PairHours {
    pub fn total(self) -> i32 {
        self.day + self.night
    }
}

fn in_range(date: NaiveDate, range: Option<(NaiveDate, NaiveDate)>) -> bool {
    match range {
        Some((from, to)) => from <= date && date <= to,
        None => true,
    }
}

/// Count shared working days for every unordered pair, sorted by descending
/// day overlap, then night overlap, then ids. Counting uses the plain token
/// projection: every night code, the day-1 N8 carry included, is an N here.
pub fn compute_pairs(schedule: &Schedule) -> Vec<PairOverlap> {
    let ids = schedule.employee_ids();
    let n = ids.len();
    let mut day = vec![vec![0u32; n]; n];
    let mut night = vec![vec![0u32; n]; n];

    for (_, rows) in schedule.iter_days() {
        let mut tokens = vec![PhaseToken::O; n];
        for a in rows {
            if let Ok(i) = ids.binary_search(&a.employee_id) {
                tokens[i] = a.shift_code.token();
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                match (tokens[i], tokens[j]) {
                    (PhaseToken::D, PhaseToken::D) => day[i][j] += 1,
                    (PhaseToken::N, PhaseToken::N) => night[i][j] += 1,
                    _ => {}
                }
            }
        }
    }

    let mut out = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(PairOverlap {
                a: ids[i].clone(),
                b: ids[j].clone(),
                day_overlap: day[i][j],
                night_overlap: night[i][j],
            });
        }
    }
    sort_pairs(&mut out);
    out
}

fn sort_pairs(pairs: &mut [PairOverlap]) {
    pairs.sort_by(|x, y| {
        y.day_overlap
            .cmp(&x.day_overlap)
            .then(y.night_overlap.cmp(&x.night_overlap))
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });
}

/// Greedy exclusive matching: pairs at or above the day-overlap threshold,
/// strongest first, each employee used at most once.
pub fn exclusive_matching(pairs: &[PairOverlap], threshold: u32) -> Vec<PairOverlap> {
    let mut candidates: Vec<PairOverlap> = pairs
        .iter()
        .filter(|p| p.day_overlap >= threshold)
        .cloned()
        .collect();
    sort_pairs(&mut candidates);

    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::new();
    for p in candidates {
        if used.contains(&p.a) || used.contains(&p.b) {
            continue;
        }
        used.insert(p.a.clone());
        used.insert(p.b.clone());
        out.push(p);
    }
    out
}

/// Matched hours of a pair over `range` (whole schedule when `None`). A day
/// contributes `min(hours)` to the bucket both members share; the N8 carry
/// on day 1 is an O here and contributes nothing.
pub fn pair_hours(
    schedule: &Schedule,
    a: &str,
    b: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> PairHours {
    let mut out = PairHours::default();
    for (date, _) in schedule.iter_days() {
        if !in_range(date, range) {
            continue;
        }
        let first = date.day() == 1;
        let code_a = schedule.code_on(a, date);
        let code_b = schedule.code_on(b, date);
        let matched = code_a.hours().min(code_b.hours());
        match (code_a.pair_token(first), code_b.pair_token(first)) {
            (PhaseToken::D, PhaseToken::D) => out.day += matched,
            (PhaseToken::N, PhaseToken::N) => out.night += matched,
            _ => {}
        }
    }
    out
}

/// Matched hours restricted to days where both members also share the same
/// office. The tightest pair-breaking criterion.
pub fn same_office_hours(
    schedule: &Schedule,
    a: &str,
    b: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> i32 {
    let mut hours = 0;
    for (date, _) in schedule.iter_days() {
        if !in_range(date, range) {
            continue;
        }
        let first = date.day() == 1;
        let code_a = schedule.code_on(a, date);
        let code_b = schedule.code_on(b, date);
        let tok_a = code_a.pair_token(first);
        if tok_a == PhaseToken::O || tok_a != code_b.pair_token(first) {
            continue;
        }
        match (code_a.office(), code_b.office()) {
            (Some(oa), Some(ob)) if oa == ob => hours += code_a.hours().min(code_b.hours()),
            _ => {}
        }
    }
    hours
}

/// Hours of the exclusive previous-month pairs in the current schedule,
/// strongest total first.
pub fn pair_hours_exclusive(
    schedule: &Schedule,
    prev_pairs: &[PairOverlap],
    threshold: u32,
) -> Vec<(PairOverlap, PairHours)> {
    let mut out: Vec<(PairOverlap, PairHours)> = exclusive_matching(prev_pairs, threshold)
        .into_iter()
        .map(|p| {
            let hours = pair_hours(schedule, &p.a, &p.b, None);
            (p, hours)
        })
        .collect();
    out.sort_by(|(pa, ha), (pb, hb)| {
        hb.total()
            .cmp(&ha.total())
            .then(hb.day.cmp(&ha.day))
            .then(hb.night.cmp(&ha.night))
            .then(pa.a.cmp(&pb.a))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Assignment;
    use shared::{AssignmentSource, ShiftCode};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn schedule_with(cells: &[(&str, u32, ShiftCode)]) -> Schedule {
        let days: Vec<NaiveDate> = (1..=6).map(d).collect();
        let mut s = Schedule::with_days(days.iter().copied());
        let ids: BTreeSet<&str> = cells.iter().map(|(id, _, _)| *id).collect();
        for id in ids {
            for &day in &days {
                s.put(Assignment::new(id, day, ShiftCode::Off, AssignmentSource::Template));
            }
        }
        for (id, day, code) in cells {
            s.set_code(id, d(*day), *code, AssignmentSource::Template);
        }
        s
    }

    fn overlap(a: &str, b: &str, day: u32, night: u32) -> PairOverlap {
        PairOverlap {
            a: a.into(),
            b: b.into(),
            day_overlap: day,
            night_overlap: night,
        }
    }

    #[test]
    fn test_compute_pairs_counts_and_orders() {
        let s = schedule_with(&[
            ("E01", 1, ShiftCode::Da),
            ("E02", 1, ShiftCode::Db),
            ("E01", 2, ShiftCode::Da),
            ("E02", 2, ShiftCode::Da),
            ("E03", 2, ShiftCode::Na),
            ("E01", 3, ShiftCode::Na),
            ("E03", 3, ShiftCode::Nb),
        ]);
        let pairs = compute_pairs(&s);
        assert_eq!(pairs[0].a, "E01");
        assert_eq!(pairs[0].b, "E02");
        assert_eq!(pairs[0].day_overlap, 2);
        let e1e3 = pairs.iter().find(|p| p.a == "E01" && p.b == "E03").unwrap();
        assert_eq!(e1e3.day_overlap, 0);
        assert_eq!(e1e3.night_overlap, 1);
    }

    #[test]
    fn test_compute_pairs_counts_day_one_carry_as_night() {
        let s = schedule_with(&[("E01", 1, ShiftCode::N8a), ("E02", 1, ShiftCode::Na)]);
        let pairs = compute_pairs(&s);
        assert_eq!(pairs[0].night_overlap, 1);
    }

    #[test]
    fn test_exclusive_matching_is_greedy_and_exclusive() {
        let pairs = vec![
            overlap("E01", "E02", 9, 1),
            overlap("E01", "E03", 8, 5),
            overlap("E03", "E04", 7, 0),
            overlap("E05", "E06", 5, 0),
        ];
        let matched = exclusive_matching(&pairs, 6);
        assert_eq!(matched.len(), 2);
        assert_eq!((matched[0].a.as_str(), matched[0].b.as_str()), ("E01", "E02"));
        // E01/E03 is blocked by the stronger pair; E03 falls through to E04.
        assert_eq!((matched[1].a.as_str(), matched[1].b.as_str()), ("E03", "E04"));
    }

    #[test]
    fn test_pair_hours_ignores_day_one_carry() {
        let s = schedule_with(&[
            ("E01", 1, ShiftCode::N8a),
            ("E02", 1, ShiftCode::N8a),
            ("E01", 2, ShiftCode::Da),
            ("E02", 2, ShiftCode::M8a),
            ("E01", 3, ShiftCode::Na),
            ("E02", 3, ShiftCode::Nb),
        ]);
        let hours = pair_hours(&s, "E01", "E02", None);
        // Day 1: both O by the pair projection. Day 2: min(12, 8).
        assert_eq!(hours.day, 8);
        assert_eq!(hours.night, 12);
        assert_eq!(hours.total(), 20);
    }

    #[test]
    fn test_same_office_hours_requires_office_match() {
        let s = schedule_with(&[
            ("E01", 2, ShiftCode::Da),
            ("E02", 2, ShiftCode::Da),
            ("E01", 3, ShiftCode::Na),
            ("E02", 3, ShiftCode::Nb),
        ]);
        assert_eq!(same_office_hours(&s, "E01", "E02", None), 12);
        assert_eq!(same_office_hours(&s, "E01", "E02", Some((d(3), d(6)))), 0);
    }

    #[test]
    fn test_pair_hours_exclusive_scores_previous_pairs() {
        let s = schedule_with(&[
            ("E01", 2, ShiftCode::Da),
            ("E02", 2, ShiftCode::Db),
            ("E03", 2, ShiftCode::Da),
            ("E04", 2, ShiftCode::Da),
        ]);
        let prev = vec![overlap("E01", "E02", 8, 0), overlap("E03", "E04", 7, 0)];
        let scored = pair_hours_exclusive(&s, &prev, 6);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].0.a, "E01");
        assert_eq!(scored[0].1.day, 12);
    }
}
