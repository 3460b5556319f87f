use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use shared::{AssignmentSource, DomainResult, Office, ShiftCode};

use crate::domain::catalogue::ShiftCatalogue;
use crate::domain::entities::{
    check_unique_ids, month_days, next_month, Assignment, Employee, MonthSpec, Schedule,
};

/// A generated month: the assignment matrix plus the split-night carries
/// queued for the first day of the next month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPlan {
    pub schedule: Schedule,
    pub carry_out: Vec<Assignment>,
}

/// Phase and day-office anchor of one employee on the 1st of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    phase: u8,
    day_office: Office,
}

/// Deterministic reconstruction of the month template from the previous
/// month's tail, the carry-in, and the D,N,O,O cycle.
#[derive(Debug, Clone)]
pub struct Generator {
    catalogue: ShiftCatalogue,
}

impl Generator {
    pub fn new(catalogue: ShiftCatalogue) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &ShiftCatalogue {
        &self.catalogue
    }

    /// Build a carry assignment from an external shift-type key, e.g.
    /// `n8_a` for the first of the month.
    pub fn carry_from_key(
        &self,
        employee_id: &str,
        date: NaiveDate,
        key: &str,
    ) -> DomainResult<Assignment> {
        let code = self.catalogue.code_of(key)?;
        Ok(Assignment::new(employee_id, date, code, AssignmentSource::Template))
    }

    /// Generate the month template. Vacations in the month spec are NOT
    /// applied here; an external post-colouring pass paints them over the
    /// pattern.
    pub fn generate_month(
        &self,
        spec: &MonthSpec,
        employees: &[Employee],
        carry_in: &[Assignment],
        prev_tail: &BTreeMap<String, Vec<ShiftCode>>,
    ) -> DomainResult<MonthPlan> {
        check_unique_ids(employees)?;
        let (year, month) = spec.year_month()?;
        let days = month_days(year, month)?;
        let first = days[0];
        let last = days[days.len() - 1];

        let mut schedule = Schedule::with_days(days.iter().copied());

        // Anchor every employee from the previous-month tail; the stable
        // per-id seed is the fallback when no tail exists.
        let mut phase: BTreeMap<String, u8> = BTreeMap::new();
        let mut parity: BTreeMap<String, Office> = BTreeMap::new();
        for (i, e) in employees.iter().enumerate() {
            let tail = prev_tail.get(&e.id).map(Vec::as_slice).unwrap_or(&[]);
            let bootstrap = if i % 2 == 0 { Office::A } else { Office::B };
            let anchor = infer_anchor_from_tail(tail, e.seed4(), bootstrap);
            phase.insert(e.id.clone(), anchor.phase);
            parity.insert(e.id.clone(), anchor.day_office);
        }

        // Employees without a tail share seed-collision buckets; alternate
        // their offices in stable roster order so every phase bucket splits
        // evenly across A and B.
        for bucket in 0u8..4 {
            let mut free_idx = 0usize;
            for e in employees {
                if phase[&e.id] != bucket {
                    continue;
                }
                if prev_tail.get(&e.id).is_some_and(|t| !t.is_empty()) {
                    continue;
                }
                let office = if free_idx % 2 == 0 { Office::A } else { Office::B };
                parity.insert(e.id.clone(), office);
                free_idx += 1;
            }
        }

        // Pre-place the carry-in. An N8 carry on day 1 means the first day
        // is the consumed tail of the previous month's night: the phase
        // counter stands at N and advances to O the next day.
        let known: std::collections::BTreeSet<&str> =
            employees.iter().map(|e| e.id.as_str()).collect();
        for a in carry_in {
            if !known.contains(a.employee_id.as_str()) || !schedule.contains_date(a.date) {
                continue;
            }
            schedule.put(a.clone());
            if a.date == first && a.shift_code.is_split_carry() {
                phase.insert(a.employee_id.clone(), 1);
            }
        }

        let mut carry_out: Vec<Assignment> = Vec::new();
        for &day in &days {
            for e in employees {
                let ph = phase[&e.id];
                if schedule.cell(&e.id, day).is_some() {
                    phase.insert(e.id.clone(), (ph + 1) % 4);
                    continue;
                }
                match ph {
                    0 => {
                        let office = parity[&e.id];
                        schedule.put(Assignment::new(
                            &e.id,
                            day,
                            ShiftCode::day_for(office),
                            AssignmentSource::Template,
                        ));
                        parity.insert(e.id.clone(), office.opposite());
                    }
                    1 => {
                        let office = parity[&e.id];
                        if day == last {
                            schedule.put(Assignment::new(
                                &e.id,
                                day,
                                ShiftCode::split_tail_for(office),
                                AssignmentSource::Template,
                            ));
                            let (ny, nm) = next_month(year, month);
                            let next_first = NaiveDate::from_ymd_opt(ny, nm, 1)
                                .ok_or_else(|| {
                                    shared::DomainError::Invariant(format!(
                                        "no first day after {last}"
                                    ))
                                })?;
                            carry_out.push(Assignment::new(
                                &e.id,
                                next_first,
                                ShiftCode::split_carry_for(office),
                                AssignmentSource::Template,
                            ));
                        } else {
                            schedule.put(Assignment::new(
                                &e.id,
                                day,
                                ShiftCode::night_for(office),
                                AssignmentSource::Template,
                            ));
                        }
                    }
                    _ => {
                        schedule.put(Assignment::new(
                            &e.id,
                            day,
                            ShiftCode::Off,
                            AssignmentSource::Template,
                        ));
                    }
                }
                phase.insert(e.id.clone(), (ph + 1) % 4);
            }
        }

        schedule.verify(employees)?;
        tracing::info!(
            "Generated {}: {} days, {} employees, {} carried into next month",
            spec.month_year,
            days.len(),
            employees.len(),
            carry_out.len()
        );
        Ok(MonthPlan { schedule, carry_out })
    }
}

/// Anchor rules: a day code on the last tail day puts the 1st at N; a night
/// code (N4 included) puts it at the first O; a night on the second-to-last
/// day puts it at the second O; anything else restarts at D. The day office
/// follows the most recent day code in the tail, opposite office next.
fn infer_anchor_from_tail(tail: &[ShiftCode], seed_phase: u8, bootstrap: Office) -> Anchor {
    let mut phase = seed_phase % 4;
    if let Some(&last) = tail.last() {
        if last.is_day() {
            phase = 1;
        } else if last.is_night() {
            phase = 2;
        } else {
            let second_last = tail.len().checked_sub(2).map(|i| tail[i]);
            phase = match second_last {
                Some(code) if code.is_night() => 3,
                _ => 0,
            };
        }
    }

    let mut day_office = bootstrap;
    for &code in tail.iter().rev() {
        if code.is_day() {
            if let Some(office) = code.office() {
                day_office = office.opposite();
            }
            break;
        }
    }
    Anchor { phase, day_office }
}

/// Re-derive the carry-out from the final last-day N4 cells. Run after the
/// balancer, which may have moved the split nights.
pub fn recompute_carry_out(schedule: &Schedule) -> DomainResult<Vec<Assignment>> {
    let Some(last) = schedule.last_date() else {
        return Ok(Vec::new());
    };
    let (ny, nm) = next_month(last.year(), last.month());
    let next_first = NaiveDate::from_ymd_opt(ny, nm, 1).ok_or_else(|| {
        shared::DomainError::Invariant(format!("no first day after {last}"))
    })?;

    let mut out = Vec::new();
    for a in schedule.day(last) {
        if let Some(office) = a.shift_code.office() {
            if a.shift_code.is_split_tail() {
                out.push(Assignment::new(
                    &a.employee_id,
                    next_first,
                    ShiftCode::split_carry_for(office),
                    AssignmentSource::Autofix,
                ));
            }
        }
    }
    Ok(out)
}

/// Codes of the last four days per employee, oldest first: the next month's
/// prev-tail.
pub fn extract_tail(
    schedule: &Schedule,
    employees: &[Employee],
) -> BTreeMap<String, Vec<ShiftCode>> {
    let dates = schedule.dates();
    let tail_dates = &dates[dates.len().saturating_sub(4)..];
    let mut out = BTreeMap::new();
    for e in employees {
        let codes: Vec<ShiftCode> = tail_dates
            .iter()
            .filter_map(|&d| schedule.cell(&e.id, d).map(|a| a.shift_code))
            .collect();
        out.insert(e.id.clone(), codes);
    }
    out
}
