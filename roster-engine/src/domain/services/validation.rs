use chrono::NaiveDate;
use shared::PhaseToken;

use crate::domain::entities::{Employee, Schedule};
use crate::domain::services::coverage;

/// Expected token of the cycle D,N,O,O anchored at `phase0` on day index 0.
fn expected_token(phase0: u8, day_index: usize) -> PhaseToken {
    match (phase0 as usize + day_index) % 4 {
        0 => PhaseToken::D,
        1 => PhaseToken::N,
        _ => PhaseToken::O,
    }
}

fn mismatches(schedule: &Schedule, employee_id: &str, phase0: u8) -> usize {
    schedule
        .dates()
        .iter()
        .enumerate()
        .filter(|(i, &d)| {
            let code = schedule.code_on(employee_id, d);
            !code.is_vacation() && code.token() != expected_token(phase0, *i)
        })
        .count()
}

/// Reconstruct the cycle anchor of an employee at day 1. An N8 carry pins
/// the anchor at N; otherwise the first non-vacation token back-calculates
/// it, trying both O positions when that token is an O. `None` when the
/// whole month is vacation.
fn anchor_phase(schedule: &Schedule, employee_id: &str) -> Option<u8> {
    let dates = schedule.dates();
    let first = *dates.first()?;
    if schedule.code_on(employee_id, first).is_split_carry() {
        return Some(1);
    }

    let (idx, token) = dates.iter().enumerate().find_map(|(i, &d)| {
        let code = schedule.code_on(employee_id, d);
        if code.is_vacation() {
            None
        } else {
            Some((i, code.token()))
        }
    })?;

    let back = |phase_at_idx: i32| -> u8 { (phase_at_idx - idx as i32).rem_euclid(4) as u8 };
    match token {
        PhaseToken::D => Some(back(0)),
        PhaseToken::N => Some(back(1)),
        PhaseToken::O => {
            let first_o = back(2);
            let second_o = back(3);
            if mismatches(schedule, employee_id, second_o)
                < mismatches(schedule, employee_id, first_o)
            {
                Some(second_o)
            } else {
                Some(first_o)
            }
        }
    }
}

/// Report every day whose actual token disagrees with the expected D,N,O,O
/// cycle. Vacation cells are out of the pattern and ignored.
pub fn validate_baseline(ym: &str, employees: &[Employee], schedule: &Schedule) -> Vec<String> {
    let mut issues = Vec::new();
    let dates = schedule.dates();
    for e in employees {
        let Some(phase0) = anchor_phase(schedule, &e.id) else {
            continue;
        };
        for (i, &d) in dates.iter().enumerate() {
            let code = schedule.code_on(&e.id, d);
            if code.is_vacation() {
                continue;
            }
            let actual = code.token();
            let expected = expected_token(phase0, i);
            if actual != expected {
                issues.push(format!(
                    "{ym}: employee {} — cycle broken on {d} (expected {expected}, actual {actual})",
                    e.id
                ));
            }
        }
    }
    issues
}

/// Per-day coverage counters for the first days of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmokeRow {
    pub date: NaiveDate,
    pub day_a: u32,
    pub day_b: u32,
    pub night_a: u32,
    pub night_b: u32,
}

pub fn coverage_smoke(schedule: &Schedule, first_days: usize) -> Vec<SmokeRow> {
    let counts = coverage::per_day_counts(schedule);
    counts
        .into_iter()
        .take(first_days)
        .map(|(date, c)| SmokeRow {
            date,
            day_a: c.day_a,
            day_b: c.day_b,
            night_a: c.night_a,
            night_b: c.night_b,
        })
        .collect()
}

/// Expected-vs-actual token trace for the first days, one line per employee.
pub fn phase_trace(employees: &[Employee], schedule: &Schedule, days: usize) -> Vec<String> {
    let dates: Vec<NaiveDate> = schedule.dates().into_iter().take(days).collect();
    if dates.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for e in employees {
        let phase0 = anchor_phase(schedule, &e.id);
        let expected: Vec<String> = dates
            .iter()
            .enumerate()
            .map(|(i, _)| match phase0 {
                Some(p) => expected_token(p, i).to_string(),
                None => "-".to_owned(),
            })
            .collect();
        let actual: Vec<String> = dates
            .iter()
            .map(|&d| schedule.code_on(&e.id, d).token().to_string())
            .collect();
        out.push(format!(
            "{}: exp={} | act={}",
            e.id,
            expected.join(" "),
            actual.join(" ")
        ));
    }
    out
}
