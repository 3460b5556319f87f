use std::collections::BTreeMap;

use chrono::NaiveDate;
use shared::{Office, ShiftKind};

use crate::domain::entities::Schedule;

/// Per-day headcount of the four coverage columns. Split-night codes count
/// into their office's night column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayCounts {
    pub day_a: u32,
    pub day_b: u32,
    pub night_a: u32,
    pub night_b: u32,
}

pub fn per_day_counts(schedule: &Schedule) -> BTreeMap<NaiveDate, DayCounts> {
    let mut out = BTreeMap::new();
    for (date, rows) in schedule.iter_days() {
        let mut counts = DayCounts::default();
        for a in rows {
            match (a.shift_code.kind(), a.shift_code.office()) {
                (ShiftKind::Day, Some(Office::A)) => counts.day_a += 1,
                (ShiftKind::Day, Some(Office::B)) => counts.day_b += 1,
                (ShiftKind::Night, Some(Office::A)) => counts.night_a += 1,
                (ShiftKind::Night, Some(Office::B)) => counts.night_b += 1,
                _ => {}
            }
        }
        out.insert(date, counts);
    }
    out
}

fn in_range(date: NaiveDate, range: Option<(NaiveDate, NaiveDate)>) -> bool {
    match range {
        Some((from, to)) => from <= date && date <= to,
        None => true,
    }
}

/// Days on which each employee is the only one holding a day-kind code,
/// restricted to `range` when given.
pub fn solo_days_by_employee(
    schedule: &Schedule,
    range: Option<(NaiveDate, NaiveDate)>,
) -> BTreeMap<String, u32> {
    let mut out = BTreeMap::new();
    for (date, rows) in schedule.iter_days() {
        if !in_range(date, range) {
            continue;
        }
        let mut day_workers = rows
            .iter()
            .filter(|a| a.shift_code.kind() == ShiftKind::Day)
            .map(|a| a.employee_id.as_str());
        if let (Some(only), None) = (day_workers.next(), day_workers.next()) {
            *out.entry(only.to_owned()).or_insert(0) += 1;
        }
    }
    out
}

/// Solo-day count of one employee over `range`.
pub fn solo_days_for(
    schedule: &Schedule,
    employee_id: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> u32 {
    solo_days_by_employee(schedule, range)
        .get(employee_id)
        .copied()
        .unwrap_or(0)
}
