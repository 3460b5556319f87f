use std::collections::BTreeMap;

use shared::ShiftKind;

use crate::domain::entities::Schedule;
use crate::domain::services::coverage;

/// Per-employee month aggregates for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeStats {
    pub hours: i32,
    pub day_shifts: u32,
    pub night_shifts: u32,
    pub off_days: u32,
    pub vacation_days: u32,
    pub solo_days: u32,
}

pub fn employee_stats(schedule: &Schedule) -> BTreeMap<String, EmployeeStats> {
    let mut out: BTreeMap<String, EmployeeStats> = BTreeMap::new();
    for a in schedule.assignments() {
        let stats = out.entry(a.employee_id.clone()).or_default();
        stats.hours += a.effective_hours;
        match a.shift_code.kind() {
            ShiftKind::Day => stats.day_shifts += 1,
            ShiftKind::Night => stats.night_shifts += 1,
            ShiftKind::Vacation => stats.vacation_days += 1,
            ShiftKind::Off => stats.off_days += 1,
        }
    }
    for (id, solo) in coverage::solo_days_by_employee(schedule, None) {
        if let Some(stats) = out.get_mut(&id) {
            stats.solo_days = solo;
        }
    }
    out
}
