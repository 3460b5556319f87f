use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use shared::{AssignmentSource, DomainError, DomainResult, ShiftCode};

use super::assignment::Assignment;
use super::employee::Employee;

/// A month of assignments, keyed by date. Exactly one cell per
/// (day, employee) once generation has run; iteration order is fully
/// deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Schedule {
    days: BTreeMap<NaiveDate, Vec<Assignment>>,
}

impl Schedule {
    /// Empty schedule covering the given days.
    pub fn with_days(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            days: days.into_iter().map(|d| (d, Vec::new())).collect(),
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn day(&self, date: NaiveDate) -> &[Assignment] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter_days(&self) -> impl Iterator<Item = (NaiveDate, &[Assignment])> {
        self.days.iter().map(|(d, rows)| (*d, rows.as_slice()))
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.days.values().flatten()
    }

    /// Insert a cell, replacing any existing cell for the same
    /// (date, employee). Dates outside the schedule are ignored.
    pub fn put(&mut self, assignment: Assignment) {
        let Some(rows) = self.days.get_mut(&assignment.date) else {
            return;
        };
        rows.retain(|a| a.employee_id != assignment.employee_id);
        rows.push(assignment);
    }

    pub fn cell(&self, employee_id: &str, date: NaiveDate) -> Option<&Assignment> {
        self.days
            .get(&date)?
            .iter()
            .find(|a| a.employee_id == employee_id)
    }

    pub fn cell_mut(&mut self, employee_id: &str, date: NaiveDate) -> Option<&mut Assignment> {
        self.days
            .get_mut(&date)?
            .iter_mut()
            .find(|a| a.employee_id == employee_id)
    }

    /// Code on the given day; a missing cell reads as OFF.
    pub fn code_on(&self, employee_id: &str, date: NaiveDate) -> ShiftCode {
        self.cell(employee_id, date)
            .map(|a| a.shift_code)
            .unwrap_or(ShiftCode::Off)
    }

    /// Recolour an existing cell. Returns false when there is no cell to
    /// recolour.
    pub fn set_code(
        &mut self,
        employee_id: &str,
        date: NaiveDate,
        code: ShiftCode,
        source: AssignmentSource,
    ) -> bool {
        match self.cell_mut(employee_id, date) {
            Some(a) => {
                a.recolor(code, source);
                true
            }
            None => false,
        }
    }

    /// All employee ids appearing anywhere in the schedule, sorted.
    pub fn employee_ids(&self) -> Vec<String> {
        self.assignments()
            .map(|a| a.employee_id.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn employee_hours(&self, employee_id: &str) -> i32 {
        self.assignments()
            .filter(|a| a.employee_id == employee_id)
            .map(|a| a.effective_hours)
            .sum()
    }

    pub fn hours_by_employee(&self) -> BTreeMap<String, i32> {
        let mut out: BTreeMap<String, i32> = BTreeMap::new();
        for a in self.assignments() {
            *out.entry(a.employee_id.clone()).or_insert(0) += a.effective_hours;
        }
        out
    }

    /// Check the universal schedule invariants: one cell per (day, employee)
    /// for every roster member, split-night codes only on their legal days,
    /// and effective hours equal to the code's nominal hours.
    pub fn verify(&self, employees: &[Employee]) -> DomainResult<()> {
        let last = self.last_date();
        for (date, rows) in self.iter_days() {
            let mut seen = std::collections::BTreeSet::new();
            for a in rows {
                if !seen.insert(a.employee_id.as_str()) {
                    return Err(DomainError::Invariant(format!(
                        "two assignments for {} on {}",
                        a.employee_id, date
                    )));
                }
                if a.shift_code.is_split_carry() && date.day() != 1 {
                    return Err(DomainError::Invariant(format!(
                        "{} carries {} off the first day ({})",
                        a.employee_id, a.shift_code, date
                    )));
                }
                if a.shift_code.is_split_tail() && Some(date) != last {
                    return Err(DomainError::Invariant(format!(
                        "{} carries {} off the last day ({})",
                        a.employee_id, a.shift_code, date
                    )));
                }
                if a.effective_hours != a.shift_code.hours() {
                    return Err(DomainError::Invariant(format!(
                        "{} on {}: {}h recorded for {} ({}h nominal)",
                        a.employee_id,
                        date,
                        a.effective_hours,
                        a.shift_code,
                        a.shift_code.hours()
                    )));
                }
            }
            for e in employees {
                if !seen.contains(e.id.as_str()) {
                    return Err(DomainError::Invariant(format!(
                        "no assignment for {} on {}",
                        e.id, date
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::AssignmentSource;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn small_schedule() -> Schedule {
        let mut s = Schedule::with_days((1..=3).map(d));
        for day in 1..=3 {
            s.put(Assignment::new(
                "E01",
                d(day),
                ShiftCode::Off,
                AssignmentSource::Template,
            ));
        }
        s
    }

    #[test]
    fn test_put_replaces_existing_cell() {
        let mut s = small_schedule();
        s.put(Assignment::new(
            "E01",
            d(2),
            ShiftCode::Da,
            AssignmentSource::Override,
        ));
        assert_eq!(s.day(d(2)).len(), 1);
        assert_eq!(s.code_on("E01", d(2)), ShiftCode::Da);
    }

    #[test]
    fn test_missing_cell_reads_off() {
        let mut s = small_schedule();
        assert_eq!(s.code_on("E99", d(1)), ShiftCode::Off);
        assert!(!s.set_code(
            "E99",
            d(1),
            ShiftCode::Da,
            AssignmentSource::PhaseShift
        ));
    }

    #[test]
    fn test_hours_by_employee() {
        let mut s = small_schedule();
        s.set_code("E01", d(1), ShiftCode::Da, AssignmentSource::Template);
        s.set_code("E01", d(2), ShiftCode::N4a, AssignmentSource::Template);
        assert_eq!(s.employee_hours("E01"), 16);
        assert_eq!(s.hours_by_employee().get("E01"), Some(&16));
    }

    #[test]
    fn test_verify_rejects_misplaced_split_codes() {
        let roster = vec![Employee::new("E01", "One")];

        let mut s = small_schedule();
        s.set_code("E01", d(2), ShiftCode::N8a, AssignmentSource::Template);
        assert!(s.verify(&roster).is_err());

        let mut s = small_schedule();
        s.set_code("E01", d(1), ShiftCode::N4b, AssignmentSource::Template);
        assert!(s.verify(&roster).is_err());

        // N4 on the last covered day is fine.
        let mut s = small_schedule();
        s.set_code("E01", d(3), ShiftCode::N4b, AssignmentSource::Template);
        assert!(s.verify(&roster).is_ok());
    }

    #[test]
    fn test_verify_rejects_duplicate_and_missing_cells() {
        let roster = vec![Employee::new("E01", "One"), Employee::new("E02", "Two")];

        // E02 has no cells at all.
        let s = small_schedule();
        assert!(s.verify(&roster).is_err());

        let mut s = small_schedule();
        for day in 1..=3 {
            s.put(Assignment::new(
                "E02",
                d(day),
                ShiftCode::Off,
                AssignmentSource::Template,
            ));
        }
        assert!(s.verify(&roster).is_ok());
    }

    #[test]
    fn test_verify_rejects_hour_drift() {
        let roster = vec![Employee::new("E01", "One")];
        let mut s = small_schedule();
        s.cell_mut("E01", d(1)).unwrap().effective_hours = 7;
        assert!(s.verify(&roster).is_err());
    }
}
