use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{AssignmentSource, ShiftCode};

/// One (employee, day) cell of a schedule. Cells are never removed; an off
/// day is a real assignment carrying [`ShiftCode::Off`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub employee_id: String,
    pub date: NaiveDate,
    pub shift_code: ShiftCode,
    pub effective_hours: i32,
    pub source: AssignmentSource,
}

impl Assignment {
    /// New cell with the code's nominal hours.
    pub fn new(
        employee_id: impl Into<String>,
        date: NaiveDate,
        shift_code: ShiftCode,
        source: AssignmentSource,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            date,
            shift_code,
            effective_hours: shift_code.hours(),
            source,
        }
    }

    /// Recolour the cell in place, keeping hours nominal for the new code.
    pub fn recolor(&mut self, shift_code: ShiftCode, source: AssignmentSource) {
        self.shift_code = shift_code;
        self.effective_hours = shift_code.hours();
        self.source = source;
    }
}
