use chrono::NaiveDate;
use shared::{AssignmentSource, Office, PhaseToken, ShiftCode};

use crate::domain::entities::Schedule;

/// Per-employee office alternation state. Day and night offices rotate
/// independently; `None` means "not yet anchored".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotorState {
    pub day_office: Option<Office>,
    pub night_office: Option<Office>,
}

impl RotorState {
    /// Emit the next day code, alternating offices. An unanchored state
    /// starts in office A.
    pub fn next_day_code(&mut self) -> ShiftCode {
        let office = match self.day_office {
            None => Office::A,
            Some(prev) => prev.opposite(),
        };
        self.day_office = Some(office);
        ShiftCode::day_for(office)
    }

    /// Emit the next night code, alternating offices independently of the
    /// day rotation.
    pub fn next_night_code(&mut self) -> ShiftCode {
        let office = match self.night_office {
            None => Office::A,
            Some(prev) => prev.opposite(),
        };
        self.night_office = Some(office);
        ShiftCode::night_for(office)
    }
}

/// Reconstruct the rotor state for an employee as of `start`: an N8 carry on
/// the first schedule day anchors the night office, then history strictly
/// before `start` is scanned right-to-left for the most recent day and night
/// codes.
pub fn infer_state(schedule: &Schedule, employee_id: &str, start: NaiveDate) -> RotorState {
    let mut state = RotorState::default();
    let dates = schedule.dates();
    let Some(&first) = dates.first() else {
        return state;
    };

    if first == start {
        let code = schedule.code_on(employee_id, first);
        if code.is_split_carry() {
            state.night_office = code.office();
        }
    }

    for &day in dates.iter().rev() {
        if day >= start {
            continue;
        }
        let code = schedule.code_on(employee_id, day);
        if state.day_office.is_none() && code.is_day() {
            state.day_office = code.office();
        }
        if state.night_office.is_none() && code.is_night() {
            state.night_office = code.office();
        }
        if state.day_office.is_some() && state.night_office.is_some() {
            break;
        }
    }
    state
}

/// Kind and office a partner's code contributes to anti-alignment. The day-1
/// N8 carry never participates (its phase is O).
fn partner_kind_office(code: ShiftCode) -> Option<(PhaseToken, Office)> {
    if code.is_split_carry() {
        return None;
    }
    let office = code.office()?;
    match code.token() {
        PhaseToken::D => Some((PhaseToken::D, office)),
        PhaseToken::N => Some((PhaseToken::N, office)),
        PhaseToken::O => None,
    }
}

/// Re-emit an employee's tail from `start` following `tokens`, recomputing
/// offices from the live rotor state.
///
/// With `anti_align` and a partner, the state is primed so that the first
/// emitted D (resp. N) lands in the office opposite the partner's; otherwise
/// an unanchored state is primed to repeat the office already on the first
/// D (resp. N) position. Vacation cells, the day-1 N8 carry, and a last-day
/// N4 under an N token are preserved verbatim.
pub fn stitch(
    schedule: &mut Schedule,
    employee_id: &str,
    start: NaiveDate,
    tokens: &[PhaseToken],
    partner_id: Option<&str>,
    anti_align: bool,
) {
    let dates = schedule.dates();
    let Some(start_idx) = dates.iter().position(|&d| d == start) else {
        return;
    };
    let mut state = infer_state(schedule, employee_id, start);

    if anti_align {
        if let Some(partner) = partner_id {
            let mut primed_day = false;
            let mut primed_night = false;
            for (offset, &token) in tokens.iter().enumerate() {
                if primed_day && primed_night {
                    break;
                }
                let Some(&day) = dates.get(start_idx + offset) else {
                    break;
                };
                if token == PhaseToken::O {
                    continue;
                }
                let partner_code = schedule.code_on(partner, day);
                let Some((kind, partner_office)) = partner_kind_office(partner_code) else {
                    continue;
                };
                // Prime one step before the opposite office, so the first
                // emission flips onto it.
                let pre = partner_office;
                match kind {
                    PhaseToken::D if !primed_day => {
                        state.day_office = Some(pre);
                        primed_day = true;
                    }
                    PhaseToken::N if !primed_night => {
                        state.night_office = Some(pre);
                        primed_night = true;
                    }
                    _ => {}
                }
            }
        }
    }

    // Self-priming: an unanchored office repeats what is already on the
    // first D (resp. N) position instead of defaulting to A.
    let mut primed_day_self = false;
    let mut primed_night_self = false;
    for (offset, &token) in tokens.iter().enumerate() {
        if primed_day_self && primed_night_self {
            break;
        }
        let Some(&day) = dates.get(start_idx + offset) else {
            break;
        };
        if token == PhaseToken::O {
            continue;
        }
        let current = schedule.code_on(employee_id, day);
        match token {
            PhaseToken::D if !primed_day_self && current.is_day() => {
                if let Some(office) = current.office() {
                    if state.day_office.is_none() {
                        state.day_office = Some(office.opposite());
                        primed_day_self = true;
                    }
                }
            }
            PhaseToken::N if !primed_night_self && current.is_night() => {
                if let Some(office) = current.office() {
                    if state.night_office.is_none() {
                        state.night_office = Some(office.opposite());
                        primed_night_self = true;
                    }
                }
            }
            _ => {}
        }
    }

    let Some(&last) = dates.last() else {
        return;
    };
    for (offset, &token) in tokens.iter().enumerate() {
        let Some(&day) = dates.get(start_idx + offset) else {
            break;
        };
        let current = schedule.code_on(employee_id, day);
        if current.is_vacation()
            || current.is_split_carry()
            || (current.is_split_tail() && token != PhaseToken::N)
        {
            continue;
        }
        // The rotor advances even when a cell already carries the right
        // code; only actual changes are written.
        let desired = match token {
            PhaseToken::O => ShiftCode::Off,
            PhaseToken::D => state.next_day_code(),
            PhaseToken::N => {
                let full = state.next_night_code();
                if day == last {
                    ShiftCode::split_tail_for(full.office().unwrap_or(Office::A))
                } else {
                    full
                }
            }
        };
        if desired != current {
            schedule.set_code(employee_id, day, desired, AssignmentSource::PhaseShift);
        }
    }
}
