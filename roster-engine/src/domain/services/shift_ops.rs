use chrono::{Datelike, NaiveDate};
use shared::{AssignmentSource, PhaseToken, ShiftCode};
use thiserror::Error;

use crate::domain::entities::Schedule;
use crate::domain::services::rotor;

/// A committed operator outcome: the mutated copy of the schedule plus the
/// immediate hour delta of the recoloured cell. Hour changes introduced by
/// the tail re-stitch are accounted for separately, through the predicted
/// delta the balancer budgets with.
#[derive(Debug, Clone)]
pub struct AppliedOp {
    pub schedule: Schedule,
    pub hours_delta: i32,
    pub note: String,
}

/// The operator found no applicable pattern; the schedule is untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct OpSkip(pub String);

pub type OpResult = Result<AppliedOp, OpSkip>;

fn token_on(schedule: &Schedule, employee_id: &str, date: NaiveDate) -> PhaseToken {
    schedule
        .code_on(employee_id, date)
        .pair_token(date.day() == 1)
}

fn window_days(dates: &[NaiveDate], window: (NaiveDate, NaiveDate)) -> Vec<NaiveDate> {
    dates
        .iter()
        .copied()
        .filter(|d| window.0 <= *d && *d <= window.1)
        .collect()
}

/// Phase shift −1: drop the night of the first D,N,O fragment in the window
/// and re-stitch the tail along `O,O,D,N,…`, pulling every later phase one
/// day earlier.
pub fn phase_shift_minus_one_skip(
    schedule: &Schedule,
    employee_id: &str,
    window: (NaiveDate, NaiveDate),
    partner_id: Option<&str>,
    anti_align: bool,
) -> OpResult {
    let dates = schedule.dates();
    let total = dates.len();
    let days = window_days(&dates, window);
    if days.is_empty() {
        return Err(OpSkip("phase_shift_-1: empty window".into()));
    }

    for day in days {
        let idx = dates.iter().position(|&d| d == day).unwrap_or(0);
        if idx == 0 || idx >= total - 1 {
            continue;
        }

        let current = schedule.code_on(employee_id, day);
        if day.day() == 1 && current.is_split_carry() {
            continue;
        }
        if day == dates[total - 1] && current.is_split_tail() {
            continue;
        }

        let t_prev = token_on(schedule, employee_id, dates[idx - 1]);
        let t_curr = token_on(schedule, employee_id, day);
        let t_next = token_on(schedule, employee_id, dates[idx + 1]);
        if !(t_prev == PhaseToken::D && t_curr == PhaseToken::N && t_next == PhaseToken::O) {
            continue;
        }

        if !matches!(current, ShiftCode::Na | ShiftCode::Nb) {
            return Err(OpSkip("phase_shift_-1: target is not N".into()));
        }

        let mut out = schedule.clone();
        out.set_code(employee_id, day, ShiftCode::Off, AssignmentSource::PhaseShift);

        let tokens: Vec<PhaseToken> = (0..total - idx)
            .map(|offset| match offset % 4 {
                0 | 1 => PhaseToken::O,
                2 => PhaseToken::D,
                _ => PhaseToken::N,
            })
            .collect();
        rotor::stitch(&mut out, employee_id, day, &tokens, partner_id, anti_align);

        return Ok(AppliedOp {
            schedule: out,
            hours_delta: -12,
            note: format!("phase_shift_-1[{day}]"),
        });
    }

    Err(OpSkip("phase_shift_-1: no D,N,O pattern in window".into()))
}

/// Phase shift +1: force the working day of the first O,O,(work) fragment in
/// the window to OFF and re-stitch the tail along `O,D,N,O,…`, pushing every
/// later phase one day later.
pub fn phase_shift_plus_one_insert_off(
    schedule: &Schedule,
    employee_id: &str,
    window: (NaiveDate, NaiveDate),
    partner_id: Option<&str>,
    anti_align: bool,
) -> OpResult {
    let dates = schedule.dates();
    let days = window_days(&dates, window);

    let cells: Vec<(PhaseToken, ShiftCode, NaiveDate)> = days
        .iter()
        .map(|&d| {
            let code = schedule.code_on(employee_id, d);
            (code.pair_token(d.day() == 1), code, d)
        })
        .collect();

    for triple in cells.windows(3) {
        let (t0, c0, _) = triple[0];
        let (t1, c1, _) = triple[1];
        let (t2, c2, d2) = triple[2];
        if !(t0 == PhaseToken::O && t1 == PhaseToken::O && t2 != PhaseToken::O) {
            continue;
        }
        if c0.is_vacation() || c1.is_vacation() {
            continue;
        }
        if d2.day() == 1 && c2.is_split_carry() {
            continue;
        }

        let mut out = schedule.clone();
        let hours_delta = -c2.hours();
        out.set_code(employee_id, d2, ShiftCode::Off, AssignmentSource::PhaseShift);

        let idx = dates.iter().position(|&d| d == d2).unwrap_or(0);
        let tokens: Vec<PhaseToken> = (0..dates.len() - idx)
            .map(|offset| match offset % 4 {
                0 | 3 => PhaseToken::O,
                1 => PhaseToken::D,
                _ => PhaseToken::N,
            })
            .collect();
        rotor::stitch(&mut out, employee_id, d2, &tokens, partner_id, anti_align);

        return Ok(AppliedOp {
            schedule: out,
            hours_delta,
            note: format!("phase_shift_+1[{d2}]"),
        });
    }

    Err(OpSkip("phase_shift_+1: no place O,O,(work)".into()))
}

/// Flip A↔B from the next D (or N) in the window onward: re-stitch the tail
/// with its existing token sequence, letting partner anti-alignment reset the
/// office rotation. Hours are untouched by construction.
pub fn flip_ab_on_next_token(
    kind: PhaseToken,
    schedule: &Schedule,
    employee_id: &str,
    window: (NaiveDate, NaiveDate),
    partner_id: Option<&str>,
    anti_align: bool,
) -> OpResult {
    let dates = schedule.dates();
    let days = window_days(&dates, window);
    if days.is_empty() {
        return Err(OpSkip("flip_ab: empty window".into()));
    }

    let Some(start) = days
        .iter()
        .copied()
        .find(|&d| token_on(schedule, employee_id, d) == kind)
    else {
        return Err(OpSkip("flip_ab: no token".into()));
    };

    let start_idx = dates.iter().position(|&d| d == start).unwrap_or(0);
    let tail_tokens: Vec<PhaseToken> = dates[start_idx..]
        .iter()
        .map(|&d| token_on(schedule, employee_id, d))
        .collect();

    let mut out = schedule.clone();
    rotor::stitch(&mut out, employee_id, start, &tail_tokens, partner_id, anti_align);

    Ok(AppliedOp {
        schedule: out,
        hours_delta: 0,
        note: format!("flip_ab[{kind}]@{start}"),
    })
}

/// Local A↔B swap of a single cell. The day-1 N8 carry is protected and
/// officeless codes have nothing to flip.
pub fn flip_ab_on_day(
    schedule: &Schedule,
    employee_id: &str,
    day: NaiveDate,
) -> OpResult {
    let Some(cell) = schedule.cell(employee_id, day) else {
        return Err(OpSkip("flip_ab_on_day: no row".into()));
    };
    let before = cell.shift_code;
    if day.day() == 1 && before.is_split_carry() {
        return Err(OpSkip("flip_ab_on_day: protected code".into()));
    }
    let after = before.swap_office();
    if after == before {
        return Err(OpSkip("flip_ab_on_day: noop".into()));
    }

    let mut out = schedule.clone();
    out.set_code(employee_id, day, after, AssignmentSource::PairDesync);
    Ok(AppliedOp {
        schedule: out,
        hours_delta: 0,
        note: format!("flip_ab_on_day[{employee_id}] {before}->{after} {day}"),
    })
}

/// Rotate an employee's codes inside the window by one position. The crude
/// ancestor of the targeted phase shifts: it moves whole codes rather than
/// re-stitching the tail. The day-1 N8 carry never moves, an N8 rotated off
/// day 1 is normalised to a full night, and a full night rotated onto the
/// last day becomes the 4h split tail.
pub fn shift_phase(
    schedule: &Schedule,
    employee_id: &str,
    direction: i32,
    window: (NaiveDate, NaiveDate),
) -> OpResult {
    if direction != -1 && direction != 1 {
        return Err(OpSkip(format!("rot: bad direction {direction}")));
    }
    let dates = schedule.dates();
    let n = dates.len();
    if n == 0 {
        return Err(OpSkip("rot: no-rows".into()));
    }
    let codes: Vec<ShiftCode> = dates
        .iter()
        .map(|&d| schedule.code_on(employee_id, d))
        .collect();

    let start = if codes[0].is_split_carry() { 1 } else { 0 };
    if start >= n {
        return Err(OpSkip("rot: window-empty".into()));
    }
    let i0 = dates
        .iter()
        .position(|&d| d == window.0)
        .unwrap_or(start)
        .clamp(start, n - 1);
    let i1 = dates
        .iter()
        .position(|&d| d == window.1)
        .unwrap_or((start + 5).min(n - 1))
        .clamp(start, n - 1);
    if i0 >= i1 {
        return Err(OpSkip(format!("rot: window-too-narrow({i0},{i1})")));
    }

    let mut new_codes = codes.clone();
    if direction == 1 {
        new_codes[i0..=i1].rotate_left(1);
    } else {
        new_codes[i0..=i1].rotate_right(1);
    }
    for (k, code) in new_codes.iter_mut().enumerate().take(i1 + 1).skip(i0) {
        if code.is_split_carry() && k != 0 {
            if let Some(office) = code.office() {
                *code = ShiftCode::night_for(office);
            }
        }
    }
    if let Some(last) = new_codes.last_mut() {
        if matches!(*last, ShiftCode::Na | ShiftCode::Nb) {
            if let Some(office) = last.office() {
                *last = ShiftCode::split_tail_for(office);
            }
        }
    }

    let mut out = schedule.clone();
    let mut old_hours = 0;
    let mut new_hours = 0;
    for (idx, &day) in dates.iter().enumerate() {
        if idx == 0 && codes[0].is_split_carry() {
            continue;
        }
        if codes[idx] == new_codes[idx] {
            continue;
        }
        old_hours += codes[idx].hours();
        new_hours += new_codes[idx].hours();
        out.set_code(employee_id, day, new_codes[idx], AssignmentSource::Autofix);
    }

    let hours_delta = new_hours - old_hours;
    Ok(AppliedOp {
        schedule: out,
        hours_delta,
        note: format!(
            "rot({direction})[{}..{}]:Δh={hours_delta}",
            dates[i0], dates[i1]
        ),
    })
}

/// Month-wide pass over a pair: wherever both share a working phase and the
/// same office, flip the first member's cell for that day. Day-1 N8 carries
/// are skipped.
pub fn desync_pair_month(
    schedule: &Schedule,
    emp_a: &str,
    emp_b: &str,
) -> (Schedule, u32, Vec<String>) {
    let mut out = schedule.clone();
    let mut flips = 0;
    let mut notes = Vec::new();

    for date in out.dates() {
        let first = date.day() == 1;
        let code_a = out.code_on(emp_a, date);
        let code_b = out.code_on(emp_b, date);
        let tok_a = code_a.pair_token(first);
        if tok_a == PhaseToken::O || tok_a != code_b.pair_token(first) {
            continue;
        }
        let (Some(office_a), Some(office_b)) = (code_a.office(), code_b.office()) else {
            continue;
        };
        if office_a != office_b {
            continue;
        }
        if first && (code_a.is_split_carry() || code_b.is_split_carry()) {
            continue;
        }
        let after = code_a.swap_office();
        if after == code_a {
            continue;
        }
        out.set_code(emp_a, date, after, AssignmentSource::PairDesync);
        flips += 1;
        notes.push(format!("flip_ab_on_day[{emp_a}] {code_a}->{after} {date}"));
    }

    (out, flips, notes)
}
