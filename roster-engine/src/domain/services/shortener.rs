use std::collections::BTreeMap;

use chrono::NaiveDate;
use shared::{AssignmentSource, ShiftCode};

use crate::domain::entities::month::is_weekend;
use crate::domain::entities::{Employee, Schedule};

/// Which dates may take a shortened day shift. Weekends qualify out of the
/// box; production-calendar backed implementations plug in from outside.
#[cfg_attr(test, mockall::automock)]
pub trait ShorteningCalendar {
    fn allows_shortening(&self, date: NaiveDate) -> bool;
}

/// Plain weekend rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendCalendar;

impl ShorteningCalendar for WeekendCalendar {
    fn allows_shortening(&self, date: NaiveDate) -> bool {
        is_weekend(date)
    }
}

/// One recolouring performed by the shortener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenOperation {
    pub date: NaiveDate,
    pub employee_id: String,
    pub from_code: ShiftCode,
    pub to_code: ShiftCode,
    pub hours_delta: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeHoursReport {
    pub hours: i32,
    pub overtime_month: i32,
    pub yearly_left: Option<i32>,
}

/// Outcome of a shortening pass: the operations applied, the employees that
/// still break a cap, and the final per-employee hour totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormsInfo {
    pub month: String,
    pub norm_hours: i32,
    pub monthly_cap: i32,
    pub yearly_cap: i32,
    pub operations: Vec<ShortenOperation>,
    pub warnings: Vec<String>,
    pub per_employee: BTreeMap<String, EmployeeHoursReport>,
}

/// Recolours 12h day shifts into 8h morning/evening shorts until the monthly
/// and yearly caps hold, never dropping per-day daytime coverage below one
/// morning and one evening worker.
pub struct ShiftShortener<'a> {
    calendar: &'a dyn ShorteningCalendar,
    monthly_allowance: i32,
    yearly_cap: i32,
}

/// Morning/evening headcount a code contributes to daytime coverage.
fn coverage_contribution(code: ShiftCode) -> (i32, i32) {
    match code {
        ShiftCode::Da | ShiftCode::Db => (1, 1),
        ShiftCode::M8a | ShiftCode::M8b => (1, 0),
        ShiftCode::E8a | ShiftCode::E8b => (0, 1),
        _ => (0, 0),
    }
}

impl<'a> ShiftShortener<'a> {
    pub fn new(calendar: &'a dyn ShorteningCalendar, monthly_allowance: i32, yearly_cap: i32) -> Self {
        Self {
            calendar,
            monthly_allowance,
            yearly_cap,
        }
    }

    pub fn apply(
        &self,
        employees: &[Employee],
        schedule: &mut Schedule,
        norm_month: i32,
        ym: &str,
    ) -> NormsInfo {
        let monthly_cap = if norm_month > 0 {
            norm_month + self.monthly_allowance
        } else {
            0
        };
        let mut info = NormsInfo {
            month: ym.to_owned(),
            norm_hours: norm_month,
            monthly_cap,
            yearly_cap: self.yearly_cap,
            operations: Vec::new(),
            warnings: Vec::new(),
            per_employee: BTreeMap::new(),
        };

        let mut hours = schedule.hours_by_employee();
        for e in employees {
            hours.entry(e.id.clone()).or_insert(0);
        }

        if norm_month <= 0 {
            // Without a norm there is nothing to cap; report totals only.
            for e in employees {
                info.per_employee.insert(
                    e.id.clone(),
                    EmployeeHoursReport {
                        hours: hours[&e.id],
                        overtime_month: 0,
                        yearly_left: None,
                    },
                );
            }
            return info;
        }

        let yearly_ok = |e: &Employee, total: i32| -> bool {
            if self.yearly_cap <= 0 {
                return true;
            }
            e.ytd_overtime + (total - norm_month).max(0) <= self.yearly_cap
        };

        for e in employees {
            if hours[&e.id] <= monthly_cap && yearly_ok(e, hours[&e.id]) {
                continue;
            }

            // Full day shifts, shortening-eligible dates first, then by date.
            let mut candidates: Vec<NaiveDate> = schedule
                .dates()
                .into_iter()
                .filter(|&d| {
                    matches!(schedule.code_on(&e.id, d), ShiftCode::Da | ShiftCode::Db)
                })
                .collect();
            candidates.sort_by_key(|&d| (!self.calendar.allows_shortening(d), d));

            for day in candidates {
                if hours[&e.id] <= monthly_cap && yearly_ok(e, hours[&e.id]) {
                    break;
                }
                let code = schedule.code_on(&e.id, day);
                let (morning, evening) = match code {
                    ShiftCode::Da => (ShiftCode::M8a, ShiftCode::E8a),
                    ShiftCode::Db => (ShiftCode::M8b, ShiftCode::E8b),
                    _ => continue,
                };

                // Never shorten a lone day worker.
                let other_day_workers = schedule
                    .day(day)
                    .iter()
                    .filter(|a| a.employee_id != e.id && a.shift_code.is_day())
                    .count();
                if other_day_workers < 1 {
                    continue;
                }

                // Coverage of the day without this employee's current cell.
                let (mut base_morning, mut base_evening) = (0, 0);
                for a in schedule.day(day) {
                    let (m, ev) = coverage_contribution(a.shift_code);
                    base_morning += m;
                    base_evening += ev;
                }
                let (own_m, own_e) = coverage_contribution(code);
                base_morning -= own_m;
                base_evening -= own_e;

                // Evening short fits an eligible day, morning a working one;
                // fall back to the other variant before giving up the day.
                let preference = if self.calendar.allows_shortening(day) {
                    [evening, morning]
                } else {
                    [morning, evening]
                };
                let chosen = preference.into_iter().find(|&option| {
                    let (m, ev) = coverage_contribution(option);
                    base_morning + m >= 1 && base_evening + ev >= 1
                });
                let Some(replacement) = chosen else {
                    continue;
                };

                let delta = replacement.hours() - code.hours();
                schedule.set_code(&e.id, day, replacement, AssignmentSource::Shorten);
                *hours.entry(e.id.clone()).or_insert(0) += delta;
                info.operations.push(ShortenOperation {
                    date: day,
                    employee_id: e.id.clone(),
                    from_code: code,
                    to_code: replacement,
                    hours_delta: delta,
                });
            }
        }

        for e in employees {
            let total = hours[&e.id];
            let overtime = (total - norm_month).max(0);
            let yearly_left = if self.yearly_cap > 0 {
                Some(self.yearly_cap - (e.ytd_overtime + overtime))
            } else {
                None
            };
            info.per_employee.insert(
                e.id.clone(),
                EmployeeHoursReport {
                    hours: total,
                    overtime_month: overtime,
                    yearly_left,
                },
            );

            let exceeds_month = monthly_cap > 0 && total > monthly_cap;
            let exceeds_year = matches!(yearly_left, Some(left) if left < 0);
            if !(exceeds_month || exceeds_year) {
                continue;
            }
            let message = if exceeds_year && !exceeds_month {
                let over = yearly_left.map(|left| -left).unwrap_or(0);
                format!("{} — {}: превышен годовой лимит на {over}ч", e.id, e.name)
            } else {
                let over = total - norm_month;
                let leftover = yearly_left
                    .map(|left| left.to_string())
                    .unwrap_or_else(|| "N/A".to_owned());
                format!(
                    "{} — {}: перелимит {over}ч; остаток по году {leftover}ч",
                    e.id, e.name
                )
            };
            tracing::warn!("{ym}: {message}");
            info.warnings.push(message);
        }

        info
    }
}
