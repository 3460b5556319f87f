use std::collections::BTreeMap;

use chrono::NaiveDate;
use shared::{DomainResult, ShiftCode};

use crate::domain::catalogue::ShiftCatalogue;
use crate::domain::entities::{Assignment, Employee, MonthSpec, Schedule};
use crate::domain::policy::EnginePolicy;
use crate::domain::services::balancer::{self, BalanceOutcome};
use crate::domain::services::generator::{self, Generator};
use crate::domain::services::shortener::{NormsInfo, ShiftShortener, ShorteningCalendar};
use crate::domain::services::validation;

/// Vacation post-colouring is an external collaborator: it repaints cells of
/// an already generated month (VAC8 on weekdays, VAC0 on weekends) without
/// touching the rotation. The engine only calls through this seam.
pub trait VacationRecolor {
    fn apply(&self, schedule: &mut Schedule, vacations: &BTreeMap<String, Vec<NaiveDate>>);
}

/// Everything one month run produces.
#[derive(Debug, Clone)]
pub struct MonthRun {
    pub schedule: Schedule,
    pub carry_out: Vec<Assignment>,
    pub ops_log: Vec<String>,
    pub apply_log: Vec<String>,
    pub pair_score_before: i64,
    pub pair_score_after: i64,
    pub solo_after: BTreeMap<String, u32>,
    pub baseline_issues: Vec<String>,
    pub norms: NormsInfo,
}

/// The full pipeline for one month: generate the template, check the cycle
/// baseline, break pairs, recolour vacations through the external seam,
/// re-derive the carry-out, and shorten into the hour caps. The shortener
/// always runs last.
pub struct Engine {
    generator: Generator,
    policy: EnginePolicy,
}

impl Engine {
    pub fn new(catalogue: ShiftCatalogue, policy: EnginePolicy) -> Self {
        Self {
            generator: Generator::new(catalogue),
            policy,
        }
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn catalogue(&self) -> &ShiftCatalogue {
        self.generator.catalogue()
    }

    /// Carry assignment from an external shift-type key (e.g. `n8_a`).
    pub fn carry_from_key(
        &self,
        employee_id: &str,
        date: NaiveDate,
        key: &str,
    ) -> DomainResult<Assignment> {
        self.generator.carry_from_key(employee_id, date, key)
    }

    pub fn run_month(
        &self,
        spec: &MonthSpec,
        employees: &[Employee],
        carry_in: &[Assignment],
        prev_tail: &BTreeMap<String, Vec<ShiftCode>>,
        calendar: &dyn ShorteningCalendar,
        vacations: Option<&dyn VacationRecolor>,
    ) -> DomainResult<MonthRun> {
        let plan = self
            .generator
            .generate_month(spec, employees, carry_in, prev_tail)?;
        let baseline_issues = validation::validate_baseline(&spec.month_year, employees, &plan.schedule);
        if !baseline_issues.is_empty() {
            tracing::warn!(
                "{}: {} baseline cycle issues",
                spec.month_year,
                baseline_issues.len()
            );
        }

        let norm = spec.norm_hours_month.unwrap_or(0);
        let BalanceOutcome {
            mut schedule,
            ops_log,
            apply_log,
            pair_score_before,
            pair_score_after,
            solo_after,
        } = balancer::apply_pair_breaking(
            &plan.schedule,
            employees,
            norm,
            &self.policy.pair_breaking,
        );

        if let Some(recolor) = vacations {
            recolor.apply(&mut schedule, &spec.vacations);
        }

        // The balancer may have moved the split night; the carry-out follows
        // the final last-day cells.
        let carry_out = generator::recompute_carry_out(&schedule)?;

        let shortener = ShiftShortener::new(
            calendar,
            self.policy.monthly_overtime_max,
            self.policy.yearly_overtime_max,
        );
        let norms = shortener.apply(employees, &mut schedule, norm, &spec.month_year);

        Ok(MonthRun {
            schedule,
            carry_out,
            ops_log,
            apply_log,
            pair_score_before,
            pair_score_after,
            solo_after,
            baseline_issues,
            norms,
        })
    }
}
