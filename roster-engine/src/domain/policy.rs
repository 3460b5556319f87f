use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::services::pairing::PairOverlap;

/// Knobs for the pair-breaking balancer. Every field has a default so a
/// policy bag deserializes from partial input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PairBreakingPolicy {
    pub enabled: bool,
    /// Minimum day-overlap for a previous-month pair to become a target.
    pub overlap_threshold: u32,
    /// Early-month window the phase operators work inside.
    pub window_days: u32,
    /// Maximum accepted operations per month.
    pub max_ops: u32,
    /// Cumulative predicted hour drift the accepted operations may amass.
    pub hours_budget: i32,
    /// Prime the rotor against the partner's office while stitching.
    pub anti_align: bool,
    /// Run the month-wide office desync pass over the target pairs.
    pub post_desync_all: bool,
    /// Overrides the exclusive matching when non-empty.
    pub fixed_pairs: Vec<(String, String)>,
    /// Excluded from pair scoring and from being moved.
    pub intern_ids: Vec<String>,
    /// Last month's pair overlaps; the targets to break.
    pub prev_pairs: Vec<PairOverlap>,
    /// Per-employee norm overrides used by the role choice.
    pub norm_by_employee: BTreeMap<String, i32>,
}

impl Default for PairBreakingPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            overlap_threshold: 8,
            window_days: 6,
            max_ops: 4,
            hours_budget: 12,
            anti_align: true,
            post_desync_all: true,
            fixed_pairs: Vec::new(),
            intern_ids: Vec::new(),
            prev_pairs: Vec::new(),
            norm_by_employee: BTreeMap::new(),
        }
    }
}

impl PairBreakingPolicy {
    pub fn is_intern(&self, employee_id: &str) -> bool {
        self.intern_ids.iter().any(|id| id == employee_id)
    }
}

/// Month-independent engine limits plus the balancer knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnginePolicy {
    /// Added to the month norm to get the monthly hour cap.
    pub monthly_overtime_max: i32,
    /// Maximum year-to-date overtime accepted.
    pub yearly_overtime_max: i32,
    pub pair_breaking: PairBreakingPolicy,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            monthly_overtime_max: 10,
            yearly_overtime_max: 120,
            pair_breaking: PairBreakingPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = EnginePolicy::default();
        assert_eq!(p.monthly_overtime_max, 10);
        assert_eq!(p.yearly_overtime_max, 120);
        assert!(!p.pair_breaking.enabled);
        assert_eq!(p.pair_breaking.overlap_threshold, 8);
        assert_eq!(p.pair_breaking.window_days, 6);
        assert_eq!(p.pair_breaking.max_ops, 4);
        assert_eq!(p.pair_breaking.hours_budget, 12);
        assert!(p.pair_breaking.anti_align);
        assert!(p.pair_breaking.post_desync_all);
    }

    #[test]
    fn test_partial_bag_deserializes_over_defaults() {
        let p: EnginePolicy = serde_json::from_str(
            r#"{"pair_breaking": {"enabled": true, "window_days": 4, "intern_ids": ["E09"]}}"#,
        )
        .unwrap();
        assert!(p.pair_breaking.enabled);
        assert_eq!(p.pair_breaking.window_days, 4);
        assert!(p.pair_breaking.is_intern("E09"));
        assert_eq!(p.pair_breaking.max_ops, 4);
        assert_eq!(p.monthly_overtime_max, 10);
    }
}
