//! Rotating roster engine: generates, repairs and balances monthly D,N,O,O
//! schedules for a small two-office team.

pub mod domain;

pub use domain::entities::{Assignment, Employee, MonthSpec, Schedule};
pub use domain::services::engine::{Engine, MonthRun};
