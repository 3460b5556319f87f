pub mod assignment;
pub mod employee;
pub mod month;
pub mod schedule;

pub use assignment::Assignment;
pub use employee::{check_unique_ids, Employee};
pub use month::{month_bounds, month_days, next_month, parse_month_tag, MonthSpec};
pub use schedule::Schedule;
