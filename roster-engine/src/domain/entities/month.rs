use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use shared::{DomainError, DomainResult};

/// What to generate: a month tag, an optional hour norm, and the vacation
/// dates that an external post-colouring pass will paint over the pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthSpec {
    pub month_year: String,
    #[serde(default)]
    pub norm_hours_month: Option<i32>,
    #[serde(default)]
    pub vacations: BTreeMap<String, Vec<NaiveDate>>,
}

impl MonthSpec {
    pub fn new(month_year: impl Into<String>) -> Self {
        Self {
            month_year: month_year.into(),
            norm_hours_month: None,
            vacations: BTreeMap::new(),
        }
    }

    pub fn with_norm(mut self, norm: i32) -> Self {
        self.norm_hours_month = Some(norm);
        self
    }

    pub fn year_month(&self) -> DomainResult<(i32, u32)> {
        parse_month_tag(&self.month_year)
    }
}

/// Parse a `YYYY-MM` month tag.
pub fn parse_month_tag(tag: &str) -> DomainResult<(i32, u32)> {
    let malformed = || DomainError::Configuration(format!("malformed month tag: {tag}"));
    let (y, m) = tag.split_once('-').ok_or_else(malformed)?;
    let year: i32 = y.parse().map_err(|_| malformed())?;
    let month: u32 = m.parse().map_err(|_| malformed())?;
    if !(1..=12).contains(&month) || y.len() != 4 {
        return Err(malformed());
    }
    Ok((year, month))
}

/// First and last day of the month.
pub fn month_bounds(year: i32, month: u32) -> DomainResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::Configuration(format!("invalid month: {year}-{month:02}")))?;
    let (ny, nm) = next_month(year, month);
    let next_first = NaiveDate::from_ymd_opt(ny, nm, 1)
        .ok_or_else(|| DomainError::Configuration(format!("invalid month: {ny}-{nm:02}")))?;
    Ok((first, next_first - Duration::days(1)))
}

/// Every day of the month in ascending order.
pub fn month_days(year: i32, month: u32) -> DomainResult<Vec<NaiveDate>> {
    let (first, last) = month_bounds(year, month)?;
    let mut days = Vec::with_capacity(31);
    let mut d = first;
    while d <= last {
        days.push(d);
        d += Duration::days(1);
    }
    Ok(days)
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// True for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().number_from_monday() >= 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_tag() {
        assert_eq!(parse_month_tag("2025-08").unwrap(), (2025, 8));
        assert!(parse_month_tag("2025-13").is_err());
        assert!(parse_month_tag("2025").is_err());
        assert!(parse_month_tag("25-08").is_err());
        assert!(parse_month_tag("2025-xx").is_err());
    }

    #[test]
    fn test_month_bounds_and_days() {
        let (first, last) = month_bounds(2025, 8).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 8, 31).unwrap());
        assert_eq!(month_days(2025, 8).unwrap().len(), 31);

        // Non-leap February.
        let (_, feb_last) = month_bounds(2026, 2).unwrap();
        assert_eq!(feb_last, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        // December rolls into January of the next year.
        assert_eq!(next_month(2025, 12), (2026, 1));
        let (_, dec_last) = month_bounds(2025, 12).unwrap();
        assert_eq!(dec_last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_is_weekend() {
        // 2025-08-02 is a Saturday, 2025-08-04 a Monday.
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 8, 2).unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 8, 3).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2025, 8, 4).unwrap()));
    }
}
