use serde::{Deserialize, Serialize};
use shared::{DomainError, DomainResult};

/// Roster member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_trainee: bool,
    #[serde(default)]
    pub mentor_id: Option<String>,
    /// Year-to-date overtime hours already on the books.
    #[serde(default)]
    pub ytd_overtime: i32,
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_trainee: false,
            mentor_id: None,
            ytd_overtime: 0,
        }
    }

    /// Stable fallback phase anchor (0..=3) derived from the id alone, used
    /// when no previous-month tail is available for the employee.
    pub fn seed4(&self) -> u8 {
        (fnv1a(self.id.as_bytes()) % 4) as u8
    }
}

/// FNV-1a, stable across runs and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Duplicate ids make every per-employee lookup ambiguous; reject them before
/// any schedule is produced.
pub fn check_unique_ids(employees: &[Employee]) -> DomainResult<()> {
    let mut seen = std::collections::BTreeSet::new();
    for e in employees {
        if !seen.insert(e.id.as_str()) {
            return Err(DomainError::Configuration(format!(
                "duplicate employee id: {}",
                e.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed4_is_stable_and_bounded() {
        let e = Employee::new("E01", "One");
        assert_eq!(e.seed4(), Employee::new("E01", "renamed").seed4());
        assert!(e.seed4() < 4);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let roster = vec![Employee::new("E01", "One"), Employee::new("E01", "Two")];
        assert!(check_unique_ids(&roster).is_err());

        let ok = vec![Employee::new("E01", "One"), Employee::new("E02", "Two")];
        assert!(check_unique_ids(&ok).is_ok());
    }
}
