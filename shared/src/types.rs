use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One of the two offices the workforce is split across each day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Office {
    A,
    B,
}

impl Office {
    pub fn opposite(self) -> Office {
        match self {
            Office::A => Office::B,
            Office::B => Office::A,
        }
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Office::A => write!(f, "A"),
            Office::B => write!(f, "B"),
        }
    }
}

/// Coarse classification of a shift code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftKind {
    Day,
    Night,
    Vacation,
    Off,
}

/// Per-day projection of a code: working day, working night, or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseToken {
    D,
    N,
    O,
}

impl fmt::Display for PhaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseToken::D => write!(f, "D"),
            PhaseToken::N => write!(f, "N"),
            PhaseToken::O => write!(f, "O"),
        }
    }
}

/// Provenance of an assignment cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Template,
    Autofix,
    Override,
    PhaseShift,
    PairDesync,
    Shorten,
}

/// Closed vocabulary of shift codes. The spellings are externally visible
/// and appear verbatim in serialized schedules, logs and reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShiftCode {
    /// Day 12h, office A.
    Da,
    /// Day 12h, office B.
    Db,
    /// Night 12h, office A.
    Na,
    /// Night 12h, office B.
    Nb,
    /// Day-short morning 8h, office A.
    M8a,
    /// Day-short morning 8h, office B.
    M8b,
    /// Day-short evening 8h, office A.
    E8a,
    /// Day-short evening 8h, office B.
    E8b,
    /// Night split 4h, last day of month only, office A.
    N4a,
    /// Night split 4h, last day of month only, office B.
    N4b,
    /// Night split 8h carry, first day of month only, office A.
    N8a,
    /// Night split 8h carry, first day of month only, office B.
    N8b,
    /// Vacation on a weekday, counted as 8h.
    Vac8,
    /// Vacation on a weekend, 0h.
    Vac0,
    /// Rest day.
    Off,
}

impl ShiftCode {
    pub const ALL: [ShiftCode; 15] = [
        ShiftCode::Da,
        ShiftCode::Db,
        ShiftCode::Na,
        ShiftCode::Nb,
        ShiftCode::M8a,
        ShiftCode::M8b,
        ShiftCode::E8a,
        ShiftCode::E8b,
        ShiftCode::N4a,
        ShiftCode::N4b,
        ShiftCode::N8a,
        ShiftCode::N8b,
        ShiftCode::Vac8,
        ShiftCode::Vac0,
        ShiftCode::Off,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftCode::Da => "DA",
            ShiftCode::Db => "DB",
            ShiftCode::Na => "NA",
            ShiftCode::Nb => "NB",
            ShiftCode::M8a => "M8A",
            ShiftCode::M8b => "M8B",
            ShiftCode::E8a => "E8A",
            ShiftCode::E8b => "E8B",
            ShiftCode::N4a => "N4A",
            ShiftCode::N4b => "N4B",
            ShiftCode::N8a => "N8A",
            ShiftCode::N8b => "N8B",
            ShiftCode::Vac8 => "VAC8",
            ShiftCode::Vac0 => "VAC0",
            ShiftCode::Off => "OFF",
        }
    }

    pub fn kind(self) -> ShiftKind {
        match self {
            ShiftCode::Da
            | ShiftCode::Db
            | ShiftCode::M8a
            | ShiftCode::M8b
            | ShiftCode::E8a
            | ShiftCode::E8b => ShiftKind::Day,
            ShiftCode::Na
            | ShiftCode::Nb
            | ShiftCode::N4a
            | ShiftCode::N4b
            | ShiftCode::N8a
            | ShiftCode::N8b => ShiftKind::Night,
            ShiftCode::Vac8 | ShiftCode::Vac0 => ShiftKind::Vacation,
            ShiftCode::Off => ShiftKind::Off,
        }
    }

    pub fn office(self) -> Option<Office> {
        match self {
            ShiftCode::Da
            | ShiftCode::Na
            | ShiftCode::M8a
            | ShiftCode::E8a
            | ShiftCode::N4a
            | ShiftCode::N8a => Some(Office::A),
            ShiftCode::Db
            | ShiftCode::Nb
            | ShiftCode::M8b
            | ShiftCode::E8b
            | ShiftCode::N4b
            | ShiftCode::N8b => Some(Office::B),
            ShiftCode::Vac8 | ShiftCode::Vac0 | ShiftCode::Off => None,
        }
    }

    /// Nominal hours of the code.
    pub fn hours(self) -> i32 {
        match self {
            ShiftCode::Da | ShiftCode::Db | ShiftCode::Na | ShiftCode::Nb => 12,
            ShiftCode::M8a
            | ShiftCode::M8b
            | ShiftCode::E8a
            | ShiftCode::E8b
            | ShiftCode::N8a
            | ShiftCode::N8b
            | ShiftCode::Vac8 => 8,
            ShiftCode::N4a | ShiftCode::N4b => 4,
            ShiftCode::Vac0 | ShiftCode::Off => 0,
        }
    }

    pub fn is_working(self) -> bool {
        matches!(self.kind(), ShiftKind::Day | ShiftKind::Night)
    }

    pub fn is_day(self) -> bool {
        self.kind() == ShiftKind::Day
    }

    pub fn is_night(self) -> bool {
        self.kind() == ShiftKind::Night
    }

    pub fn is_split_carry(self) -> bool {
        matches!(self, ShiftCode::N8a | ShiftCode::N8b)
    }

    pub fn is_split_tail(self) -> bool {
        matches!(self, ShiftCode::N4a | ShiftCode::N4b)
    }

    pub fn is_vacation(self) -> bool {
        self.kind() == ShiftKind::Vacation
    }

    /// Plain D/N/O projection: every night code is N, vacation and rest are O.
    /// This is the projection the cycle validator and the overlap counters use.
    pub fn token(self) -> PhaseToken {
        match self.kind() {
            ShiftKind::Day => PhaseToken::D,
            ShiftKind::Night => PhaseToken::N,
            ShiftKind::Vacation | ShiftKind::Off => PhaseToken::O,
        }
    }

    /// Pair-metric projection. Identical to [`token`](Self::token) except that
    /// an N8 carry on the first day of the month counts as O: the employee is
    /// finishing the previous month's night and is off today.
    pub fn pair_token(self, first_of_month: bool) -> PhaseToken {
        if first_of_month && self.is_split_carry() {
            return PhaseToken::O;
        }
        self.token()
    }

    /// A↔B counterpart of the code. Officeless codes and the day-1 N8 carry
    /// (which is never flipped in place) map to themselves.
    pub fn swap_office(self) -> ShiftCode {
        match self {
            ShiftCode::Da => ShiftCode::Db,
            ShiftCode::Db => ShiftCode::Da,
            ShiftCode::Na => ShiftCode::Nb,
            ShiftCode::Nb => ShiftCode::Na,
            ShiftCode::M8a => ShiftCode::M8b,
            ShiftCode::M8b => ShiftCode::M8a,
            ShiftCode::E8a => ShiftCode::E8b,
            ShiftCode::E8b => ShiftCode::E8a,
            ShiftCode::N4a => ShiftCode::N4b,
            ShiftCode::N4b => ShiftCode::N4a,
            other => other,
        }
    }

    /// Day code for the given office.
    pub fn day_for(office: Office) -> ShiftCode {
        match office {
            Office::A => ShiftCode::Da,
            Office::B => ShiftCode::Db,
        }
    }

    /// Night code for the given office.
    pub fn night_for(office: Office) -> ShiftCode {
        match office {
            Office::A => ShiftCode::Na,
            Office::B => ShiftCode::Nb,
        }
    }

    /// Split-night tail (N4) for the given office.
    pub fn split_tail_for(office: Office) -> ShiftCode {
        match office {
            Office::A => ShiftCode::N4a,
            Office::B => ShiftCode::N4b,
        }
    }

    /// Split-night carry (N8) for the given office.
    pub fn split_carry_for(office: Office) -> ShiftCode {
        match office {
            Office::A => ShiftCode::N8a,
            Office::B => ShiftCode::N8b,
        }
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShiftCode::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::Configuration(format!("unknown shift code: {s}")))
    }
}
