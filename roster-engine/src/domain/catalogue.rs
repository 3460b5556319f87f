use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::{DomainError, DomainResult, Office, ShiftCode};

/// One entry of the shift-type catalogue: how an externally-keyed shift type
/// maps onto the closed code vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShiftTypeInfo {
    pub code: ShiftCode,
    pub office: Option<Office>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    pub hours: i32,
    pub is_working: bool,
    pub label: String,
}

/// Catalogue of shift types keyed by the external identifiers
/// (`day_a`, `night_b`, `n8_a`, …). Construction validates every entry
/// against the code vocabulary, so lookups downstream are total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftCatalogue {
    entries: BTreeMap<String, ShiftTypeInfo>,
}

impl ShiftCatalogue {
    pub fn new(entries: BTreeMap<String, ShiftTypeInfo>) -> DomainResult<Self> {
        for (key, info) in &entries {
            if info.office != info.code.office() {
                let expected = info.code.office();
                return Err(DomainError::Configuration(match expected {
                    Some(office) => format!("shift type {key}: {} requires office {office}", info.code),
                    None => format!("shift type {key}: {} carries no office", info.code),
                }));
            }
            if info.hours != info.code.hours() {
                return Err(DomainError::Configuration(format!(
                    "shift type {key}: {}h declared for {} ({}h nominal)",
                    info.hours,
                    info.code,
                    info.code.hours()
                )));
            }
            if info.is_working != info.code.is_working() {
                return Err(DomainError::Configuration(format!(
                    "shift type {key}: is_working mismatch for {}",
                    info.code
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The stock fifteen-entry catalogue.
    pub fn standard() -> Self {
        fn entry(
            code: ShiftCode,
            start: Option<&str>,
            end: Option<&str>,
            label: &str,
        ) -> ShiftTypeInfo {
            ShiftTypeInfo {
                code,
                office: code.office(),
                start: start.map(str::to_owned),
                end: end.map(str::to_owned),
                hours: code.hours(),
                is_working: code.is_working(),
                label: label.to_owned(),
            }
        }

        let entries = BTreeMap::from([
            ("day_a".into(), entry(ShiftCode::Da, Some("09:00"), Some("21:00"), "Day 12h — Office A")),
            ("day_b".into(), entry(ShiftCode::Db, Some("09:00"), Some("21:00"), "Day 12h — Office B")),
            ("night_a".into(), entry(ShiftCode::Na, Some("21:00"), Some("09:00"), "Night 12h — Office A")),
            ("night_b".into(), entry(ShiftCode::Nb, Some("21:00"), Some("09:00"), "Night 12h — Office B")),
            ("m8_a".into(), entry(ShiftCode::M8a, Some("09:00"), Some("18:00"), "Day 8h (morning) — Office A")),
            ("m8_b".into(), entry(ShiftCode::M8b, Some("09:00"), Some("18:00"), "Day 8h (morning) — Office B")),
            ("e8_a".into(), entry(ShiftCode::E8a, Some("12:00"), Some("21:00"), "Day 8h (evening) — Office A")),
            ("e8_b".into(), entry(ShiftCode::E8b, Some("12:00"), Some("21:00"), "Day 8h (evening) — Office B")),
            ("n4_a".into(), entry(ShiftCode::N4a, Some("21:00"), Some("00:00"), "Night 4h (last day) — Office A")),
            ("n4_b".into(), entry(ShiftCode::N4b, Some("21:00"), Some("00:00"), "Night 4h (last day) — Office B")),
            ("n8_a".into(), entry(ShiftCode::N8a, Some("00:00"), Some("09:00"), "Night 8h (carry to the 1st) — Office A")),
            ("n8_b".into(), entry(ShiftCode::N8b, Some("00:00"), Some("09:00"), "Night 8h (carry to the 1st) — Office B")),
            ("vac_wd8".into(), entry(ShiftCode::Vac8, Some("09:00"), Some("17:00"), "Vacation (weekday, 8h counted)")),
            ("vac_we0".into(), entry(ShiftCode::Vac0, None, None, "Vacation (weekend, 0h)")),
            ("off".into(), entry(ShiftCode::Off, None, None, "Day off")),
        ]);
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&ShiftTypeInfo> {
        self.entries.get(key)
    }

    pub fn code_of(&self, key: &str) -> DomainResult<ShiftCode> {
        self.entries
            .get(key)
            .map(|info| info.code)
            .ok_or_else(|| DomainError::Configuration(format!("unknown shift type key: {key}")))
    }

    /// External key for a code; total on the standard catalogue.
    pub fn key_of(&self, code: ShiftCode) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, info)| info.code == code)
            .map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShiftTypeInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
