use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Timestamp as delivered by the backend.
///
/// The raw text is always kept for display. `parsed` is `None` when none of the
/// known formats match; such dates never satisfy a bounded date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDate {
    raw: String,
    parsed: Option<DateTime<Utc>>,
}

impl EmailDate {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = parse_timestamp(raw.trim());
        Self { raw, parsed }
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self {
            raw: value.to_rfc3339(),
            parsed: Some(value),
        }
    }

    pub fn missing() -> Self {
        Self {
            raw: String::new(),
            parsed: None,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.parsed
    }
}

impl Default for EmailDate {
    fn default() -> Self {
        Self::missing()
    }
}

impl fmt::Display for EmailDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<DateTime<Utc>> for EmailDate {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

impl Serialize for EmailDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for EmailDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(EmailDate::parse).unwrap_or_default())
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }
    if let Ok(value) = DateTime::parse_from_rfc2822(raw) {
        return Some(value.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(value.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}
