//! Core type definitions with validation.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::normalize_domain;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The value could not be parsed as a hostname.
    #[error("invalid domain: {input}")]
    InvalidDomain { input: String },

    /// The domain is already present in the allowlist.
    #[error("Domain already in allowlist.")]
    DuplicateDomain { domain: String },

    /// Focus sessions must last at least one minute.
    #[error("session duration must be at least 1 minute, got {value}")]
    InvalidDuration { value: i64 },

    /// Day keys use the `YYYY-MM-DD` format.
    #[error("invalid day key: {value}")]
    InvalidDayKey { value: String },
}

/// A normalized allowlist domain.
///
/// Always lowercase, without a leading `www.` and without scheme, port or
/// path. The only way to build one is through [`Domain::parse`], so every
/// value in the allowlist and the usage ledger is already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    /// Normalizes user input (a bare domain or a full URL) into a domain.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "domain" });
        }
        normalize_domain(trimmed)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidDomain {
                input: trimmed.to_string(),
            })
    }

    /// Returns the domain as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Domain {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Calendar day used to bucket usage seconds (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
    const FORMAT: &'static str = "%Y-%m-%d";

    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The day containing `at` in the user's local time zone.
    pub fn local(at: DateTime<Utc>) -> Self {
        Self(at.with_timezone(&Local).date_naive())
    }

    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, Self::FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDayKey {
                value: s.to_string(),
            })
    }
}

impl Serialize for DayKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parse_normalizes_input() {
        let domain = Domain::parse("  https://WWW.Example.com/path?q=1 ").unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn domain_parse_rejects_empty() {
        assert_eq!(
            Domain::parse("   "),
            Err(ValidationError::Empty { field: "domain" })
        );
    }

    #[test]
    fn domain_parse_rejects_garbage() {
        let err = Domain::parse("exa mple.com").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDomain { .. }));
    }

    #[test]
    fn domain_deserialization_normalizes() {
        let domain: Domain = serde_json::from_str(r#""WWW.GitHub.com""#).unwrap();
        assert_eq!(domain.as_str(), "github.com");

        let result: Result<Domain, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }

    #[test]
    fn day_key_parses_and_formats() {
        let key: DayKey = "2025-03-09".parse().unwrap();
        assert_eq!(key.date(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!(key.to_string(), "2025-03-09");
    }

    #[test]
    fn day_key_rejects_other_formats() {
        let result: Result<DayKey, _> = "09/03/2025".parse();
        assert_eq!(
            result,
            Err(ValidationError::InvalidDayKey {
                value: "09/03/2025".to_string()
            })
        );
    }

    #[test]
    fn day_key_works_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("2025-01-02".parse::<DayKey>().unwrap(), 5_u64);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2025-01-02":5}"#);

        let parsed: std::collections::BTreeMap<DayKey, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }
}
