//! Focus session record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Duration suggested when the user has not picked one.
pub const DEFAULT_DURATION_MINUTES: u32 = 25;

/// Persisted focus session.
///
/// Missing fields in a stored record fall back to the inactive defaults.
/// When `is_active`, `end_time = started_at + duration_minutes` minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub is_active: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub strict_mode: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::inactive()
    }
}

impl SessionState {
    /// The inactive defaults written on stop and on expiry.
    #[must_use]
    pub const fn inactive() -> Self {
        Self {
            is_active: false,
            started_at: DateTime::<Utc>::UNIX_EPOCH,
            end_time: DateTime::<Utc>::UNIX_EPOCH,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            strict_mode: false,
        }
    }

    /// A fresh active session starting at `now`.
    pub fn begin(
        now: DateTime<Utc>,
        duration_minutes: u32,
        strict_mode: bool,
    ) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDuration {
            value: i64::from(duration_minutes),
        };
        if duration_minutes < 1 {
            return Err(invalid());
        }
        let length = Duration::try_minutes(i64::from(duration_minutes)).ok_or_else(invalid)?;
        let end_time = now.checked_add_signed(length).ok_or_else(invalid)?;

        Ok(Self {
            is_active: true,
            started_at: now,
            end_time,
            duration_minutes,
            strict_mode,
        })
    }

    /// Whether an active session has reached its end time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.end_time
    }

    /// Time left before expiry; zero when inactive or expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if !self.is_active || now >= self.end_time {
            return Duration::zero();
        }
        self.end_time - now
    }
}

/// Clamps a requested duration to the minimum of one minute.
pub fn clamp_duration(requested: i64) -> u32 {
    u32::try_from(requested.max(1)).unwrap_or(u32::MAX)
}
