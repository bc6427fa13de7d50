//! Capabilities the state machines need from their environment.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::allowlist::Allowlist;
use crate::types::DayKey;

/// Name of the periodic wake-up that flushes usage time.
pub const TICK_ALARM: &str = "usage-tick";

/// Name of the one-shot wake-up that ends a focus session.
pub const SESSION_ALARM: &str = "focus-session-end";

/// Failure reported by an environment collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{collaborator} failed: {message}")]
pub struct CollaboratorError {
    pub collaborator: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self {
            collaborator,
            message: message.into(),
        }
    }
}

/// Installs and removes the "block everything except the allowlist" rules.
///
/// `install` atomically replaces any previously installed rule set.
pub trait RuleInstaller {
    fn install(&mut self, allowlist: &Allowlist) -> Result<(), CollaboratorError>;

    fn clear(&mut self) -> Result<(), CollaboratorError>;
}

/// Named wake-ups. Scheduling a name again replaces the previous wake-up.
pub trait Scheduler {
    fn at(&mut self, name: &str, when: DateTime<Utc>) -> Result<(), CollaboratorError>;

    fn every(&mut self, name: &str, period: Duration) -> Result<(), CollaboratorError>;

    fn cancel(&mut self, name: &str) -> Result<(), CollaboratorError>;
}

/// Reports the URL of the active tab in the focused window.
pub trait TabQuery {
    /// `Ok(None)` when no window is focused or it has no active tab.
    fn active_focused_tab_url(&self) -> Result<Option<String>, CollaboratorError>;
}

/// Source of the current time and of day boundaries.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Day bucket for an instant. Defaults to the local calendar day.
    fn day_key(&self, at: DateTime<Utc>) -> DayKey {
        DayKey::local(at)
    }
}

/// Wall clock in the user's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
