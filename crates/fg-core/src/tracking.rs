//! Tracking state and its pure transition function.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Domain;

/// Which domain is being timed, and up to when time has been credited.
///
/// `last_active_at` never moves past the current time: every transition sets
/// it to the instant the transition was computed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingState {
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_active_at: DateTime<Utc>,
}

/// Whole seconds owed to a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub domain: Domain,
    pub seconds: u64,
}

/// Result of [`TrackingState::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State to persist.
    pub state: TrackingState,
    /// Time to add to the ledger before persisting `state`.
    pub credit: Option<Credit>,
}

impl TrackingState {
    /// Idle state anchored at `now`.
    #[must_use]
    pub const fn reset(now: DateTime<Utc>) -> Self {
        Self {
            domain: None,
            last_active_at: now,
        }
    }

    pub const fn is_idle(&self) -> bool {
        self.domain.is_none()
    }

    /// Whole seconds accrued since the last credit and not yet persisted.
    pub fn pending_seconds(&self, now: DateTime<Utc>) -> u64 {
        if self.domain.is_none() {
            return 0;
        }
        whole_seconds(now - self.last_active_at)
    }

    /// Moves to `next` at `now`, crediting elapsed time to the current domain.
    ///
    /// Sub-second remainders are dropped. Calling this with `next` equal to
    /// the current domain flushes accrued time without changing state.
    pub fn advance(&self, next: Option<Domain>, now: DateTime<Utc>) -> Transition {
        let credit = self.domain.as_ref().and_then(|domain| {
            let seconds = whole_seconds(now - self.last_active_at);
            (seconds > 0).then(|| Credit {
                domain: domain.clone(),
                seconds,
            })
        });

        Transition {
            state: Self {
                domain: next,
                last_active_at: now,
            },
            credit,
        }
    }
}

fn whole_seconds(elapsed: chrono::Duration) -> u64 {
    u64::try_from(elapsed.num_seconds()).unwrap_or(0)
}
