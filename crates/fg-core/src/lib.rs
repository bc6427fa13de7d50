//! Core engine for the focus guard.
//!
//! This crate contains the domain types and the two state machines:
//! - Activity tracking: crediting active-tab time to allowlisted domains
//! - Focus sessions: timed blocking of everything outside the allowlist
//!
//! All I/O goes through the collaborator traits in [`env`] and the [`Store`]
//! trait, so the engine runs unchanged against a browser host, the CLI or
//! the test doubles.

pub mod allowlist;
pub mod dispatch;
pub mod domain;
pub mod env;
mod error;
pub mod focus;
pub mod ledger;
pub mod rules;
pub mod session;
pub mod state;
pub mod store;
#[cfg(test)]
mod testing;
pub mod tracker;
pub mod tracking;
pub mod types;

pub use allowlist::Allowlist;
pub use dispatch::{Command, Dispatcher, DispatcherConfig, Event, Response};
pub use domain::{match_allowed, normalize_domain};
pub use env::{Clock, CollaboratorError, RuleInstaller, Scheduler, SystemClock, TabQuery};
pub use error::EngineError;
pub use focus::FocusSessionController;
pub use ledger::{DayReport, UsageLedger, UsageRow};
pub use rules::BlockingRule;
pub use session::SessionState;
pub use store::{MemoryStore, Store, StoreChange, StoreError, StoreExt, Subscribers};
pub use tracker::ActivityTracker;
pub use tracking::{Credit, TrackingState, Transition};
pub use types::{DayKey, Domain, ValidationError};
