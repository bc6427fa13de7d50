//! CLI subcommand implementations.

pub mod allow;
pub mod clear;
pub mod session;
pub mod stats;
pub mod status;
pub mod util;

use std::time::Duration;

use chrono::{DateTime, Utc};
use fg_core::{Clock, CollaboratorError, Dispatcher, DispatcherConfig, Scheduler, Store, TabQuery};

use crate::Config;
use crate::rules_file::RulesFile;

/// Wires the engine for a single command invocation.
///
/// Rules go to the rules file. There is no process left around to receive
/// wake-ups, so sessions are expired lazily by the next command instead.
pub fn one_shot(
    store: impl Store + 'static,
    clock: impl Clock + 'static,
    config: &Config,
) -> Dispatcher {
    Dispatcher::new(
        store,
        RulesFile::new(&config.rules_path, &config.block_page_url),
        DeferredScheduler,
        NoActiveTab,
        clock,
    )
    .with_config(DispatcherConfig {
        tick_interval: config.tick_interval(),
    })
}

/// Scheduler that drops wake-ups; used when no host process is running.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredScheduler;

impl Scheduler for DeferredScheduler {
    fn at(&mut self, name: &str, when: DateTime<Utc>) -> Result<(), CollaboratorError> {
        tracing::debug!(name, %when, "wake-up deferred to next command");
        Ok(())
    }

    fn every(&mut self, name: &str, period: Duration) -> Result<(), CollaboratorError> {
        tracing::debug!(name, period_secs = period.as_secs(), "periodic wake-up ignored");
        Ok(())
    }

    fn cancel(&mut self, _name: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// The CLI has no browser tab.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActiveTab;

impl TabQuery for NoActiveTab {
    fn active_focused_tab_url(&self) -> Result<Option<String>, CollaboratorError> {
        Ok(None)
    }
}
