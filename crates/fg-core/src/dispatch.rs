//! Event and command dispatch.
//!
//! Every input (browser notification, timer wake-up, UI command) goes through
//! a [`Dispatcher`], which runs the matching transition to completion before
//! returning. Passive events log and swallow their errors; commands turn
//! them into an error [`Response`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::env::{Clock, RuleInstaller, SESSION_ALARM, Scheduler, TICK_ALARM, TabQuery};
use crate::error::EngineError;
use crate::focus::FocusSessionController;
use crate::session::{DEFAULT_DURATION_MINUTES, SessionState, clamp_duration};
use crate::state;
use crate::store::Store;
use crate::tracker::ActivityTracker;

/// Error text for messages that are not a known command.
pub const UNKNOWN_MESSAGE: &str = "Unknown message type.";

/// Passive inputs from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// First run after install or update.
    Installed,
    /// Process (re)start.
    Startup,
    /// Periodic flush.
    Tick,
    /// Another window gained focus.
    FocusChanged,
    /// The active tab changed or navigated.
    TabUpdated,
    /// No browser window has focus.
    WindowBlurred,
    /// A named wake-up fired.
    AlarmFired(String),
}

/// Requests from the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    StartSession {
        #[serde(default = "default_duration")]
        duration_minutes: i64,
        #[serde(default)]
        strict_mode: bool,
    },
    StopSession,
    AllowlistUpdated,
    GetSession,
}

fn default_duration() -> i64 {
    i64::from(DEFAULT_DURATION_MINUTES)
}

/// Reply to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub const fn ok() -> Self {
        Self {
            ok: true,
            session: None,
            error: None,
        }
    }

    pub const fn with_session(session: SessionState) -> Self {
        Self {
            ok: true,
            session: Some(session),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            session: None,
            error: Some(message.into()),
        }
    }
}

/// Dispatcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Period of the usage flush wake-up.
    pub tick_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
        }
    }
}

/// Routes events and commands to the tracker and session controller.
pub struct Dispatcher {
    store: Box<dyn Store>,
    rules: Box<dyn RuleInstaller>,
    scheduler: Box<dyn Scheduler>,
    tabs: Box<dyn TabQuery>,
    clock: Box<dyn Clock>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        store: impl Store + 'static,
        rules: impl RuleInstaller + 'static,
        scheduler: impl Scheduler + 'static,
        tabs: impl TabQuery + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            rules: Box::new(rules),
            scheduler: Box::new(scheduler),
            tabs: Box::new(tabs),
            clock: Box::new(clock),
            config: DispatcherConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Direct store access for user-facing writes (allowlist edits, clearing data).
    pub fn store_mut(&mut self) -> &mut dyn Store {
        self.store.as_mut()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn tracker(&mut self) -> ActivityTracker<'_> {
        ActivityTracker::new(self.store.as_mut(), self.tabs.as_ref(), self.clock.as_ref())
    }

    pub fn focus(&mut self) -> FocusSessionController<'_> {
        FocusSessionController::new(
            self.store.as_mut(),
            self.rules.as_mut(),
            self.scheduler.as_mut(),
            self.clock.as_ref(),
        )
    }

    /// Handles a passive event. Failures are logged, never returned.
    pub fn handle_event(&mut self, event: &Event) {
        if let Err(err) = self.try_handle_event(event) {
            tracing::warn!(?event, error = %err, "event handler failed");
        }
    }

    pub fn try_handle_event(&mut self, event: &Event) -> Result<(), EngineError> {
        tracing::debug!(?event, "handling event");
        match event {
            Event::Installed => {
                self.seed_defaults()?;
                self.start_up()
            }
            Event::Startup => self.start_up(),
            Event::Tick | Event::FocusChanged | Event::TabUpdated => {
                self.tracker().refresh().map(drop)
            }
            Event::WindowBlurred => self.tracker().record(None).map(drop),
            Event::AlarmFired(name) => match name.as_str() {
                TICK_ALARM => self.tracker().refresh().map(drop),
                SESSION_ALARM => self.focus().on_expiry_fired().map(drop),
                other => {
                    tracing::debug!(alarm = other, "ignoring unknown alarm");
                    Ok(())
                }
            },
        }
    }

    /// Handles a UI command.
    pub fn handle_command(&mut self, command: Command) -> Response {
        match command {
            Command::StartSession {
                duration_minutes,
                strict_mode,
            } => match self
                .focus()
                .start(clamp_duration(duration_minutes), strict_mode)
            {
                Ok(session) => Response::with_session(session),
                Err(err) => {
                    tracing::warn!(error = %err, "unable to start focus session");
                    Response::error(format!("Unable to start focus session: {err}"))
                }
            },
            Command::StopSession => respond(self.focus().stop()),
            Command::AllowlistUpdated => match self.allowlist_updated() {
                Ok(()) => Response::ok(),
                Err(err) => {
                    tracing::warn!(error = %err, "allowlist refresh failed");
                    Response::error(err.to_string())
                }
            },
            Command::GetSession => respond(self.focus().current()),
        }
    }

    /// Handles a raw JSON message, answering unknown ones with an error.
    pub fn handle_message(&mut self, message: &Value) -> Response {
        match Command::deserialize(message) {
            Ok(command) => self.handle_command(command),
            Err(err) => {
                tracing::debug!(error = %err, "unrecognized message");
                Response::error(UNKNOWN_MESSAGE)
            }
        }
    }

    fn allowlist_updated(&mut self) -> Result<(), EngineError> {
        let refreshed = self.focus().on_allowlist_changed();
        self.tracker().refresh()?;
        refreshed.map(drop)
    }

    fn start_up(&mut self) -> Result<(), EngineError> {
        self.tracker().initialize()?;
        let restored = self.focus().restore_on_startup();
        self.scheduler.every(TICK_ALARM, self.config.tick_interval)?;
        restored.map(drop)
    }

    fn seed_defaults(&mut self) -> Result<(), EngineError> {
        if !state::has_allowlist(self.store.as_ref())? {
            state::save_allowlist(self.store.as_mut(), &crate::allowlist::Allowlist::new())?;
        }
        if state::load_session(self.store.as_ref())?.is_none() {
            state::save_session(self.store.as_mut(), &SessionState::inactive())?;
        }
        Ok(())
    }
}

fn respond(result: Result<SessionState, EngineError>) -> Response {
    match result {
        Ok(session) => Response::with_session(session),
        Err(err) => {
            tracing::warn!(error = %err, "session command failed");
            Response::error(err.to_string())
        }
    }
}
