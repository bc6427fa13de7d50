//! Focus session controller: start, stop, restore and expire sessions.

use crate::env::{Clock, RuleInstaller, SESSION_ALARM, Scheduler};
use crate::error::EngineError;
use crate::session::SessionState;
use crate::state;
use crate::store::Store;

/// Owns the session lifecycle for the duration of one handler.
///
/// `stop` is unconditional; the strict-mode gate lives in the user-facing
/// layer, since expiry also goes through `stop`.
pub struct FocusSessionController<'a> {
    store: &'a mut dyn Store,
    rules: &'a mut dyn RuleInstaller,
    scheduler: &'a mut dyn Scheduler,
    clock: &'a dyn Clock,
}

impl<'a> FocusSessionController<'a> {
    pub fn new(
        store: &'a mut dyn Store,
        rules: &'a mut dyn RuleInstaller,
        scheduler: &'a mut dyn Scheduler,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            store,
            rules,
            scheduler,
            clock,
        }
    }

    /// The persisted session, or the inactive defaults if none was stored.
    pub fn current(&self) -> Result<SessionState, EngineError> {
        Ok(state::load_session(&*self.store)?.unwrap_or_default())
    }

    /// Starts a session blocking everything outside the current allowlist.
    ///
    /// Rules are installed before anything is persisted: if installation
    /// fails the session stays inactive.
    pub fn start(
        &mut self,
        duration_minutes: u32,
        strict_mode: bool,
    ) -> Result<SessionState, EngineError> {
        let session = SessionState::begin(self.clock.now(), duration_minutes, strict_mode)?;
        let allowlist = state::load_allowlist(&*self.store)?;

        self.rules.install(&allowlist)?;
        if let Err(err) = state::save_session(&mut *self.store, &session) {
            if let Err(clear_err) = self.rules.clear() {
                tracing::warn!(error = %clear_err, "failed to roll back blocking rules");
            }
            return Err(err.into());
        }
        if let Err(err) = self.scheduler.at(SESSION_ALARM, session.end_time) {
            tracing::warn!(error = %err, "failed to schedule session expiry");
        }

        tracing::info!(
            duration_minutes,
            strict_mode,
            end_time = %session.end_time,
            allowed = allowlist.len(),
            "focus session started"
        );
        Ok(session)
    }

    /// Removes blocking and resets the session to the inactive defaults.
    pub fn stop(&mut self) -> Result<SessionState, EngineError> {
        self.rules.clear()?;
        let session = SessionState::inactive();
        state::save_session(&mut *self.store, &session)?;
        if let Err(err) = self.scheduler.cancel(SESSION_ALARM) {
            tracing::warn!(error = %err, "failed to cancel session expiry");
        }

        tracing::info!("focus session stopped");
        Ok(session)
    }

    /// Re-applies a persisted session after a restart.
    ///
    /// Rules and wake-ups do not survive a restart. An expired session is
    /// stopped without re-installing rules.
    pub fn restore_on_startup(&mut self) -> Result<SessionState, EngineError> {
        let session = self.current()?;
        if !session.is_active {
            return Ok(session);
        }

        if session.is_expired(self.clock.now()) {
            tracing::info!(end_time = %session.end_time, "focus session expired while offline");
            return self.stop();
        }

        let allowlist = state::load_allowlist(&*self.store)?;
        self.rules.install(&allowlist)?;
        self.scheduler.at(SESSION_ALARM, session.end_time)?;

        tracing::info!(end_time = %session.end_time, "focus session restored");
        Ok(session)
    }

    /// Handles the session wake-up.
    ///
    /// A wake-up arriving before the persisted end time belongs to a
    /// superseded schedule; it re-arms for the real end time instead of
    /// ending the session.
    pub fn on_expiry_fired(&mut self) -> Result<SessionState, EngineError> {
        let session = self.current()?;
        if session.is_active && !session.is_expired(self.clock.now()) {
            tracing::debug!(end_time = %session.end_time, "early session wake-up, re-arming");
            self.scheduler.at(SESSION_ALARM, session.end_time)?;
            return Ok(session);
        }
        self.stop()
    }

    /// Re-installs rules from the live allowlist if a session is active.
    ///
    /// Returns whether the rules were refreshed. The end time is unchanged.
    pub fn on_allowlist_changed(&mut self) -> Result<bool, EngineError> {
        let session = self.current()?;
        if !session.is_active {
            return Ok(false);
        }

        let allowlist = state::load_allowlist(&*self.store)?;
        self.rules.install(&allowlist)?;
        tracing::debug!(allowed = allowlist.len(), "blocking rules refreshed");
        Ok(true)
    }

    /// Stops the session if it is active and past its end time.
    pub fn expire_if_due(&mut self) -> Result<SessionState, EngineError> {
        let session = self.current()?;
        if session.is_expired(self.clock.now()) {
            return self.stop();
        }
        Ok(session)
    }
}
