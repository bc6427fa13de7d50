//! Activity tracker: turns focus changes and ticks into ledger credits.

use crate::env::{Clock, TabQuery};
use crate::error::EngineError;
use crate::state;
use crate::store::Store;
use crate::tracking::{TrackingState, Transition};
use crate::types::Domain;

/// Applies tracking transitions against the persisted store.
///
/// Borrowed for the duration of one handler; holds no state of its own.
pub struct ActivityTracker<'a> {
    store: &'a mut dyn Store,
    tabs: &'a dyn TabQuery,
    clock: &'a dyn Clock,
}

impl<'a> ActivityTracker<'a> {
    pub fn new(store: &'a mut dyn Store, tabs: &'a dyn TabQuery, clock: &'a dyn Clock) -> Self {
        Self { store, tabs, clock }
    }

    /// Resets tracking to idle at the current instant (startup/install).
    pub fn initialize(&mut self) -> Result<TrackingState, EngineError> {
        let state = TrackingState::reset(self.clock.now());
        state::save_tracking(&mut *self.store, &state)?;
        tracing::debug!(at = %state.last_active_at, "tracking state reset");
        Ok(state)
    }

    /// The allowlist entry of the focused tab, if any.
    ///
    /// A failing tab query degrades to `None` rather than an error.
    pub fn resolve_active(&self) -> Result<Option<Domain>, EngineError> {
        let url = match self.tabs.active_focused_tab_url() {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = %err, "could not resolve active tab");
                None
            }
        };
        let Some(url) = url else {
            return Ok(None);
        };

        let allowlist = state::load_allowlist(&*self.store)?;
        Ok(allowlist.match_url(&url).cloned())
    }

    /// Re-resolves the active domain and records the transition.
    pub fn refresh(&mut self) -> Result<Transition, EngineError> {
        let next = self.resolve_active()?;
        self.record(next)
    }

    /// Credits time owed to the current domain and switches to `next`.
    ///
    /// The ledger is written before the tracking state, so a failed ledger
    /// write leaves the old anchor in place and the time is credited later.
    pub fn record(&mut self, next: Option<Domain>) -> Result<Transition, EngineError> {
        let now = self.clock.now();
        let current = state::load_tracking(&*self.store)?.unwrap_or_else(|| TrackingState::reset(now));
        let transition = current.advance(next, now);

        if let Some(credit) = &transition.credit {
            let day = self.clock.day_key(now);
            let mut ledger = state::load_ledger(&*self.store)?;
            let total = ledger.credit(day, &credit.domain, credit.seconds);
            state::save_ledger(&mut *self.store, &ledger)?;
            tracing::debug!(
                domain = %credit.domain,
                seconds = credit.seconds,
                %day,
                total,
                "credited usage"
            );
        }

        state::save_tracking(&mut *self.store, &transition.state)?;
        if current.domain != transition.state.domain {
            tracing::debug!(
                from = ?current.domain.as_ref().map(Domain::as_str),
                to = ?transition.state.domain.as_ref().map(Domain::as_str),
                "active domain changed"
            );
        }
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use crate::allowlist::Allowlist;
    use crate::env::CollaboratorError;
    use crate::store::MemoryStore;
    use crate::testing::{FakeTabs, ManualClock};

    fn store_with_allowlist(entries: &[&str]) -> MemoryStore {
        let mut store = MemoryStore::new();
        state::save_allowlist(&mut store, &Allowlist::from_raw(entries)).unwrap();
        store
    }

    fn today_seconds(store: &MemoryStore, clock: &ManualClock, domain: &str) -> u64 {
        state::load_ledger(store)
            .unwrap()
            .seconds(clock.day_key(clock.now()), &Domain::parse(domain).unwrap())
    }

    #[test]
    fn ticks_on_same_domain_flush_every_interval() {
        let mut store = store_with_allowlist(&["github.com"]);
        let tabs = FakeTabs::focused("https://github.com/rust-lang/rust");
        let clock = ManualClock::default();

        ActivityTracker::new(&mut store, &tabs, &clock).initialize().unwrap();
        ActivityTracker::new(&mut store, &tabs, &clock).refresh().unwrap();
        for _ in 0..3 {
            clock.advance(Duration::seconds(60));
            ActivityTracker::new(&mut store, &tabs, &clock).refresh().unwrap();
        }

        assert_eq!(today_seconds(&store, &clock, "github.com"), 180);
        let tracking = state::load_tracking(&store).unwrap().unwrap();
        assert_eq!(tracking.last_active_at, clock.now());
    }

    #[test]
    fn non_allowlisted_tab_is_never_credited() {
        let mut store = store_with_allowlist(&["github.com"]);
        let tabs = FakeTabs::focused("https://news.ycombinator.com");
        let clock = ManualClock::default();

        ActivityTracker::new(&mut store, &tabs, &clock).refresh().unwrap();
        clock.advance(Duration::minutes(10));
        let transition = ActivityTracker::new(&mut store, &tabs, &clock).refresh().unwrap();

        assert_eq!(transition.credit, None);
        assert!(state::load_ledger(&store).unwrap().is_empty());
    }

    #[test]
    fn tab_query_failure_degrades_to_idle() {
        let mut store = store_with_allowlist(&["github.com"]);
        let tabs = FakeTabs::focused("https://github.com");
        let clock = ManualClock::default();

        ActivityTracker::new(&mut store, &tabs, &clock).refresh().unwrap();
        clock.advance(Duration::seconds(20));
        tabs.fail(CollaboratorError::new("tab query", "permission denied"));
        let transition = ActivityTracker::new(&mut store, &tabs, &clock).refresh().unwrap();

        assert_eq!(transition.credit.map(|c| c.seconds), Some(20));
        assert!(transition.state.is_idle());
    }

    #[test]
    fn missing_tracking_state_starts_fresh() {
        let mut store = store_with_allowlist(&["github.com"]);
        let tabs = FakeTabs::none();
        let clock = ManualClock::default();

        let transition = ActivityTracker::new(&mut store, &tabs, &clock)
            .record(Some(Domain::parse("github.com").unwrap()))
            .unwrap();

        assert_eq!(transition.credit, None);
        assert_eq!(transition.state.last_active_at, clock.now());
    }
}
