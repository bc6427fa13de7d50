//! Test doubles for the environment collaborators.
//!
//! Each double is a cheap handle over shared state so a test can keep a clone
//! after handing the other one to the dispatcher.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::allowlist::Allowlist;
use crate::env::{Clock, CollaboratorError, RuleInstaller, Scheduler, TabQuery};
use crate::types::DayKey;

#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<DateTime<Utc>>>);

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap())
    }
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Rc::new(Cell::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }

    // UTC days keep tests independent of the machine's zone.
    fn day_key(&self, at: DateTime<Utc>) -> DayKey {
        DayKey::from_date(at.date_naive())
    }
}

#[derive(Debug, Clone)]
pub struct FakeTabs(Rc<RefCell<Result<Option<String>, CollaboratorError>>>);

impl FakeTabs {
    pub fn focused(url: &str) -> Self {
        Self(Rc::new(RefCell::new(Ok(Some(url.to_string())))))
    }

    pub fn none() -> Self {
        Self(Rc::new(RefCell::new(Ok(None))))
    }

    pub fn set(&self, url: Option<&str>) {
        *self.0.borrow_mut() = Ok(url.map(str::to_string));
    }

    pub fn fail(&self, err: CollaboratorError) {
        *self.0.borrow_mut() = Err(err);
    }
}

impl TabQuery for FakeTabs {
    fn active_focused_tab_url(&self) -> Result<Option<String>, CollaboratorError> {
        self.0.borrow().clone()
    }
}

#[derive(Debug, Default)]
pub struct RulesLog {
    /// Currently installed allowlist, `None` when no rules are installed.
    pub installed: Option<Vec<String>>,
    pub installs: usize,
    pub clears: usize,
    pub fail_install: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingRules(pub Rc<RefCell<RulesLog>>);

impl RuleInstaller for RecordingRules {
    fn install(&mut self, allowlist: &Allowlist) -> Result<(), CollaboratorError> {
        let mut log = self.0.borrow_mut();
        if log.fail_install {
            return Err(CollaboratorError::new("rule installer", "quota exceeded"));
        }
        log.installs += 1;
        log.installed = Some(allowlist.to_strings());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CollaboratorError> {
        let mut log = self.0.borrow_mut();
        log.clears += 1;
        log.installed = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alarm {
    At(DateTime<Utc>),
    Every(StdDuration),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler(pub Rc<RefCell<BTreeMap<String, Alarm>>>);

impl RecordingScheduler {
    pub fn get(&self, name: &str) -> Option<Alarm> {
        self.0.borrow().get(name).copied()
    }
}

impl Scheduler for RecordingScheduler {
    fn at(&mut self, name: &str, when: DateTime<Utc>) -> Result<(), CollaboratorError> {
        self.0.borrow_mut().insert(name.to_string(), Alarm::At(when));
        Ok(())
    }

    fn every(&mut self, name: &str, period: StdDuration) -> Result<(), CollaboratorError> {
        self.0
            .borrow_mut()
            .insert(name.to_string(), Alarm::Every(period));
        Ok(())
    }

    fn cancel(&mut self, name: &str) -> Result<(), CollaboratorError> {
        self.0.borrow_mut().remove(name);
        Ok(())
    }
}
