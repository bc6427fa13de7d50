//! Tokio-backed named wake-ups.
//!
//! Each wake-up is a spawned task that only sends its name over a channel;
//! the host loop turns received names into `AlarmFired` events, so handlers
//! never run on the timer tasks themselves.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fg_core::{CollaboratorError, Scheduler};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};

pub struct TimerScheduler {
    alarms: UnboundedSender<String>,
    timers: HashMap<String, JoinHandle<()>>,
}

impl TimerScheduler {
    /// Must be created and used inside a tokio runtime.
    pub fn new(alarms: UnboundedSender<String>) -> Self {
        Self {
            alarms,
            timers: HashMap::new(),
        }
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.timers.get(name).is_some_and(|handle| !handle.is_finished())
    }

    fn replace(&mut self, name: &str, handle: JoinHandle<()>) {
        if let Some(previous) = self.timers.insert(name.to_string(), handle) {
            previous.abort();
        }
    }
}

impl Scheduler for TimerScheduler {
    fn at(&mut self, name: &str, when: DateTime<Utc>) -> Result<(), CollaboratorError> {
        let delay = (when - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let alarms = self.alarms.clone();
        let alarm = name.to_string();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = alarms.send(alarm);
        });
        self.replace(name, handle);
        tracing::debug!(name, delay_secs = delay.as_secs(), "one-shot wake-up scheduled");
        Ok(())
    }

    fn every(&mut self, name: &str, period: Duration) -> Result<(), CollaboratorError> {
        if period.is_zero() {
            return Err(CollaboratorError::new("scheduler", "period must be positive"));
        }
        let alarms = self.alarms.clone();
        let alarm = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                if alarms.send(alarm.clone()).is_err() {
                    break;
                }
            }
        });
        self.replace(name, handle);
        tracing::debug!(name, period_secs = period.as_secs(), "periodic wake-up scheduled");
        Ok(())
    }

    fn cancel(&mut self, name: &str) -> Result<(), CollaboratorError> {
        if let Some(handle) = self.timers.remove(name) {
            handle.abort();
            tracing::debug!(name, "wake-up cancelled");
        }
        Ok(())
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        for handle in self.timers.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_at_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TimerScheduler::new(tx);

        scheduler
            .at("focus-session-end", Utc::now() - chrono::Duration::seconds(1))
            .unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("focus-session-end"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_wake_up_repeats() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TimerScheduler::new(tx);

        scheduler.every("usage-tick", Duration::from_secs(60)).unwrap();

        for _ in 0..3 {
            assert_eq!(rx.recv().await.as_deref(), Some("usage-tick"));
        }
        assert!(scheduler.is_scheduled("usage-tick"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_reschedule_replace_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TimerScheduler::new(tx);

        scheduler.every("usage-tick", Duration::from_secs(60)).unwrap();
        scheduler.cancel("usage-tick").unwrap();
        assert!(!scheduler.is_scheduled("usage-tick"));

        scheduler.every("first", Duration::from_secs(5)).unwrap();
        scheduler.every("first", Duration::from_secs(3600)).unwrap();
        scheduler.every("second", Duration::from_secs(10)).unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn zero_period_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = TimerScheduler::new(tx);
        assert!(scheduler.every("usage-tick", Duration::ZERO).is_err());
    }
}
