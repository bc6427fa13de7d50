//! Per-day, per-domain usage seconds.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::allowlist::Allowlist;
use crate::types::{DayKey, Domain};

/// Seconds per domain for a single day.
pub type DayUsage = BTreeMap<Domain, u64>;

/// Persisted usage ledger: day -> domain -> seconds.
///
/// Values only grow. Entries are created on the first credited second and
/// the whole ledger is only ever dropped by [`UsageLedger::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageLedger(BTreeMap<DayKey, DayUsage>);

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `seconds` to a (day, domain) pair and returns the new total.
    pub fn credit(&mut self, day: DayKey, domain: &Domain, seconds: u64) -> u64 {
        if seconds == 0 {
            return self.seconds(day, domain);
        }
        let total = self
            .0
            .entry(day)
            .or_default()
            .entry(domain.clone())
            .or_insert(0);
        *total = total.saturating_add(seconds);
        *total
    }

    pub fn seconds(&self, day: DayKey, domain: &Domain) -> u64 {
        self.0
            .get(&day)
            .and_then(|usage| usage.get(domain))
            .copied()
            .unwrap_or(0)
    }

    pub fn day(&self, day: DayKey) -> Option<&DayUsage> {
        self.0.get(&day)
    }

    pub fn days(&self) -> impl Iterator<Item = (&DayKey, &DayUsage)> {
        self.0.iter()
    }

    pub fn total_for_day(&self, day: DayKey) -> u64 {
        self.day(day).map_or(0, |usage| usage.values().sum())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// One row of a day report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRow {
    pub domain: Domain,
    pub seconds: u64,
    /// Whether this domain is the one currently being timed.
    pub active: bool,
}

/// Usage for one day, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub day: DayKey,
    pub rows: Vec<UsageRow>,
    pub total_seconds: u64,
}

impl DayReport {
    /// Builds the report rows for `day`.
    ///
    /// Lists every allowlist entry (or every recorded domain when the
    /// allowlist is empty), busiest first. `live` adds not-yet-credited
    /// seconds for the domain currently being timed.
    pub fn build(
        ledger: &UsageLedger,
        day: DayKey,
        allowlist: &Allowlist,
        live: Option<(&Domain, u64)>,
    ) -> Self {
        let usage = ledger.day(day);
        let domains: Vec<&Domain> = if allowlist.is_empty() {
            usage.map(|u| u.keys().collect()).unwrap_or_default()
        } else {
            allowlist.iter().collect()
        };

        let mut rows: Vec<UsageRow> = domains
            .into_iter()
            .map(|domain| {
                let recorded = usage.and_then(|u| u.get(domain)).copied().unwrap_or(0);
                let (seconds, active) = match live {
                    Some((live_domain, extra)) if live_domain == domain => {
                        (recorded.saturating_add(extra), true)
                    }
                    _ => (recorded, false),
                };
                UsageRow {
                    domain: domain.clone(),
                    seconds,
                    active,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            Reverse(a.seconds)
                .cmp(&Reverse(b.seconds))
                .then_with(|| a.domain.cmp(&b.domain))
        });

        let total_seconds = rows.iter().map(|row| row.seconds).sum();
        Self {
            day,
            rows,
            total_seconds,
        }
    }
}
