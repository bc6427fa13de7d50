//! Persisted layout: one store key per record.

use serde_json::Value;

use crate::allowlist::Allowlist;
use crate::ledger::UsageLedger;
use crate::session::SessionState;
use crate::store::{Store, StoreError, StoreExt};
use crate::tracking::TrackingState;

/// Store keys shared with the extension front end.
pub mod keys {
    pub const ALLOWLIST: &str = "allowlist";
    pub const SESSION: &str = "session";
    pub const STATS_BY_DATE: &str = "statsByDate";
    pub const TRACKING_STATE: &str = "trackingState";
}

/// Loads the allowlist. Missing or non-array values read as empty.
pub fn load_allowlist<S: Store + ?Sized>(store: &S) -> Result<Allowlist, StoreError> {
    match store.get(keys::ALLOWLIST)? {
        Some(Value::Array(items)) => Ok(Allowlist::from_raw(
            items.iter().filter_map(Value::as_str),
        )),
        _ => Ok(Allowlist::new()),
    }
}

pub fn save_allowlist<S: Store + ?Sized>(
    store: &mut S,
    allowlist: &Allowlist,
) -> Result<(), StoreError> {
    store.write(keys::ALLOWLIST, allowlist)
}

/// Whether an allowlist array has ever been written.
pub fn has_allowlist<S: Store + ?Sized>(store: &S) -> Result<bool, StoreError> {
    Ok(matches!(store.get(keys::ALLOWLIST)?, Some(Value::Array(_))))
}

pub fn load_session<S: Store + ?Sized>(store: &S) -> Result<Option<SessionState>, StoreError> {
    store.read(keys::SESSION)
}

pub fn save_session<S: Store + ?Sized>(
    store: &mut S,
    session: &SessionState,
) -> Result<(), StoreError> {
    store.write(keys::SESSION, session)
}

pub fn load_tracking<S: Store + ?Sized>(store: &S) -> Result<Option<TrackingState>, StoreError> {
    store.read(keys::TRACKING_STATE)
}

pub fn save_tracking<S: Store + ?Sized>(
    store: &mut S,
    tracking: &TrackingState,
) -> Result<(), StoreError> {
    store.write(keys::TRACKING_STATE, tracking)
}

pub fn load_ledger<S: Store + ?Sized>(store: &S) -> Result<UsageLedger, StoreError> {
    Ok(store.read(keys::STATS_BY_DATE)?.unwrap_or_default())
}

pub fn save_ledger<S: Store + ?Sized>(
    store: &mut S,
    ledger: &UsageLedger,
) -> Result<(), StoreError> {
    store.write(keys::STATS_BY_DATE, ledger)
}

/// Drops all recorded usage. The only operation that ever shrinks the ledger.
pub fn clear_usage<S: Store + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    store.remove(keys::STATS_BY_DATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::store::MemoryStore;
    use crate::types::Domain;

    #[test]
    fn allowlist_tolerates_missing_and_malformed_values() {
        let mut store = MemoryStore::new();
        assert!(load_allowlist(&store).unwrap().is_empty());
        assert!(!has_allowlist(&store).unwrap());

        store.set(keys::ALLOWLIST, json!("github.com")).unwrap();
        assert!(load_allowlist(&store).unwrap().is_empty());

        store
            .set(keys::ALLOWLIST, json!(["WWW.GitHub.com", 3, "docs.rs", ""]))
            .unwrap();
        assert_eq!(
            load_allowlist(&store).unwrap().to_strings(),
            vec!["docs.rs", "github.com"]
        );
        assert!(has_allowlist(&store).unwrap());
    }

    #[test]
    fn ledger_roundtrip_and_clear() {
        let mut store = MemoryStore::new();
        let mut ledger = load_ledger(&store).unwrap();
        ledger.credit(
            "2025-01-01".parse().unwrap(),
            &Domain::parse("github.com").unwrap(),
            30,
        );
        save_ledger(&mut store, &ledger).unwrap();

        assert_eq!(
            store.get(keys::STATS_BY_DATE).unwrap(),
            Some(json!({"2025-01-01": {"github.com": 30}}))
        );
        assert_eq!(load_ledger(&store).unwrap(), ledger);

        clear_usage(&mut store).unwrap();
        assert!(load_ledger(&store).unwrap().is_empty());
    }

    #[test]
    fn session_missing_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(load_session(&store).unwrap(), None);
        assert_eq!(load_tracking(&store).unwrap(), None);
    }
}
