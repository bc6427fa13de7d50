//! Key-value store abstraction with change notification.
//!
//! Values are JSON documents. Each handler reads a full record, computes the
//! next value and writes the full record back; there are no partial-field
//! updates.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A stored document did not have the expected shape.
    #[error("invalid value for {key}: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single write, delivered to subscribers after it is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Callback invoked on every change.
pub type Listener = Box<dyn FnMut(&StoreChange)>;

/// Persistent key-value store.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Registers a listener for all subsequent changes made through this store.
    fn subscribe(&mut self, listener: Listener);
}

/// Typed access on top of [`Store`].
pub trait StoreExt: Store {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.get(key)?
            .map(|value| {
                serde_json::from_value(value).map_err(|source| StoreError::InvalidValue {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::InvalidValue {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Listener registry shared by store implementations.
#[derive(Default)]
pub struct Subscribers(Vec<Listener>);

impl Subscribers {
    pub fn push(&mut self, listener: Listener) {
        self.0.push(listener);
    }

    pub fn notify(&mut self, change: &StoreChange) {
        for listener in &mut self.0 {
            listener(change);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.0.len())
            .finish()
    }
}

/// In-process store, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let old_value = self.values.insert(key.to_string(), value.clone());
        self.subscribers.notify(&StoreChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if let Some(old_value) = self.values.remove(key) {
            self.subscribers.notify(&StoreChange {
                key: key.to_string(),
                old_value: Some(old_value),
                new_value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&mut self, listener: Listener) {
        self.subscribers.push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    #[test]
    fn typed_roundtrip() {
        let mut store = MemoryStore::new();
        store.write("allowlist", &vec!["a.com".to_string()]).unwrap();

        let value: Option<Vec<String>> = store.read("allowlist").unwrap();
        assert_eq!(value, Some(vec!["a.com".to_string()]));
        assert_eq!(store.read::<Vec<String>>("missing").unwrap(), None);
    }

    #[test]
    fn read_reports_shape_mismatch() {
        let mut store = MemoryStore::new();
        store.set("allowlist", json!({"not": "a list"})).unwrap();

        let err = store.read::<Vec<String>>("allowlist").unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { ref key, .. } if key == "allowlist"));
    }

    #[test]
    fn subscribers_see_old_and_new_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = MemoryStore::new();
        let sink = Rc::clone(&seen);
        store.subscribe(Box::new(move |change: &StoreChange| {
            sink.borrow_mut().push(change.clone());
        }));

        store.set("session", json!(1)).unwrap();
        store.set("session", json!(2)).unwrap();
        store.remove("session").unwrap();
        store.remove("session").unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].old_value, Some(json!(1)));
        assert_eq!(seen[1].new_value, Some(json!(2)));
        assert_eq!(seen[2].new_value, None);
    }
}
