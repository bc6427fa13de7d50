//! Storage layer for focusguard.
//!
//! Implements [`fg_core::Store`] on top of `rusqlite`.
//!
//! # Thread Safety
//!
//! [`SqliteStore`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The engine is single-threaded, so each process owns exactly one store.
//! Several processes (a running `fg serve` and one-shot CLI commands) may open
//! the same file; writes are last-write-wins per key.
//!
//! # Schema
//!
//! A single `kv` table maps a key (`allowlist`, `session`, `statsByDate`,
//! `trackingState`) to a JSON document stored as TEXT. `updated_at` holds the
//! time of the last write in RFC 3339 with millisecond precision.

use std::path::Path;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use fg_core::store::{Listener, Store, StoreChange, StoreError, Subscribers};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored document is not valid JSON.
    #[error("invalid JSON stored for {key}: {source}")]
    InvalidJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidJson { key, source } => Self::InvalidValue { key, source },
            DbError::Sqlite(err) => Self::Backend(err.to_string()),
        }
    }
}

/// Key-value store persisted in SQLite.
pub struct SqliteStore {
    conn: Connection,
    subscribers: Subscribers,
}

impl SqliteStore {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            subscribers: Subscribers::default(),
        };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory database. Useful for testing.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            subscribers: Subscribers::default(),
        };
        store.init()?;
        Ok(store)
    }

    /// Idempotent schema setup.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(Duration::from_secs(5))?;
        self.conn.execute_batch(
            "
            -- value: JSON document
            -- updated_at: ISO 8601 (e.g., '2025-01-15T09:00:00.000Z')
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Reads and parses the document stored under `key`.
    pub fn load(&self, key: &str) -> Result<Option<Value>, DbError> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|source| DbError::InvalidJson {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    /// Writes `value` under `key`, returning the previous document.
    pub fn save(&mut self, key: &str, value: &Value) -> Result<Option<Value>, DbError> {
        let old_value = self.load(key).unwrap_or(None);
        self.conn.execute(
            "
            INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value.to_string(), now_timestamp()],
        )?;
        tracing::debug!(key, "stored value");
        Ok(old_value)
    }

    /// Deletes `key`, returning the previous document if there was one.
    pub fn delete(&mut self, key: &str) -> Result<Option<Value>, DbError> {
        let old_value = self.load(key).unwrap_or(None);
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        if removed == 0 {
            return Ok(None);
        }
        tracing::debug!(key, "removed value");
        Ok(old_value)
    }

    /// Keys currently stored, in ascending order.
    pub fn keys(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.load(key)?)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let old_value = self.save(key, &value)?;
        self.subscribers.notify(&StoreChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if let Some(old_value) = self.delete(key)? {
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

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
