//! Session entry storage.
//!
//! The guard never owns a session. It reads and writes a single entry through
//! [`SessionEntryStore`], which the application implements on top of whatever
//! session backend it already uses.

use crate::error::SessionResult;
use dashmap::DashMap;
use tracing::{debug, trace};

/// Key/value view of one user's session.
///
/// No locking is implied: two requests racing on the same key can both read
/// the token before either clears it. Backends that need stronger guarantees
/// must serialize access per key themselves.
pub trait SessionEntryStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the entry is absent or was cleared.
    fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Write `value` under `key`; `None` clears the entry.
    fn set(&self, key: &str, value: Option<String>) -> SessionResult<()>;
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        debug!("Creating new in-memory CSRF session store");
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl SessionEntryStore for MemorySessionStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: Option<String>) -> SessionResult<()> {
        match value {
            Some(value) => {
                trace!(key = %key, "Storing session entry");
                self.entries.insert(key.to_string(), value);
            }
            None => {
                trace!(key = %key, "Clearing session entry");
                self.entries.remove(key);
            }
        }
        Ok(())
    }
}
