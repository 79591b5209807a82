//! In-memory key/value store.
//!
//! Keeps two maps: the working values every `set` lands in, and the snapshot
//! taken at the last successful `sync`.  Tests assert against the snapshot to
//! check what a real store would have made durable.

use std::collections::{BTreeMap, BTreeSet};

use crate::application::ports::{KeyValueStore, StoreError, StoredValue};

/// A [`KeyValueStore`] backed by a `BTreeMap`, with optional injected
/// failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, StoredValue>,
    synced: BTreeMap<String, StoredValue>,
    sync_count: u32,
    failing_keys: BTreeSet<String>,
    fail_sync: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `key` as if it had been written and synced earlier.
    pub fn with(mut self, key: &str, value: StoredValue) -> Self {
        self.values.insert(key.to_string(), value.clone());
        self.synced.insert(key.to_string(), value);
        self
    }

    /// Seeds every `(key, value)` pair, as [`with`](Self::with) does.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, StoredValue)>) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |store, (key, value)| store.with(&key, value))
    }

    /// Makes every `set` of `key` fail with [`StoreError::Rejected`].
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Makes every `sync` fail.
    pub fn failing_sync(mut self) -> Self {
        self.fail_sync = true;
        self
    }

    /// Value under `key` as of the last successful sync.
    pub fn synced_value(&self, key: &str) -> Option<StoredValue> {
        self.synced.get(key).cloned()
    }

    /// Number of successful syncs.
    pub fn sync_count(&self) -> u32 {
        self.sync_count
    }

    /// Working keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// `true` when a `set` happened after the last sync.
    pub fn has_unsynced_changes(&self) -> bool {
        self.values != self.synced
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        if self.failing_keys.contains(key) {
            return Err(StoreError::Rejected {
                key: key.to_string(),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        if self.fail_sync {
            return Err(StoreError::Rejected {
                key: "<sync>".to_string(),
            });
        }
        self.synced = self.values.clone();
        self.sync_count += 1;
        Ok(())
    }
}
