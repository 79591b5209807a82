//! Recently confirmed protocol names.

use std::collections::VecDeque;

use tracing::warn;

use crate::application::ports::{KeyValueStore, Namespace, ProtocolHistory, StoreError};

/// Maximum number of remembered names.
pub const HISTORY_CAPACITY: usize = 10;

/// Store key, relative to the namespace.
pub const HISTORY_KEY: &str = "History/protocols";

/// Most-recent-first list of protocol names, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentProtocols {
    names: VecDeque<String>,
}

impl RecentProtocols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the stored history; a missing or malformed value is empty.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, namespace: &Namespace) -> Self {
        let stored = store.get_vector(&namespace.key(HISTORY_KEY), &[]).value;
        let mut history = Self::new();
        // Stored most-recent-first; replay oldest first.
        for name in stored.iter().rev() {
            history.record(name);
        }
        history
    }

    /// Writes the history.  Durable after the store's next `sync`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write is refused.
    pub fn save<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        namespace: &Namespace,
    ) -> Result<(), StoreError> {
        let names: Vec<String> = self.names.iter().cloned().collect();
        store.set_vector(&namespace.key(HISTORY_KEY), &names)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl ProtocolHistory for RecentProtocols {
    fn record(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            warn!("ignoring empty protocol name");
            return;
        }
        self.names.retain(|existing| existing != name);
        self.names.push_front(name.to_string());
        self.names.truncate(HISTORY_CAPACITY);
    }
}
