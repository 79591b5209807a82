//! Port traits for everything the preference layer talks to but does not own.
//!
//! # Ports and adapters (for beginners)
//!
//! The use cases in this layer never open files or call into the diagram
//! engine directly.  They depend on the small traits below; the
//! `infrastructure` layer supplies the concrete adapters (a TOML file, an
//! in-memory map, the runtime protocol palette).  Tests swap in mocks.
//!
//! - [`KeyValueStore`] – namespaced, typed get/set with a "was defaulted" flag
//!   on every read, plus an explicit flush.
//! - [`ProtocolColoring`] – receives the authoritative color vector whenever it
//!   changes; owns runtime protocol → color resolution.
//! - [`ProtocolHistory`] – remembers protocol names the user confirmed.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

// ── Key/value store ───────────────────────────────────────────────────────────

/// Error type for key/value store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing preference store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but cannot be read as a store at all.
    #[error("preference store at {path} is unreadable: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The in-memory contents could not be encoded for writing.
    #[error("failed to encode preference store: {0}")]
    Encode(String),

    /// A key path runs through an existing value that is not a section.
    #[error("key {key:?} collides with an existing non-section value")]
    KeyConflict { key: String },

    /// The value kind cannot be written by this store.
    #[error("value for key {key:?} cannot be stored")]
    Unsupported { key: String },

    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// The store refused the write (read-only media, injected failure, ...).
    #[error("store rejected write to key {key:?}")]
    Rejected { key: String },
}

/// A raw value as held by a store.
///
/// Stores are text-backed at heart, so the typed readers are lenient in the
/// same way: a string that parses as the requested type is accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Vector(Vec<String>),
    /// Present, but of a kind no typed reader accepts (a nested section, a
    /// date, a mixed array).  The string names the kind for diagnostics.
    Unsupported(String),
}

/// Result of a typed read: the value plus whether it came from the default.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    /// `true` when the key was absent or its stored value was malformed.
    pub defaulted: bool,
}

impl<T> Lookup<T> {
    pub fn found(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    pub fn defaulted(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

/// Conversion from a [`StoredValue`] into a typed preference value.
pub trait FromStored: Sized {
    /// Human-readable type name used in log messages.
    const TYPE_NAME: &'static str;

    /// Returns `None` when `raw` cannot represent this type.
    fn from_stored(raw: &StoredValue) -> Option<Self>;
}

impl FromStored for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_stored(raw: &StoredValue) -> Option<Self> {
        match raw {
            StoredValue::Bool(b) => Some(*b),
            StoredValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromStored for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_stored(raw: &StoredValue) -> Option<Self> {
        match raw {
            StoredValue::Int(i) => Some(*i),
            StoredValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromStored for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_stored(raw: &StoredValue) -> Option<Self> {
        match raw {
            StoredValue::Float(f) => Some(*f),
            StoredValue::Int(i) => Some(*i as f64),
            StoredValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromStored for String {
    const TYPE_NAME: &'static str = "string";

    fn from_stored(raw: &StoredValue) -> Option<Self> {
        match raw {
            StoredValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromStored for Vec<String> {
    const TYPE_NAME: &'static str = "string vector";

    fn from_stored(raw: &StoredValue) -> Option<Self> {
        match raw {
            StoredValue::Vector(items) => Some(items.clone()),
            // Legacy text stores kept vectors as one space-separated string.
            StoredValue::Str(s) => Some(s.split_whitespace().map(str::to_string).collect()),
            _ => None,
        }
    }
}

/// Reads `key` as `T`, falling back to `default` when it is absent or
/// malformed.
pub fn read_with_default<S, T>(store: &S, key: &str, default: T) -> Lookup<T>
where
    S: KeyValueStore + ?Sized,
    T: FromStored,
{
    match store.get(key) {
        None => {
            debug!(key, "preference absent, using default");
            Lookup::defaulted(default)
        }
        Some(raw) => match T::from_stored(&raw) {
            Some(value) => Lookup::found(value),
            None => {
                warn!(key, expected = T::TYPE_NAME, found = ?raw, "malformed preference, using default");
                Lookup::defaulted(default)
            }
        },
    }
}

/// String-keyed persistent storage.
///
/// Implementors only provide raw `get`/`set`/`sync`; the typed readers and
/// writers are derived from those.
pub trait KeyValueStore {
    /// Returns the raw value under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Option<StoredValue>;

    /// Stores `value` under `key`.  Not durable until [`sync`](Self::sync).
    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    /// Makes every previous `set` durable.
    fn sync(&mut self) -> Result<(), StoreError>;

    fn get_bool(&self, key: &str, default: bool) -> Lookup<bool> {
        read_with_default(self, key, default)
    }

    fn get_int(&self, key: &str, default: i64) -> Lookup<i64> {
        read_with_default(self, key, default)
    }

    fn get_float(&self, key: &str, default: f64) -> Lookup<f64> {
        read_with_default(self, key, default)
    }

    fn get_string(&self, key: &str, default: &str) -> Lookup<String> {
        read_with_default(self, key, default.to_string())
    }

    fn get_vector(&self, key: &str, default: &[&str]) -> Lookup<Vec<String>> {
        read_with_default(self, key, default.iter().map(|s| s.to_string()).collect())
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError> {
        self.set(key, StoredValue::Bool(value))
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        self.set(key, StoredValue::Int(value))
    }

    fn set_float(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        self.set(key, StoredValue::Float(value))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set(key, StoredValue::Str(value.to_string()))
    }

    fn set_vector(&mut self, key: &str, value: &[String]) -> Result<(), StoreError> {
        self.set(key, StoredValue::Vector(value.to_vec()))
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Option<StoredValue> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        (**self).sync()
    }
}

/// Key prefix scoping all reads and writes of one configuration section.
///
/// Leading and trailing slashes are ignored, so `"/netdiag/"` and `"netdiag"`
/// name the same namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(prefix: &str) -> Self {
        Self(prefix.trim_matches('/').to_string())
    }

    /// Builds the full store key for a `Section/name` path.
    pub fn key(&self, path: &str) -> String {
        if self.0.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.0, path)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new("netdiag")
    }
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Runtime protocol → color resolution, fed from the persisted color vector.
#[cfg_attr(test, mockall::automock)]
pub trait ProtocolColoring {
    /// Replaces the coloring rules with `colors` (persisted encoding, one
    /// entry per assignment; the slice length is the count).
    fn read_pref_vector(&mut self, colors: &[String]);
}

/// Recall list of protocol names the user has confirmed.
#[cfg_attr(test, mockall::automock)]
pub trait ProtocolHistory {
    fn record(&mut self, name: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Minimal store for exercising the provided typed readers.
    #[derive(Default)]
    struct MapStore(HashMap<String, StoredValue>);

    impl KeyValueStore for MapStore {
        fn get(&self, key: &str) -> Option<StoredValue> {
            self.0.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError> {
            self.0.insert(key.to_string(), value);
            Ok(())
        }

        fn sync(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_absent_key_is_defaulted() {
        let store = MapStore::default();
        assert_eq!(store.get_bool("Diagram/cycle", true), Lookup::defaulted(true));
    }

    #[test]
    fn test_present_key_is_found() {
        let mut store = MapStore::default();
        store.set_float("Diagram/averaging_time", 1500.0).unwrap();
        assert_eq!(
            store.get_float("Diagram/averaging_time", 3000.0),
            Lookup::found(1500.0)
        );
    }

    #[test]
    fn test_wrong_type_is_defaulted() {
        let mut store = MapStore::default();
        store.set_string("Diagram/refresh_period", "soon").unwrap();
        assert_eq!(store.get_int("Diagram/refresh_period", 800), Lookup::defaulted(800));
    }

    #[test]
    fn test_numeric_text_is_accepted() {
        let mut store = MapStore::default();
        store.set_string("Diagram/refresh_period", " 1200 ").unwrap();
        store.set_string("Diagram/averaging_time", "2.5").unwrap();
        store.set_string("Diagram/cycle", "FALSE").unwrap();
        assert_eq!(store.get_int("Diagram/refresh_period", 800), Lookup::found(1200));
        assert_eq!(store.get_float("Diagram/averaging_time", 0.0), Lookup::found(2.5));
        assert_eq!(store.get_bool("Diagram/cycle", true), Lookup::found(false));
    }

    #[test]
    fn test_integer_is_accepted_as_float_but_not_as_string() {
        let mut store = MapStore::default();
        store.set_int("k", 7).unwrap();
        assert_eq!(store.get_float("k", 0.0), Lookup::found(7.0));
        assert_eq!(store.get_string("k", "d"), Lookup::defaulted("d".to_string()));
    }

    #[test]
    fn test_legacy_space_separated_vector_is_split() {
        let mut store = MapStore::default();
        store.set_string("Diagram/colors", "#ff0000;WWW #00ff00").unwrap();
        assert_eq!(
            store.get_vector("Diagram/colors", &[]).value,
            vec!["#ff0000;WWW".to_string(), "#00ff00".to_string()]
        );
    }

    #[test]
    fn test_unsupported_value_is_defaulted() {
        let mut store = MapStore::default();
        store
            .set("Diagram/fontname", StoredValue::Unsupported("table".into()))
            .unwrap();
        assert!(store.get_string("Diagram/fontname", "fixed").defaulted);
    }

    #[test]
    fn test_namespace_prefixes_keys_and_trims_slashes() {
        assert_eq!(Namespace::new("/Etherape/").key("Diagram/colors"), "Etherape/Diagram/colors");
        assert_eq!(Namespace::new("").key("General/version"), "General/version");
        assert_eq!(Namespace::default().as_str(), "netdiag");
    }
}
