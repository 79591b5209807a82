//! TOML-file key/value store.
//!
//! Store keys are `/`-separated paths; each segment but the last names a
//! TOML table.  The key `netdiag/Diagram/colors` lives here on disk:
//!
//! ```toml
//! [netdiag.General]
//! version = "0.9.0"
//!
//! [netdiag.Diagram]
//! refresh_period = 800
//! colors = ["#ff0000;WWW", "#0000ff;DOMAIN", "#00ff00"]
//! ```
//!
//! The default file location is platform-specific:
//! - Windows:  `%APPDATA%\Netdiag\prefs.toml`
//! - Linux:    `~/.config/netdiag/prefs.toml`
//! - macOS:    `~/Library/Application Support/Netdiag/prefs.toml`
//!
//! # Durability (for beginners)
//!
//! `set` only changes the in-memory document.  `sync` serialises it to a
//! uniquely named temporary file in the same directory, flushes that file to
//! the device, then renames it over the real one.  A crash mid-sync leaves
//! either the old file or the new one, never half of each.  A sync that fails
//! before the rename deletes its temporary file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use toml::{Table, Value};
use tracing::{debug, info};

use crate::application::ports::{KeyValueStore, StoreError, StoredValue};

/// A [`KeyValueStore`] persisted as one TOML document.
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
    root: Table,
}

impl TomlFileStore {
    /// Opens the store at `path`.  A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] for file-system errors other than "not
    /// found" and [`StoreError::Corrupt`] if the file is not valid TOML.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let root = match fs::read_to_string(&path) {
            Ok(content) => content.parse::<Table>().map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "preference file absent, starting empty");
                Table::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, root })
    }

    /// Opens the store at [`default_path`](Self::default_path).
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open) and [`default_path`](Self::default_path).
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_path()?)
    }

    /// The platform-appropriate preference file path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoPlatformConfigDir`] when the platform config
    /// base directory cannot be determined from the environment.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        platform_config_dir()
            .map(|dir| dir.join("prefs.toml"))
            .ok_or(StoreError::NoPlatformConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every leaf value with its full `/`-separated key, in document order.
    pub fn entries(&self) -> Vec<(String, StoredValue)> {
        let mut out = Vec::new();
        flatten("", &self.root, &mut out);
        out
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut segments = segments(key);
        let last = segments.pop()?;
        let mut table = &self.root;
        for segment in segments {
            table = table.get(segment)?.as_table()?;
        }
        table.get(last)
    }

    /// Returns the table holding `key`'s last segment, creating sections on
    /// the way.
    fn parent_table_mut<'a>(&'a mut self, key: &str, segments: &[&str]) -> Result<&'a mut Table, StoreError> {
        let mut table = &mut self.root;
        for segment in segments {
            table = table
                .entry(segment.to_string())
                .or_insert_with(|| Value::Table(Table::new()))
                .as_table_mut()
                .ok_or_else(|| StoreError::KeyConflict {
                    key: key.to_string(),
                })?;
        }
        Ok(table)
    }
}

impl KeyValueStore for TomlFileStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.lookup(key).map(to_stored)
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        let mut segments = segments(key);
        let last = segments.pop().ok_or_else(|| StoreError::KeyConflict {
            key: key.to_string(),
        })?;
        let value = from_stored(key, value)?;
        let table = self.parent_table_mut(key, &segments)?;
        if table.get(last).is_some_and(Value::is_table) {
            return Err(StoreError::KeyConflict {
                key: key.to_string(),
            });
        }
        table.insert(last.to_string(), value);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        let content =
            toml::to_string_pretty(&self.root).map_err(|e| StoreError::Encode(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let io_err = |source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        // The temp file is removed on drop unless `persist` succeeds.
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        tmp.persist(&self.path).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e.error,
        })?;
        info!(path = %self.path.display(), "preferences written");
        Ok(())
    }
}

fn flatten(prefix: &str, table: &Table, out: &mut Vec<(String, StoredValue)>) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        match value {
            Value::Table(inner) => flatten(&key, inner, out),
            leaf => out.push((key, to_stored(leaf))),
        }
    }
}

fn segments(key: &str) -> Vec<&str> {
    key.split('/').filter(|s| !s.is_empty()).collect()
}

fn to_stored(value: &Value) -> StoredValue {
    match value {
        Value::Boolean(b) => StoredValue::Bool(*b),
        Value::Integer(i) => StoredValue::Int(*i),
        Value::Float(f) => StoredValue::Float(*f),
        Value::String(s) => StoredValue::Str(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map_or_else(|| StoredValue::Unsupported("mixed array".into()), StoredValue::Vector),
        Value::Table(_) => StoredValue::Unsupported("table".into()),
        Value::Datetime(_) => StoredValue::Unsupported("datetime".into()),
    }
}

fn from_stored(key: &str, value: StoredValue) -> Result<Value, StoreError> {
    Ok(match value {
        StoredValue::Bool(b) => Value::Boolean(b),
        StoredValue::Int(i) => Value::Integer(i),
        StoredValue::Float(f) => Value::Float(f),
        StoredValue::Str(s) => Value::String(s),
        StoredValue::Vector(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        StoredValue::Unsupported(_) => {
            return Err(StoreError::Unsupported {
                key: key.to_string(),
            })
        }
    })
}

/// Resolves the platform config directory for this application.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Netdiag"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("netdiag"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Netdiag")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// A fresh, not-yet-created directory under the system temp dir.
    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("netdiag-prefs-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        // Arrange
        let path = scratch_dir().join("prefs.toml");

        // Act
        let store = TomlFileStore::open(&path).expect("missing file is not an error");

        // Assert
        assert_eq!(store.get("netdiag/General/version"), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_set_builds_nested_tables() {
        let mut store = TomlFileStore::open(scratch_dir().join("p.toml")).expect("open");
        store.set_int("netdiag/Diagram/refresh_period", 800).expect("set");
        assert_eq!(
            store.root["netdiag"]["Diagram"]["refresh_period"].as_integer(),
            Some(800)
        );
    }

    #[test]
    fn test_sync_then_reopen_round_trips_values() {
        // Arrange
        let dir = scratch_dir();
        let path = dir.join("nested").join("prefs.toml");
        let mut store = TomlFileStore::open(&path).expect("open");
        store.set_bool("netdiag/Diagram/cycle", false).expect("set");
        store.set_float("netdiag/Diagram/averaging_time", 2500.0).expect("set");
        store
            .set_vector("netdiag/Diagram/colors", &["#ff0000;WWW".into(), "#00ff00".into()])
            .expect("set");

        // Act
        store.sync().expect("sync");
        let reopened = TomlFileStore::open(&path).expect("reopen");

        // Assert
        assert_eq!(reopened.get("netdiag/Diagram/cycle"), Some(StoredValue::Bool(false)));
        assert_eq!(
            reopened.get("netdiag/Diagram/averaging_time"),
            Some(StoredValue::Float(2500.0))
        );
        assert_eq!(
            reopened.get("netdiag/Diagram/colors"),
            Some(StoredValue::Vector(vec!["#ff0000;WWW".into(), "#00ff00".into()]))
        );
        let names: Vec<_> = fs::read_dir(dir.join("nested"))
            .expect("read dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("prefs.toml")]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_failed_sync_leaves_no_temporary_file() {
        // Arrange: a directory sits where the file should go, so the rename fails
        let dir = scratch_dir();
        let path = dir.join("prefs.toml");
        fs::create_dir_all(&path).expect("create blocking dir");
        let mut store = TomlFileStore::open(dir.join("absent.toml")).expect("open");
        store.path = path.clone();
        store.set_int("netdiag/Diagram/refresh_period", 800).expect("set");

        // Act
        let result = store.sync();

        // Assert
        assert!(matches!(result, Err(StoreError::Io { .. })));
        let names: Vec<_> = fs::read_dir(&dir)
            .expect("read dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("prefs.toml")]);
        assert!(path.is_dir());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_unsynced_writes_do_not_reach_disk() {
        let dir = scratch_dir();
        let path = dir.join("prefs.toml");
        let mut store = TomlFileStore::open(&path).expect("open");
        store.set_string("netdiag/Diagram/filter", "arp").expect("set");
        drop(store);
        assert!(!path.exists());
    }

    #[test]
    fn test_entries_flattens_tables_into_keys() {
        let mut store = TomlFileStore::open(scratch_dir().join("p.toml")).expect("open");
        store.set_int("netdiag/Diagram/size_mode", 2).expect("set");
        store.set_string("netdiag/General/version", "0.9.0").expect("set");

        let entries = store.entries();

        assert!(entries.contains(&("netdiag/Diagram/size_mode".to_string(), StoredValue::Int(2))));
        assert!(entries.contains(&(
            "netdiag/General/version".to_string(),
            StoredValue::Str("0.9.0".into())
        )));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        // Arrange
        let dir = scratch_dir();
        fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("prefs.toml");
        fs::write(&path, "this is = = not toml").expect("write");

        // Act
        let result = TomlFileStore::open(&path);

        // Assert
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_key_through_scalar_is_conflict() {
        let mut store = TomlFileStore::open(scratch_dir().join("p.toml")).expect("open");
        store.set_int("netdiag/General", 1).expect("set");
        assert!(matches!(
            store.set_string("netdiag/General/version", "0.9.0"),
            Err(StoreError::KeyConflict { .. })
        ));
    }

    #[test]
    fn test_overwriting_section_with_scalar_is_conflict() {
        let mut store = TomlFileStore::open(scratch_dir().join("p.toml")).expect("open");
        store.set_int("netdiag/Diagram/size_mode", 1).expect("set");
        assert!(matches!(
            store.set_int("netdiag/Diagram", 1),
            Err(StoreError::KeyConflict { .. })
        ));
    }

    #[test]
    fn test_non_scalar_values_read_as_unsupported() {
        let mut store = TomlFileStore::open(scratch_dir().join("p.toml")).expect("open");
        store.set_int("netdiag/Diagram/size_mode", 1).expect("set");
        assert!(matches!(
            store.get("netdiag/Diagram"),
            Some(StoredValue::Unsupported(_))
        ));
        assert!(store.get_string("netdiag/Diagram", "x").defaulted);
    }

    #[test]
    fn test_unsupported_value_cannot_be_written() {
        let mut store = TomlFileStore::open(scratch_dir().join("p.toml")).expect("open");
        assert!(matches!(
            store.set("k", StoredValue::Unsupported("table".into())),
            Err(StoreError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_mixed_array_reads_as_unsupported() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("prefs.toml");
        fs::write(&path, "[netdiag.Diagram]\ncolors = [\"#ff0000\", 3]\n").expect("write");

        let store = TomlFileStore::open(&path).expect("open");

        assert!(matches!(
            store.get("netdiag/Diagram/colors"),
            Some(StoredValue::Unsupported(_))
        ));
        let _ = fs::remove_dir_all(dir);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_default_path_ends_with_app_file() {
        if let Ok(path) = TomlFileStore::default_path() {
            assert!(path.ends_with("netdiag/prefs.toml"));
        }
    }
}
