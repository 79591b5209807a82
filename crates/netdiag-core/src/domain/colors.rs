//! The ordered color/protocol assignment list.
//!
//! Each entry pairs a display color with either a protocol name or nothing.
//! Entries with a protocol name pin that protocol to a color; entries without
//! one form the catch-all pool used for everything else.
//!
//! # Persisted encoding
//!
//! The list is stored as a flat vector of strings under a single key:
//!
//! ```text
//! ["#ff0000;WWW", "#0000ff;DOMAIN", "#00ff00", "#ffff00"]
//! ```
//!
//! An entry is `#rrggbb` on its own (catch-all) or `#rrggbb;PROTOCOL`.  Only
//! the first `;` separates color from protocol.
//!
//! # Invariant
//!
//! The list is never empty once it has been loaded or persisted.  Empty input,
//! or input whose first entry has no color, collapses to a single gray
//! catch-all entry.  Editing may empty the list transiently; every encode
//! re-applies the invariant first.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::color::Rgb24;

/// Persisted form of the built-in color list.
pub const DEFAULT_COLOR_VECTOR: [&str; 12] = [
    "#ff0000;WWW",
    "#0000ff;DOMAIN",
    "#00ff00",
    "#ffff00",
    "#ff00ff",
    "#00ffff",
    "#ffffff",
    "#ff7700",
    "#ff0077",
    "#ffaa77",
    "#7777ff",
    "#aaaa33",
];

/// Error returned when an edit refers to a position that does not exist.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("no color assignment at position {position} (list has {len} entries)")]
pub struct NotFound {
    pub position: usize,
    pub len: usize,
}

/// One color/protocol pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorAssignment {
    pub color: Rgb24,
    /// `None` marks the catch-all bucket.
    pub protocol: Option<String>,
}

impl ColorAssignment {
    /// Creates an entry, treating an empty protocol name as the catch-all.
    pub fn new(color: Rgb24, protocol: Option<&str>) -> Self {
        Self {
            color,
            protocol: protocol.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    /// Creates a catch-all entry.
    pub fn catch_all(color: Rgb24) -> Self {
        Self {
            color,
            protocol: None,
        }
    }

    /// The entry that replaces an empty list.
    pub fn fallback() -> Self {
        Self::catch_all(Rgb24::FALLBACK_GRAY)
    }

    fn encode(&self) -> String {
        match &self.protocol {
            Some(protocol) => format!("{};{}", self.color, protocol),
            None => self.color.to_string(),
        }
    }
}

/// Ordered color assignments; earlier entries take priority.
///
/// Not `Deserialize`; build it with [`new`](Self::new) or
/// [`from_persisted_vector`](Self::from_persisted_vector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColorAssignmentList {
    entries: Vec<ColorAssignment>,
}

impl Default for ColorAssignmentList {
    /// The built-in list: red for WWW, blue for DOMAIN, ten catch-all colors.
    fn default() -> Self {
        Self::from_persisted_vector(DEFAULT_COLOR_VECTOR.iter().map(|s| s.to_string()).collect())
    }
}

impl ColorAssignmentList {
    /// Builds a list from entries, applying the non-emptiness invariant.
    pub fn new(entries: Vec<ColorAssignment>) -> Self {
        let mut list = Self { entries };
        list.ensure_non_empty();
        list
    }

    /// Decodes the persisted string vector.
    ///
    /// Entries after the first whose color cannot be parsed are dropped with a
    /// warning.  If nothing usable remains, or the first entry has no color,
    /// the list becomes the single fallback entry.
    pub fn from_persisted_vector(raw: Vec<String>) -> Self {
        let first_color_empty = raw
            .first()
            .map_or(true, |first| first.split(';').next().unwrap_or("").is_empty());
        if first_color_empty {
            return Self::new(Vec::new());
        }

        let mut entries = Vec::with_capacity(raw.len());
        for (index, item) in raw.iter().enumerate() {
            let (color_text, protocol) = match item.split_once(';') {
                Some((color, protocol)) => (color, Some(protocol)),
                None => (item.as_str(), None),
            };
            match Rgb24::parse_hex(color_text) {
                Ok(color) => entries.push(ColorAssignment::new(color, protocol)),
                Err(e) => warn!(index, entry = %item, error = %e, "dropping unparsable color entry"),
            }
        }
        Self::new(entries)
    }

    /// Encodes the list as the persisted string vector.
    ///
    /// An empty list encodes as the single fallback entry.
    pub fn to_persisted_vector(&self) -> Vec<String> {
        if self.entries.is_empty() {
            return vec![ColorAssignment::fallback().encode()];
        }
        self.entries.iter().map(ColorAssignment::encode).collect()
    }

    /// Resets an empty list to the single fallback entry.
    ///
    /// Returns `true` if the list was changed.
    pub fn ensure_non_empty(&mut self) -> bool {
        if self.entries.is_empty() {
            self.entries.push(ColorAssignment::fallback());
            true
        } else {
            false
        }
    }

    /// Inserts `entry` before `position`, or appends when `position` is
    /// `None` or past the end.
    ///
    /// Duplicate colors and protocol names are allowed.
    pub fn insert(&mut self, position: Option<usize>, entry: ColorAssignment) {
        match position {
            Some(index) if index < self.entries.len() => self.entries.insert(index, entry),
            _ => self.entries.push(entry),
        }
    }

    /// Removes and returns the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] without touching the list if `position` is out of
    /// range.
    pub fn remove(&mut self, position: usize) -> Result<ColorAssignment, NotFound> {
        self.check(position)?;
        Ok(self.entries.remove(position))
    }

    /// Replaces the protocol of the entry at `position` with the upper-cased
    /// `name`.  An empty name turns the entry into a catch-all.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if `position` is out of range.
    pub fn set_protocol(&mut self, position: usize, name: &str) -> Result<(), NotFound> {
        self.check(position)?;
        let normalized = name.to_uppercase();
        self.entries[position].protocol = if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        };
        Ok(())
    }

    /// Replaces the color of the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if `position` is out of range.
    pub fn set_color(&mut self, position: usize, color: Rgb24) -> Result<(), NotFound> {
        self.check(position)?;
        self.entries[position].color = color;
        Ok(())
    }

    pub fn get(&self, position: usize) -> Option<&ColorAssignment> {
        self.entries.get(position)
    }

    pub fn entries(&self) -> &[ColorAssignment] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColorAssignment> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, position: usize) -> Result<(), NotFound> {
        if position < self.entries.len() {
            Ok(())
        } else {
            Err(NotFound {
                position,
                len: self.entries.len(),
            })
        }
    }
}

impl<'a> IntoIterator for &'a ColorAssignmentList {
    type Item = &'a ColorAssignment;
    type IntoIter = std::slice::Iter<'a, ColorAssignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
