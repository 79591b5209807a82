//! Color list editing: a working copy of the color list that the user changes
//! entry by entry and later reconciles into the live preferences.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//! from_preferences ──► insert / remove / set_color / set_protocol ──► reconcile
//!        ▲                         (marks dirty)                         │
//!        └──────────────── reset_from (discard edits) ◄──────────────────┘
//! ```
//!
//! Nothing outside the editor sees an edit until [`ColorListEditor::reconcile`]
//! runs.  Reconciling re-applies the non-empty invariant, replaces the color
//! list in the [`PreferenceSet`], and pushes the new persisted vector to the
//! [`ProtocolColoring`] collaborator exactly once.

use netdiag_core::{ColorAssignment, ColorAssignmentList, NotFound, PreferenceSet, Rgb24};
use tracing::debug;

use super::ports::{ProtocolColoring, ProtocolHistory};

/// Working copy of a color list plus a dirty flag.
#[derive(Debug, Clone)]
pub struct ColorListEditor {
    list: ColorAssignmentList,
    dirty: bool,
}

impl ColorListEditor {
    /// Starts editing a copy of `prefs.colors`.
    pub fn from_preferences(prefs: &PreferenceSet) -> Self {
        Self {
            list: prefs.colors.clone(),
            dirty: false,
        }
    }

    pub fn entries(&self) -> &[ColorAssignment] {
        self.list.entries()
    }

    pub fn list(&self) -> &ColorAssignmentList {
        &self.list
    }

    /// `true` once any edit has succeeded since the last reconcile or reset.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Inserts `entry` before `position` (appends when `None` or past the end).
    pub fn insert(&mut self, position: Option<usize>, entry: ColorAssignment) {
        self.list.insert(position, entry);
        self.dirty = true;
    }

    /// Inserts a catch-all entry for a color picked with 16-bit channels and
    /// returns the 8-bit color actually stored.
    ///
    /// The entry goes before the current `selection`, or at the end when
    /// nothing is selected.
    pub fn add_picked_color(&mut self, selection: Option<usize>, r: u16, g: u16, b: u16) -> Rgb24 {
        let color = Rgb24::from_rgb16(r, g, b);
        self.insert(selection, ColorAssignment::catch_all(color));
        color
    }

    /// Removes the entry at `position`.
    ///
    /// The list may become empty here; the invariant is restored on reconcile.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] and leaves the editor unchanged if `position` is
    /// out of range.
    pub fn remove(&mut self, position: usize) -> Result<ColorAssignment, NotFound> {
        let removed = self.list.remove(position)?;
        self.dirty = true;
        Ok(removed)
    }

    /// Changes the color of the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if `position` is out of range.
    pub fn set_color(&mut self, position: usize, color: Rgb24) -> Result<(), NotFound> {
        self.list.set_color(position, color)?;
        self.dirty = true;
        Ok(())
    }

    /// Renames the protocol of the entry at `position` (upper-cased; empty
    /// means catch-all) and records a non-empty name in `history`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if `position` is out of range; `history` is not
    /// touched in that case.
    pub fn set_protocol(
        &mut self,
        position: usize,
        name: &str,
        history: &mut dyn ProtocolHistory,
    ) -> Result<(), NotFound> {
        self.list.set_protocol(position, name)?;
        self.dirty = true;
        if let Some(stored) = self.list.get(position).and_then(|e| e.protocol.as_deref()) {
            history.record(stored);
        }
        Ok(())
    }

    /// Discards pending edits and starts over from `prefs.colors`.
    pub fn reset_from(&mut self, prefs: &PreferenceSet) {
        self.list = prefs.colors.clone();
        self.dirty = false;
    }

    /// Makes the edited list authoritative.
    ///
    /// Returns `false` and does nothing when there are no pending edits.
    pub fn reconcile(
        &mut self,
        prefs: &mut PreferenceSet,
        coloring: &mut dyn ProtocolColoring,
    ) -> bool {
        if !self.dirty {
            return false;
        }
        if self.list.ensure_non_empty() {
            debug!("color list was emptied, restored fallback entry");
        }
        prefs.colors = self.list.clone();
        coloring.read_pref_vector(&prefs.colors.to_persisted_vector());
        self.dirty = false;
        debug!(entries = prefs.colors.len(), "color edits reconciled");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockProtocolColoring, MockProtocolHistory};

    fn prefs_with(colors: &[&str]) -> PreferenceSet {
        PreferenceSet {
            colors: ColorAssignmentList::from_persisted_vector(
                colors.iter().map(|s| s.to_string()).collect(),
            ),
            ..PreferenceSet::default()
        }
    }

    fn silent_history() -> MockProtocolHistory {
        let mut history = MockProtocolHistory::new();
        history.expect_record().return_const(());
        history
    }

    #[test]
    fn test_new_editor_is_clean_copy() {
        let prefs = prefs_with(&["#ff0000;WWW"]);
        let editor = ColorListEditor::from_preferences(&prefs);
        assert!(!editor.is_dirty());
        assert_eq!(editor.list(), &prefs.colors);
    }

    #[test]
    fn test_edits_are_invisible_until_reconcile() {
        // Arrange
        let mut prefs = prefs_with(&["#ff0000;WWW", "#00ff00"]);
        let mut editor = ColorListEditor::from_preferences(&prefs);

        // Act
        editor.remove(0).expect("position 0 exists");

        // Assert
        assert!(editor.is_dirty());
        assert_eq!(prefs.colors.len(), 2);

        let mut coloring = MockProtocolColoring::new();
        coloring.expect_read_pref_vector().times(1).return_const(());
        assert!(editor.reconcile(&mut prefs, &mut coloring));
        assert_eq!(prefs.colors.len(), 1);
    }

    #[test]
    fn test_add_picked_color_truncates_and_inserts_before_selection() {
        // Arrange
        let mut editor = ColorListEditor::from_preferences(&prefs_with(&["#ff0000", "#00ff00"]));

        // Act
        let stored = editor.add_picked_color(Some(1), 0x1234, 0xabcd, 0xff00);

        // Assert
        assert_eq!(stored, Rgb24::new(0x12, 0xab, 0xff));
        assert_eq!(editor.entries()[1], ColorAssignment::catch_all(stored));
        assert_eq!(editor.entries().len(), 3);
    }

    #[test]
    fn test_add_picked_color_without_selection_appends() {
        let mut editor = ColorListEditor::from_preferences(&prefs_with(&["#ff0000"]));
        editor.add_picked_color(None, 0, 0, 0);
        assert_eq!(editor.entries().last().map(|e| e.color), Some(Rgb24::new(0, 0, 0)));
    }

    #[test]
    fn test_set_protocol_upper_cases_and_records_history() {
        // Arrange
        let mut editor = ColorListEditor::from_preferences(&prefs_with(&["#ff0000"]));
        let mut history = MockProtocolHistory::new();
        history
            .expect_record()
            .withf(|name: &str| name == "HTTP")
            .times(1)
            .return_const(());

        // Act
        editor
            .set_protocol(0, "http", &mut history)
            .expect("position 0 exists");

        // Assert
        assert_eq!(editor.entries()[0].protocol.as_deref(), Some("HTTP"));
    }

    #[test]
    fn test_set_protocol_to_empty_is_catch_all_and_not_recorded() {
        let mut editor = ColorListEditor::from_preferences(&prefs_with(&["#ff0000;WWW"]));
        let mut history = MockProtocolHistory::new();
        history.expect_record().times(0);

        editor.set_protocol(0, "", &mut history).expect("position 0 exists");

        assert_eq!(editor.entries()[0].protocol, None);
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_out_of_range_edit_is_not_found_and_keeps_editor_clean() {
        // Arrange
        let mut editor = ColorListEditor::from_preferences(&prefs_with(&["#ff0000"]));
        let mut history = MockProtocolHistory::new();
        history.expect_record().times(0);

        // Act / Assert
        assert_eq!(editor.remove(5), Err(NotFound { position: 5, len: 1 }));
        assert!(editor.set_color(1, Rgb24::new(1, 2, 3)).is_err());
        assert!(editor.set_protocol(3, "ARP", &mut history).is_err());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_reconcile_of_emptied_list_restores_fallback() {
        // Arrange
        let mut prefs = prefs_with(&["#ff0000"]);
        let mut editor = ColorListEditor::from_preferences(&prefs);
        editor.remove(0).expect("position 0 exists");
        let mut coloring = MockProtocolColoring::new();
        coloring
            .expect_read_pref_vector()
            .withf(|colors: &[String]| colors == ["#7f7f7f"])
            .times(1)
            .return_const(());

        // Act
        editor.reconcile(&mut prefs, &mut coloring);

        // Assert
        assert_eq!(prefs.colors.entries(), &[ColorAssignment::fallback()]);
    }

    #[test]
    fn test_reconcile_without_edits_does_not_notify() {
        let mut prefs = prefs_with(&["#ff0000"]);
        let mut editor = ColorListEditor::from_preferences(&prefs);
        let mut coloring = MockProtocolColoring::new();
        coloring.expect_read_pref_vector().times(0);

        assert!(!editor.reconcile(&mut prefs, &mut coloring));
    }

    #[test]
    fn test_reconcile_forwards_edited_vector_and_clears_dirty() {
        // Arrange
        let mut prefs = prefs_with(&["#ff0000;WWW"]);
        let mut editor = ColorListEditor::from_preferences(&prefs);
        editor.insert(None, ColorAssignment::new(Rgb24::new(0, 0, 0xff), Some("ARP")));
        editor
            .set_color(0, Rgb24::new(0x10, 0x20, 0x30))
            .expect("position 0 exists");
        let mut coloring = MockProtocolColoring::new();
        coloring
            .expect_read_pref_vector()
            .withf(|colors: &[String]| colors == ["#102030;WWW", "#0000ff;ARP"])
            .times(1)
            .return_const(());

        // Act
        let changed = editor.reconcile(&mut prefs, &mut coloring);

        // Assert
        assert!(changed);
        assert!(!editor.is_dirty());
        assert_eq!(prefs.colors.len(), 2);
    }

    #[test]
    fn test_reset_from_discards_pending_edits() {
        let prefs = prefs_with(&["#ff0000", "#00ff00"]);
        let mut editor = ColorListEditor::from_preferences(&prefs);
        editor.remove(1).expect("position 1 exists");
        editor
            .set_protocol(0, "dns", &mut silent_history())
            .expect("position 0 exists");

        editor.reset_from(&prefs);

        assert!(!editor.is_dirty());
        assert_eq!(editor.list(), &prefs.colors);
    }
}
