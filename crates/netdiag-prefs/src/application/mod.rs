//! Application layer use cases for preference persistence.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (the preference values and color list in `netdiag_core`) and the
//! infrastructure (files on disk, the runtime protocol palette).
//!
//! Use cases in this layer depend on the traits in [`ports`] only, so the
//! storage backend can be swapped without touching them and tests can run
//! entirely in memory.
//!
//! # Sub-modules
//!
//! - **`ports`** – The store and collaborator traits, plus the typed-read
//!   helpers every store gets for free.
//!
//! - **`versioned_store`** – Loads and saves the whole preference set, applies
//!   per-field defaults, and raises the stack-level compatibility warning for
//!   files written by old releases.
//!
//! - **`edit_colors`** – Holds pending color list edits until they are
//!   reconciled into the live preferences.

pub mod edit_colors;
pub mod ports;
pub mod versioned_store;
