//! Domain entities for the diagram preference layer.
//!
//! This module contains pure logic with no infrastructure dependencies: no
//! file access, no key/value store, no toolkit.  Everything here can be unit
//! tested in isolation.
//!
//! # Modules
//!
//! - **`version`** – parses and orders `major.minor.patch` strings so the
//!   loader can tell whether a stored file predates a behavioral change.
//! - **`color`** – the 8-bit-per-channel [`color::Rgb24`] type and its
//!   `#rrggbb` text form.
//! - **`colors`** – the ordered color/protocol assignment list and its
//!   persisted string-vector encoding.
//! - **`preferences`** – the [`preferences::PreferenceSet`] record and the
//!   integer-backed enums it uses.

pub mod color;
pub mod colors;
pub mod preferences;
pub mod version;
