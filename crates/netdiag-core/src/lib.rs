//! # netdiag-core
//!
//! Shared library for the network diagram's preference layer: the typed
//! preference record, the color/protocol assignment list, and the version
//! comparator used to gate migration advisories.
//!
//! It has zero dependencies on toolkits, storage backends, or the capture
//! engine.  Loading and saving live in `netdiag-prefs`, which talks to storage
//! through port traits and hands this crate plain values.
//!
//! # Architecture overview (for beginners)
//!
//! The diagram draws one node per host and one link per conversation, colored
//! by protocol.  Users tune how long idle nodes linger, how big nodes are
//! drawn, which protocol gets which color, and so on.  Those tunables must
//! survive restarts and upgrades.
//!
//! This crate defines *what* is stored:
//!
//! - **`domain::preferences`** – the [`PreferenceSet`] with documented defaults.
//! - **`domain::colors`** – the [`ColorAssignmentList`], an ordered list where
//!   the first matching entry decides a protocol's color.
//! - **`domain::version`** – [`SemVer`] parsing and comparison.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `netdiag_core::PreferenceSet` instead of the full module path.
pub use domain::color::{ColorParseError, Rgb24};
pub use domain::colors::{ColorAssignment, ColorAssignmentList, NotFound, DEFAULT_COLOR_VECTOR};
pub use domain::preferences::{
    defaults, CaptureMode, InvalidVariant, NodeSizeMetric, PreferenceSet, SizeMode, StackLevel,
};
pub use domain::version::{SemVer, VersionParseError};
