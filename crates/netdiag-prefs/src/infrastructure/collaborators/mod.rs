//! Adapters for the collaborator ports.
//!
//! - `palette` – [`ProtocolPalette`](palette::ProtocolPalette) resolves
//!   protocol names to colors from the persisted color vector.
//! - `history` – [`RecentProtocols`](history::RecentProtocols) remembers the
//!   protocol names most recently typed into the color list.

pub mod history;
pub mod palette;
