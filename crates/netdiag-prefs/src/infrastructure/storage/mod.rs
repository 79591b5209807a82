//! Storage infrastructure: [`KeyValueStore`](crate::application::ports::KeyValueStore)
//! adapters.
//!
//! - `toml_file` keeps the store in a TOML file in the platform config
//!   directory, one table per key segment.  Writes are buffered in memory
//!   and reach the disk on `sync`.
//! - `memory` keeps everything in a map and records what each `sync` made
//!   durable.  Used by tests and by `--ephemeral` CLI runs.

pub mod memory;
pub mod toml_file;
