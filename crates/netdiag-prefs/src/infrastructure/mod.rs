//! Infrastructure layer for preference persistence.
//!
//! Contains the concrete adapters behind the application ports: key/value
//! stores (a TOML file, an in-memory map) and the runtime collaborators that
//! consume color and protocol edits.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `netdiag_core`, but MUST NOT be imported by the `application` or domain
//! layers (tests excepted).

pub mod collaborators;
pub mod storage;
