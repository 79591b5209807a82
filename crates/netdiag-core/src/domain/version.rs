//! Semantic version parsing and ordering for stored configuration files.
//!
//! Every saved preference file carries the version string of the program that
//! wrote it.  Some stored values changed meaning between releases, so the
//! loader compares that string against a fixed threshold to decide whether a
//! compatibility advisory is due.
//!
//! # Accepted format
//!
//! ```text
//! major.minor.patch[.anything-else]
//! ```
//!
//! The first three dot-separated tokens must be non-negative integers.  Any
//! further tokens are ignored, so `"0.9.1.2"` orders like `"0.9.1"`.  Nothing
//! else is coerced: `"0.9"`, `"0.9.x"` and `" 0.9.1"` are all rejected.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionParseError {
    /// Fewer than three dot-separated tokens were present.
    #[error("version {input:?} has fewer than three components")]
    TooFewComponents { input: String },

    /// One of the first three tokens is not a non-negative integer.
    #[error("version {input:?} has a non-numeric {component} component {token:?}")]
    InvalidComponent {
        input: String,
        component: &'static str,
        token: String,
    },
}

/// A parsed `major.minor.patch` triple.
///
/// Field order matters: the derived `Ord` compares `major`, then `minor`,
/// then `patch`, which is exactly the lexicographic order we need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parses a version string into a [`SemVer`].
///
/// # Errors
///
/// Returns [`VersionParseError::TooFewComponents`] if the string has fewer
/// than three dot-separated tokens, or [`VersionParseError::InvalidComponent`]
/// if any of the first three is not a non-negative integer.
pub fn parse(version: &str) -> Result<SemVer, VersionParseError> {
    let tokens: Vec<&str> = version.split('.').collect();
    if tokens.len() < 3 {
        return Err(VersionParseError::TooFewComponents {
            input: version.to_string(),
        });
    }

    let component = |index: usize, name: &'static str| -> Result<u32, VersionParseError> {
        let token = tokens[index];
        // `u32::from_str` accepts a leading `+`; a version component must be
        // plain digits.
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionParseError::InvalidComponent {
                input: version.to_string(),
                component: name,
                token: token.to_string(),
            });
        }
        token
            .parse::<u32>()
            .map_err(|_| VersionParseError::InvalidComponent {
                input: version.to_string(),
                component: name,
                token: token.to_string(),
            })
    };

    Ok(SemVer {
        major: component(0, "major")?,
        minor: component(1, "minor")?,
        patch: component(2, "patch")?,
    })
}

/// Compares two version strings.
///
/// # Errors
///
/// Propagates the [`VersionParseError`] of whichever input fails to parse
/// first (`a` is checked before `b`).  The caller decides what a failed
/// comparison means; it is never silently treated as equal.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionParseError> {
    let a = parse(a)?;
    let b = parse(b)?;
    Ok(a.cmp(&b))
}
