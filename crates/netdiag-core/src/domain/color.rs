//! 24-bit RGB colors as stored in preference files.
//!
//! Preference files only ever hold 8 bits per channel, written as `#rrggbb`.
//! Color pickers and older files may carry wider channels (12 or 16 bits);
//! those are truncated to their most significant 8 bits so that what is shown
//! is exactly what will be saved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error returned when a color string is not a recognised hex color.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color {0:?} does not start with '#'")]
    MissingHash(String),
    #[error("color {0:?} must have 3, 6, 9 or 12 hex digits")]
    BadLength(String),
    #[error("color {0:?} contains a non-hex digit")]
    BadDigit(String),
}

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb24 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb24 {
    /// Neutral gray used when a color list would otherwise be empty.
    pub const FALLBACK_GRAY: Rgb24 = Rgb24::new(0x7f, 0x7f, 0x7f);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from 16-bit channels (as produced by toolkit color
    /// pickers), keeping only the high byte of each.
    pub const fn from_rgb16(r: u16, g: u16, b: u16) -> Self {
        Self {
            r: (r >> 8) as u8,
            g: (g >> 8) as u8,
            b: (b >> 8) as u8,
        }
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrrgggbbb` or `#rrrrggggbbbb`.
    ///
    /// Single-digit channels are widened (`#f80` == `#ff8800`); wider channels
    /// are truncated to 8 bits.
    ///
    /// # Errors
    ///
    /// Returns a [`ColorParseError`] describing the first problem found.
    pub fn parse_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }

        let width = match digits.len() {
            3 => 1,
            6 => 2,
            9 => 3,
            12 => 4,
            _ => return Err(ColorParseError::BadLength(s.to_string())),
        };

        let channel = |index: usize| -> Result<u8, ColorParseError> {
            let text = &digits[index * width..(index + 1) * width];
            let raw = u16::from_str_radix(text, 16)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))?;
            Ok(match width {
                1 => (raw as u8) * 0x11,
                2 => raw as u8,
                3 => (raw >> 4) as u8,
                _ => (raw >> 8) as u8,
            })
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(1)?,
            b: channel(2)?,
        })
    }
}

impl fmt::Display for Rgb24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb24 {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

// Serialized in its canonical text form so JSON/TOML output stays readable.
impl Serialize for Rgb24 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb24 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digit_color() {
        assert_eq!(Rgb24::parse_hex("#ff7700"), Ok(Rgb24::new(0xff, 0x77, 0x00)));
    }

    #[test]
    fn test_parse_accepts_upper_case_digits() {
        assert_eq!(Rgb24::parse_hex("#AaBbCc"), Ok(Rgb24::new(0xaa, 0xbb, 0xcc)));
    }

    #[test]
    fn test_parse_short_form_widens_channels() {
        assert_eq!(Rgb24::parse_hex("#f80"), Ok(Rgb24::new(0xff, 0x88, 0x00)));
    }

    #[test]
    fn test_parse_sixteen_bit_form_truncates_to_high_byte() {
        // Arrange: 16-bit channels whose low bytes must be discarded
        let text = "#12ff34ee56dd";

        // Act
        let color = Rgb24::parse_hex(text).expect("12-digit form is valid");

        // Assert
        assert_eq!(color, Rgb24::new(0x12, 0x34, 0x56));
    }

    #[test]
    fn test_parse_twelve_bit_form_truncates() {
        assert_eq!(Rgb24::parse_hex("#abcdef123"), Ok(Rgb24::new(0xab, 0xde, 0x12)));
    }

    #[test]
    fn test_parse_rejects_missing_hash() {
        assert!(matches!(
            Rgb24::parse_hex("ff0000"),
            Err(ColorParseError::MissingHash(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_length_and_digits() {
        assert!(matches!(
            Rgb24::parse_hex("#ff00"),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            Rgb24::parse_hex("#gg0000"),
            Err(ColorParseError::BadDigit(_))
        ));
        assert!(Rgb24::parse_hex("").is_err());
    }

    #[test]
    fn test_display_is_lower_case_six_digits() {
        assert_eq!(Rgb24::new(0xAB, 0x01, 0xFF).to_string(), "#ab01ff");
    }

    #[test]
    fn test_from_rgb16_keeps_high_byte() {
        assert_eq!(
            Rgb24::from_rgb16(0xff80, 0x00ff, 0x7f7f),
            Rgb24::new(0xff, 0x00, 0x7f)
        );
    }
}
