//! Target color parsing, HSV conversion and color description
//!
//! Parsing never fails the pipeline: a missing or malformed color string
//! resolves to [`TargetColor::DEFAULT`] with a warning.

pub mod analysis;
pub mod hsv;

pub use analysis::{describe, sample_color, ColorDescription, ColorFamily, SampleMethod};
pub use hsv::Hsv;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// An RGB color applied to garment pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TargetColor {
    /// Neutral gray used when no usable color is supplied
    pub const DEFAULT: Self = Self::new(168, 168, 168);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array
    #[must_use]
    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Parse `#RRGGBB` or any `rgb(r, g, b)`-style text
    ///
    /// The textual form is recognised when the string contains `rgb`
    /// (any case) or `(`; its first three integer runs are the channels.
    /// Returns `None` for anything else, including channel values above 255.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(hex);
        }
        if input.to_ascii_lowercase().contains("rgb") || input.contains('(') {
            return parse_rgb_text(input);
        }
        None
    }

    /// Parse an optional color string, falling back to [`TargetColor::DEFAULT`]
    #[must_use]
    pub fn parse_or_default(input: Option<&str>) -> Self {
        match input {
            None => Self::DEFAULT,
            Some(text) => Self::parse(text).unwrap_or_else(|| {
                warn!(color = text, "Unrecognised color, using default gray");
                Self::DEFAULT
            }),
        }
    }

    /// Hex string, `#RRGGBB`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// HSV form of this color
    #[must_use]
    pub fn to_hsv(self) -> Hsv {
        Hsv::from_rgb(self.r, self.g, self.b)
    }

    /// Full color description (hex, Lab, family)
    #[must_use]
    pub fn describe(self) -> ColorDescription {
        describe(self)
    }
}

impl Default for TargetColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for TargetColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for TargetColor {
    type Err = crate::error::ColorizeError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s).ok_or_else(|| {
            crate::error::ColorizeError::invalid_config(format!(
                "Unrecognised color '{}' (expected #RRGGBB or rgb(r, g, b))",
                s
            ))
        })
    }
}

fn parse_hex(hex: &str) -> Option<TargetColor> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    Some(TargetColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn parse_rgb_text(text: &str) -> Option<TargetColor> {
    let mut numbers = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.parse::<u8>().ok());

    let r = numbers.next()??;
    let g = numbers.next()??;
    let b = numbers.next()??;
    Some(TargetColor::new(r, g, b))
}
