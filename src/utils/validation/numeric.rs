//! Numeric validation utilities
//!
//! Range checks for tunables and overflow-safe size arithmetic used
//! before allocating per-pixel buffers.

use crate::error::{ColorizeError, Result};

/// Validator for numeric parameters and conversions
pub struct NumericValidator;

impl NumericValidator {
    /// Validate a fraction in `[0.0, 1.0]`
    pub fn validate_fraction(value: f32, name: &str) -> Result<f32> {
        if !value.is_finite() {
            return Err(ColorizeError::invalid_config(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }

        if !(0.0..=1.0).contains(&value) {
            return Err(ColorizeError::invalid_config(format!(
                "{} must be between 0.0 and 1.0, got {}",
                name, value
            )));
        }

        Ok(value)
    }

    /// Validate quality setting (0-100)
    pub fn validate_quality(value: u8) -> Result<u8> {
        if value > 100 {
            return Err(ColorizeError::invalid_config(format!(
                "Quality must be between 0 and 100, got {}",
                value
            )));
        }
        Ok(value)
    }

    /// Validate numeric range (inclusive)
    pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(ColorizeError::invalid_config(format!(
                "{} must be between {} and {}, got {}",
                name, min, max, value
            )));
        }
        Ok(value)
    }

    /// Validate that a value is positive
    pub fn validate_positive<T>(value: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy + Default,
    {
        if value <= T::default() {
            return Err(ColorizeError::invalid_config(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
        Ok(value)
    }

    /// Validate that `low < high` for an open interval
    pub fn validate_ordered<T>(low: T, high: T, name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if low >= high {
            return Err(ColorizeError::invalid_config(format!(
                "{} lower bound {} must be below upper bound {}",
                name, low, high
            )));
        }
        Ok(())
    }

    /// Pixel count of a `width × height` image, checking for overflow
    pub fn pixel_count(width: u32, height: u32) -> Result<usize> {
        (width as usize).checked_mul(height as usize).ok_or_else(|| {
            ColorizeError::invalid_image(format!(
                "Image dimensions overflow: {} x {}",
                width, height
            ))
        })
    }

    /// Reject zero-sized images
    pub fn validate_dimensions(width: u32, height: u32) -> Result<(u32, u32)> {
        if width == 0 || height == 0 {
            return Err(ColorizeError::invalid_image(format!(
                "Image has zero size: {}x{}",
                width, height
            )));
        }
        Self::pixel_count(width, height)?;
        Ok((width, height))
    }

    /// Round half away from zero and clamp to the byte range
    #[must_use]
    pub fn round_to_u8(value: f32) -> u8 {
        if value.is_nan() {
            return 0;
        }
        value.round().clamp(0.0, 255.0) as u8
    }
}
