//! Configuration types for sketch colorization

use crate::error::{ColorizeError, Result};
use crate::utils::NumericValidator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG, lossless
    #[default]
    Png,
    /// JPEG with configurable quality
    Jpeg,
    /// WebP (lossless encoder)
    WebP,
    /// TIFF, lossless
    Tiff,
}

impl OutputFormat {
    /// File extension for this format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Threshold separating line pixels from paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineThreshold {
    /// Pixels with intensity strictly below this value are lines
    Fixed(u8),
    /// Threshold chosen per image with Otsu's method
    Otsu,
}

impl Default for LineThreshold {
    fn default() -> Self {
        Self::Fixed(100)
    }
}

impl FromStr for LineThreshold {
    type Err = ColorizeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("otsu") {
            return Ok(Self::Otsu);
        }
        trimmed.parse::<u8>().map(Self::Fixed).map_err(|_| {
            ColorizeError::invalid_config(format!(
                "Line threshold must be 0-255 or 'otsu', got '{}'",
                s
            ))
        })
    }
}

impl std::fmt::Display for LineThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "{}", value),
            Self::Otsu => write!(f, "otsu"),
        }
    }
}

/// Pixel adjacency used for every connected-component pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge-sharing neighbours only
    #[default]
    Four,
    /// Edge and corner neighbours
    Eight,
}

/// How the target color is combined with the sketch's shading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// `round(target · (0.6 + 0.4 · gray / 255))` per channel
    #[default]
    Shaded,
    /// Replace hue and saturation in HSV, keep the pixel's value channel
    HueSaturation,
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shaded => write!(f, "shaded"),
            Self::HueSaturation => write!(f, "hue-saturation"),
        }
    }
}

/// Mask operation backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingBackend {
    /// Accelerated when compiled in, basic otherwise
    #[default]
    Auto,
    /// imageproc-backed morphology and labelling
    Accelerated,
    /// Pure ndarray implementation, always available
    Basic,
}

impl std::fmt::Display for ProcessingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Accelerated => write!(f, "accelerated"),
            Self::Basic => write!(f, "basic"),
        }
    }
}

/// HSV box classifying skin-tone pixels
///
/// Hue in degrees; saturation and value on the 0-255 byte scale. The hue
/// test wraps around red: `hue <= hue_low_max || hue >= hue_high_min`.
/// Saturation and value bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinToneRange {
    pub hue_low_max: f32,
    pub hue_high_min: f32,
    pub saturation_min: f32,
    pub saturation_max: f32,
    pub value_min: f32,
    pub value_max: f32,
}

impl Default for SkinToneRange {
    fn default() -> Self {
        Self {
            hue_low_max: 20.0,
            hue_high_min: 330.0,
            saturation_min: 15.0,
            saturation_max: 170.0,
            value_min: 80.0,
            value_max: 250.0,
        }
    }
}

impl SkinToneRange {
    /// Whether an HSV triple (hue degrees, sat/val bytes) is skin-toned
    #[must_use]
    pub fn contains(&self, hue: f32, saturation: f32, value: f32) -> bool {
        (hue <= self.hue_low_max || hue >= self.hue_high_min)
            && saturation > self.saturation_min
            && saturation < self.saturation_max
            && value > self.value_min
            && value < self.value_max
    }

    fn validate(&self) -> Result<()> {
        NumericValidator::validate_range(self.hue_low_max, 0.0, 360.0, "Skin hue lower band")?;
        NumericValidator::validate_range(self.hue_high_min, 0.0, 360.0, "Skin hue upper band")?;
        NumericValidator::validate_ordered(self.saturation_min, self.saturation_max, "Skin saturation")?;
        NumericValidator::validate_ordered(self.value_min, self.value_max, "Skin value")?;
        Ok(())
    }
}

/// Rectangle cleared from the mask for full-body garments
///
/// All fields are fractions of the image size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnatomicalZone {
    /// Zone width, centered horizontally
    pub width_fraction: f64,
    /// Top edge of the zone
    pub y_start_fraction: f64,
    /// Zone height
    pub height_fraction: f64,
}

impl Default for AnatomicalZone {
    fn default() -> Self {
        Self {
            width_fraction: 0.15,
            y_start_fraction: 0.65,
            height_fraction: 0.2,
        }
    }
}

impl AnatomicalZone {
    /// Pixel rectangle `(x0, y0, x1, y1)`, half-open and clamped to the image
    #[must_use]
    pub fn rect(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let zone_width = (f64::from(width) * self.width_fraction) as u32;
        let center = width / 2;
        // Both halves truncate, so an odd zone width comes out one pixel narrower
        let x0 = center.saturating_sub(zone_width / 2);
        let x1 = (center + zone_width / 2).min(width);
        let y0 = ((f64::from(height) * self.y_start_fraction) as u32).min(height);
        let y1 = (y0 + (f64::from(height) * self.height_fraction) as u32).min(height);
        (x0, y0, x1, y1)
    }

    fn validate(&self) -> Result<()> {
        for (value, name) in [
            (self.width_fraction, "Anatomical zone width"),
            (self.y_start_fraction, "Anatomical zone start"),
            (self.height_fraction, "Anatomical zone height"),
        ] {
            if !value.is_finite() {
                return Err(ColorizeError::invalid_config(format!("{} must be finite", name)));
            }
            NumericValidator::validate_range(value, 0.0, 1.0, name)?;
        }
        Ok(())
    }
}

/// Configuration for the colorization pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorizationConfig {
    /// Every channel must exceed this for a pixel to count as paper
    pub white_threshold: u8,

    /// Maximum pairwise channel difference for a white pixel
    pub color_variance: u8,

    /// Skin dilation strength (0.0-1.0)
    pub skin_protection: f32,

    /// Regions must be strictly larger than this many pixels
    pub min_area: usize,

    pub line_threshold: LineThreshold,

    pub connectivity: Connectivity,

    pub blend_mode: BlendMode,

    pub backend: ProcessingBackend,

    pub skin_tone: SkinToneRange,

    pub anatomical_zone: AnatomicalZone,

    /// Use the garment category's palette color when no target color is given
    pub use_category_color: bool,

    /// Downscale sketches whose longer side exceeds this
    pub max_dimension: Option<u32>,

    /// Output format
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// Enable debug mode (per-stage pixel counts at debug level)
    pub debug: bool,
}

impl Default for ColorizationConfig {
    fn default() -> Self {
        Self {
            white_threshold: 245,
            color_variance: 30,
            skin_protection: 0.3,
            min_area: 500,
            line_threshold: LineThreshold::default(),
            connectivity: Connectivity::default(),
            blend_mode: BlendMode::default(),
            backend: ProcessingBackend::default(),
            skin_tone: SkinToneRange::default(),
            anatomical_zone: AnatomicalZone::default(),
            use_category_color: false,
            max_dimension: None,
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
            debug: false,
        }
    }
}

impl ColorizationConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use garment_colorize::{BlendMode, ColorizationConfig};
    ///
    /// let config = ColorizationConfig::builder()
    ///     .skin_protection(0.5)
    ///     .blend_mode(BlendMode::HueSaturation)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.min_area, 500);
    /// ```
    #[must_use]
    pub fn builder() -> ColorizationConfigBuilder {
        ColorizationConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - `skin_protection` not finite or outside 0.0-1.0
    /// - JPEG quality above 100
    /// - `max_dimension` of zero
    /// - Empty skin-tone saturation/value intervals
    /// - Anatomical zone fractions outside 0.0-1.0
    ///
    /// ```rust
    /// use garment_colorize::ColorizationConfig;
    ///
    /// let mut config = ColorizationConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.skin_protection = 1.5;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !self.skin_protection.is_finite() || !(0.0..=1.0).contains(&self.skin_protection) {
            return Err(ColorizeError::config_value_error(
                "skin protection",
                self.skin_protection,
                "0.0-1.0",
                Some(0.3),
            ));
        }

        if self.jpeg_quality > 100 {
            return Err(ColorizeError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(90),
            ));
        }

        if let Some(max_dimension) = self.max_dimension {
            NumericValidator::validate_positive(max_dimension, "Max dimension")?;
        }

        self.skin_tone.validate()?;
        self.anatomical_zone.validate()?;

        Ok(())
    }

    /// Skin dilation kernel size and iteration count derived from `skin_protection`
    #[must_use]
    pub fn skin_dilation(&self) -> (u32, u32) {
        let kernel = ((5.0 * self.skin_protection).round() as u32).max(3);
        let iterations = ((2.0 * self.skin_protection).round() as u32).max(1);
        (kernel, iterations)
    }
}

/// Builder for `ColorizationConfig`
#[derive(Debug, Default)]
pub struct ColorizationConfigBuilder {
    config: ColorizationConfig,
}

impl ColorizationConfigBuilder {
    #[must_use]
    pub fn white_threshold(mut self, threshold: u8) -> Self {
        self.config.white_threshold = threshold;
        self
    }

    #[must_use]
    pub fn color_variance(mut self, variance: u8) -> Self {
        self.config.color_variance = variance;
        self
    }

    /// Set skin protection; out-of-range values are rejected by `build()`
    #[must_use]
    pub fn skin_protection(mut self, protection: f32) -> Self {
        self.config.skin_protection = protection;
        self
    }

    #[must_use]
    pub fn min_area(mut self, min_area: usize) -> Self {
        self.config.min_area = min_area;
        self
    }

    #[must_use]
    pub fn line_threshold(mut self, threshold: LineThreshold) -> Self {
        self.config.line_threshold = threshold;
        self
    }

    #[must_use]
    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.config.connectivity = connectivity;
        self
    }

    #[must_use]
    pub fn blend_mode(mut self, mode: BlendMode) -> Self {
        self.config.blend_mode = mode;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: ProcessingBackend) -> Self {
        self.config.backend = backend;
        self
    }

    #[must_use]
    pub fn skin_tone(mut self, range: SkinToneRange) -> Self {
        self.config.skin_tone = range;
        self
    }

    #[must_use]
    pub fn anatomical_zone(mut self, zone: AnatomicalZone) -> Self {
        self.config.anatomical_zone = zone;
        self
    }

    #[must_use]
    pub fn use_category_color(mut self, enabled: bool) -> Self {
        self.config.use_category_color = enabled;
        self
    }

    #[must_use]
    pub fn max_dimension(mut self, max_dimension: Option<u32>) -> Self {
        self.config.max_dimension = max_dimension;
        self
    }

    /// Set output format
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Set JPEG quality (clamped to 100)
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// Any rule checked by [`ColorizationConfig::validate`]
    pub fn build(self) -> Result<ColorizationConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

/// Per-call inputs, typically supplied by upstream classifiers or a caller
///
/// Colors are kept as raw strings; unparseable values fall back to the
/// default gray when the pipeline runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorizationRequest {
    /// `#RRGGBB` or `rgb(r, g, b)`
    pub target_color: Option<String>,
    /// Element name (`main`, `straps`, `collar`, `trim`) to color string
    pub element_colors: BTreeMap<String, String>,
    /// Free-text garment category, e.g. `"corset bodysuit"`
    pub garment_category: Option<String>,
}

impl ColorizationRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_target_color<S: Into<String>>(mut self, color: S) -> Self {
        self.target_color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_element_color<N: Into<String>, C: Into<String>>(mut self, element: N, color: C) -> Self {
        self.element_colors.insert(element.into(), color.into());
        self
    }

    #[must_use]
    pub fn with_garment_category<S: Into<String>>(mut self, category: S) -> Self {
        self.garment_category = Some(category.into());
        self
    }
}
