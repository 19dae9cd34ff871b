#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Garment Sketch Colorization Library
//!
//! Colors the garment in a line-art fashion sketch while leaving paper,
//! line work and skin untouched. Garment pixels are found as white regions
//! enclosed by ink lines; shading from the sketch is kept in the result.
//!
//! ## Features
//!
//! - **Line-enclosed segmentation**: fixed or Otsu line threshold, 4- or 8-connected labelling
//! - **Skin protection**: HSV skin-tone mask with configurable dilation
//! - **Category awareness**: crotch-seam exclusion for bodysuits and corsets
//! - **Per-element colors**: separate colors for straps, collar, trim and main body
//! - **Backends**: pure ndarray morphology, or imageproc with the `accelerated` feature
//! - **CLI Integration**: batch command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use garment_colorize::{colorize_sketch, ColorizationConfig, ColorizationRequest};
//!
//! # fn example() -> anyhow::Result<()> {
//! let sketch = image::open("sketch.png")?;
//! let request = ColorizationRequest::new()
//!     .with_target_color("#8B0000")
//!     .with_element_color("straps", "#000000")
//!     .with_garment_category("corset bodysuit");
//!
//! let result = colorize_sketch(&sketch, &request, &ColorizationConfig::default())?;
//! println!("{} pixels recolored ({}%)", result.pixel_count, result.coverage_percent);
//! result.save("colorized.png", garment_colorize::OutputFormat::Png, 90)?;
//! # Ok(())
//! # }
//! ```
//!
//! Build [`SketchColorizer`] once and reuse it when processing many sketches;
//! backend resolution happens at construction.

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod garment;
pub mod processor;
pub mod recolor;
pub mod segmentation;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

use image::DynamicImage;

// Public API exports
pub use backends::{accelerated_available, create_backend, resolve_backend, BasicBackend, MaskBackend};
#[cfg(feature = "accelerated")]
pub use backends::AcceleratedBackend;
pub use color::{sample_color, ColorDescription, ColorFamily, Hsv, SampleMethod, TargetColor};
pub use config::{
    AnatomicalZone, BlendMode, ColorizationConfig, ColorizationConfigBuilder, ColorizationRequest,
    Connectivity, LineThreshold, OutputFormat, ProcessingBackend, SkinToneRange,
};
pub use error::{ColorizeError, Result};
pub use garment::GarmentCategory;
pub use processor::SketchColorizer;
pub use recolor::Recolorizer;
pub use segmentation::{
    AnatomicalExcluder, EdgeDetector, Element, ElementColors, ElementRegionDetector, ElementRegions,
    MaskCleaner, RegionExtractor, RegionFilter, RegionSummary, SkinExcluder, SketchImage,
};
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, ProcessingStage, ProgressReporter,
    ProgressTracker, ProgressUpdate,
};
pub use types::{
    ColorizationOutcome, ColorizationReport, ColorizationResult, LabelGrid, Mask, MaskStatistics,
    ProcessingMetadata, Region, StageTimings,
};
pub use utils::NumericValidator;

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Colorize a decoded sketch with a one-off [`SketchColorizer`]
///
/// # Examples
///
/// ```rust,no_run
/// use garment_colorize::{colorize_sketch, BlendMode, ColorizationConfig, ColorizationRequest};
///
/// # fn example(sketch: image::DynamicImage) -> anyhow::Result<()> {
/// let config = ColorizationConfig::builder()
///     .blend_mode(BlendMode::HueSaturation)
///     .build()?;
/// let result = colorize_sketch(&sketch, &ColorizationRequest::new().with_target_color("rgb(0, 128, 255)"), &config)?;
/// assert_eq!(result.dimensions(), (sketch.width(), sketch.height()));
/// # Ok(())
/// # }
/// ```
pub fn colorize_sketch(
    image: &DynamicImage,
    request: &ColorizationRequest,
    config: &ColorizationConfig,
) -> Result<ColorizationResult> {
    SketchColorizer::new(config.clone())?.colorize(image, request)
}

/// Decode encoded image bytes and colorize them
///
/// Suitable for upload handlers where no file exists.
pub fn colorize_sketch_from_bytes(
    image_bytes: &[u8],
    request: &ColorizationRequest,
    config: &ColorizationConfig,
) -> Result<ColorizationResult> {
    SketchColorizer::new(config.clone())?.colorize_bytes(image_bytes, request)
}

/// Colorize without failing: on any error the original image comes back
///
/// An invalid configuration is reported the same way as a pipeline failure.
#[must_use]
pub fn colorize_or_original(
    image: &DynamicImage,
    request: &ColorizationRequest,
    config: &ColorizationConfig,
) -> ColorizationOutcome {
    match SketchColorizer::new(config.clone()) {
        Ok(colorizer) => colorizer.colorize_or_original(image, request),
        Err(e) => ColorizationOutcome::from_result(image, Err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_colorize_or_original_keeps_input_on_bad_config() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        let config = ColorizationConfig {
            skin_protection: 2.0,
            ..ColorizationConfig::default()
        };

        let outcome = colorize_or_original(&image, &ColorizationRequest::new(), &config);
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(outcome.image.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_blank_page_is_left_unchanged() {
        // Paper touching the border is never garment
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([255, 255, 255])));
        let result = colorize_sketch(
            &image,
            &ColorizationRequest::new().with_target_color("#FF0000"),
            &ColorizationConfig::default(),
        )
        .unwrap();

        assert!(result.is_unchanged());
        assert_eq!(result.coverage_percent, 0.0);
        assert_eq!(result.image, image.to_rgb8());
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = colorize_sketch_from_bytes(b"not an image", &ColorizationRequest::new(), &ColorizationConfig::default())
            .unwrap_err();
        assert!(matches!(err, ColorizeError::Decode(_)));
    }
}
