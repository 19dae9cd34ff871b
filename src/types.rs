//! Core types for sketch colorization

use crate::{
    color::{ColorDescription, TargetColor},
    config::OutputFormat,
    error::{ColorizeError, Result},
    garment::GarmentCategory,
    segmentation::elements::Element,
    services::ImageIOService,
};
use chrono::{DateTime, Utc};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Binary pixel mask; `true` means "apply target color here"
///
/// Stored row-major as `(height, width)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    data: Array2<bool>,
}

impl Mask {
    /// Create an empty mask
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, false)
    }

    /// Create a mask with every pixel set to `value`
    #[must_use]
    pub fn filled(width: u32, height: u32, value: bool) -> Self {
        Self {
            data: Array2::from_elem((height as usize, width as usize), value),
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> bool,
    {
        Self {
            data: Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
                f(x as u32, y as u32)
            }),
        }
    }

    /// Wrap an existing `(height, width)` array
    #[must_use]
    pub fn from_array(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// Create mask from a grayscale image (non-zero pixels are set)
    #[must_use]
    pub fn from_luma_image(image: &GrayImage) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| image.get_pixel(x, y)[0] > 0)
    }

    /// Convert mask to a grayscale image (255 for set pixels, 0 otherwise)
    #[must_use]
    pub fn to_luma_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    /// Mask dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Read a pixel; out-of-range coordinates read as unset
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Write a pixel; out-of-range coordinates are ignored
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if let Some(px) = self.data.get_mut((y as usize, x as usize)) {
            *px = value;
        }
    }

    /// Clear every pixel inside the half-open rectangle `[x0, x1) × [y0, y1)`
    pub fn clear_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        let x1 = x1.min(self.width());
        let y1 = y1.min(self.height());
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, false);
            }
        }
    }

    #[must_use]
    pub fn as_array(&self) -> &Array2<bool> {
        &self.data
    }

    /// Number of set pixels
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Whether no pixel is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Whether any set pixel lies on row 0, the last row, column 0 or the last column
    #[must_use]
    pub fn touches_border(&self) -> bool {
        let (rows, cols) = self.data.dim();
        if rows == 0 || cols == 0 {
            return false;
        }
        self.data
            .indexed_iter()
            .any(|((y, x), &v)| v && (y == 0 || x == 0 || y == rows - 1 || x == cols - 1))
    }

    fn ensure_same_shape(&self, other: &Mask) -> Result<()> {
        if self.dimensions() == other.dimensions() {
            Ok(())
        } else {
            Err(ColorizeError::processing(format!(
                "Mask dimensions do not match: {:?} vs {:?}",
                self.dimensions(),
                other.dimensions()
            )))
        }
    }

    /// Pixel-wise AND
    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.ensure_same_shape(other)?;
        Ok(Self::from_array(
            Zip::from(&self.data)
                .and(&other.data)
                .map_collect(|&a, &b| a && b),
        ))
    }

    /// Pixel-wise OR
    pub fn or(&self, other: &Mask) -> Result<Mask> {
        self.ensure_same_shape(other)?;
        Ok(Self::from_array(
            Zip::from(&self.data)
                .and(&other.data)
                .map_collect(|&a, &b| a || b),
        ))
    }

    /// Pixels set in `self` and unset in `other`
    pub fn and_not(&self, other: &Mask) -> Result<Mask> {
        self.ensure_same_shape(other)?;
        Ok(Self::from_array(
            Zip::from(&self.data)
                .and(&other.data)
                .map_collect(|&a, &b| a && !b),
        ))
    }

    /// Pixel-wise NOT
    #[must_use]
    pub fn not(&self) -> Mask {
        Self::from_array(self.data.mapv(|v| !v))
    }

    /// Get mask statistics
    #[must_use]
    pub fn statistics(&self) -> MaskStatistics {
        let total_pixels = self.data.len();
        let foreground_pixels = self.count();
        let background_pixels = total_pixels - foreground_pixels;
        let ratio = |n: usize| {
            if total_pixels == 0 {
                0.0
            } else {
                n as f32 / total_pixels as f32
            }
        };

        MaskStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: ratio(foreground_pixels),
            background_ratio: ratio(background_pixels),
        }
    }

    /// Save mask as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_luma_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Statistics about a mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
    pub background_ratio: f32,
}

/// Connected-component label grid; label 0 is background
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    pub labels: Array2<u32>,
    /// Number of labelled regions, excluding background
    pub region_count: u32,
}

impl LabelGrid {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.labels.ncols() as u32
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.labels.nrows() as u32
    }
}

/// Derived properties of one labelled region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub label: u32,
    /// Pixel count
    pub area: usize,
    pub touches_border: bool,
}

/// Wall-clock time spent in each pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub preprocess_ms: u64,
    pub edges_ms: u64,
    pub regions_ms: u64,
    pub exclusion_ms: u64,
    pub cleanup_ms: u64,
    pub elements_ms: u64,
    pub recolor_ms: u64,
    pub total_ms: u64,
}

impl StageTimings {
    /// Sum of the measured stages
    #[must_use]
    pub fn measured_ms(&self) -> u64 {
        self.preprocess_ms
            + self.edges_ms
            + self.regions_ms
            + self.exclusion_ms
            + self.cleanup_ms
            + self.elements_ms
            + self.recolor_ms
    }

    /// Get timing summary for display
    #[must_use]
    pub fn summary(&self) -> String {
        let pct = |ms: u64| {
            if self.total_ms == 0 {
                0.0
            } else {
                ms as f64 / self.total_ms as f64 * 100.0
            }
        };

        let mut summary = format!(
            "Total: {}ms | Edges: {}ms ({:.1}%) | Regions: {}ms ({:.1}%) | Exclusion: {}ms ({:.1}%) | Cleanup: {}ms ({:.1}%) | Recolor: {}ms ({:.1}%)",
            self.total_ms,
            self.edges_ms, pct(self.edges_ms),
            self.regions_ms, pct(self.regions_ms),
            self.exclusion_ms, pct(self.exclusion_ms),
            self.cleanup_ms, pct(self.cleanup_ms),
            self.recolor_ms, pct(self.recolor_ms),
        );

        if self.elements_ms > 0 {
            summary.push_str(&format!(" | Elements: {}ms", self.elements_ms));
        }

        summary
    }
}

/// Metadata about one colorization call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Segmentation method tag
    pub method: String,
    /// Mask backend that executed the morphology
    pub backend: String,
    /// Processed dimensions (width, height)
    pub dimensions: (u32, u32),
    pub grayscale_input: bool,
    pub garment_category: GarmentCategory,
    /// Labelled candidate regions before filtering
    pub regions_found: usize,
    /// Regions that passed the size and border filters
    pub regions_kept: usize,
    /// Elements that received their own color
    pub elements_applied: Vec<Element>,
    pub timings: StageTimings,
}

impl ProcessingMetadata {
    #[must_use]
    pub fn new(backend: &str, dimensions: (u32, u32)) -> Self {
        Self {
            method: "line_enclosed".to_string(),
            backend: backend.to_string(),
            dimensions,
            grayscale_input: false,
            garment_category: GarmentCategory::Unknown,
            regions_found: 0,
            regions_kept: 0,
            elements_applied: Vec::new(),
            timings: StageTimings::default(),
        }
    }
}

/// Result of a successful colorization call
#[derive(Debug, Clone)]
pub struct ColorizationResult {
    /// Colorized image; unchanged copy of the input when the mask is empty
    pub image: RgbImage,
    /// Final garment mask
    pub mask: Mask,
    /// Number of recolored pixels
    pub pixel_count: usize,
    /// Percentage of the image covered by the mask, rounded to one decimal
    pub coverage_percent: f32,
    /// Default target color applied to garment pixels
    pub target_color: TargetColor,
    pub metadata: ProcessingMetadata,
}

impl ColorizationResult {
    /// Whether nothing was recolored
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.pixel_count == 0
    }

    /// Get image dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Save in the specified format
    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        ImageIOService::save_image(&DynamicImage::ImageRgb8(self.image.clone()), path, format, quality)
    }

    /// Get the image as encoded bytes in the specified format
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        ImageIOService::encode_image(&DynamicImage::ImageRgb8(self.image.clone()), format, quality)
    }

    /// Build a serializable report for this result
    #[must_use]
    pub fn report(&self, input: Option<&str>) -> ColorizationReport {
        ColorizationReport {
            input: input.map(str::to_string),
            success: true,
            error: None,
            pixel_count: self.pixel_count,
            coverage_percent: self.coverage_percent,
            width: self.metadata.dimensions.0,
            height: self.metadata.dimensions.1,
            method: Some(self.metadata.method.clone()),
            backend: Some(self.metadata.backend.clone()),
            target: Some(self.target_color.describe()),
            timings: Some(self.metadata.timings.clone()),
            processed_at: Utc::now(),
        }
    }
}

/// Compute coverage percentage rounded to one decimal
#[must_use]
pub fn coverage_percent(pixel_count: usize, width: u32, height: u32) -> f32 {
    let total = f64::from(width) * f64::from(height);
    if total == 0.0 {
        return 0.0;
    }
    ((pixel_count as f64 / total * 100.0 * 10.0).round() / 10.0) as f32
}

/// Caller-facing outcome that never loses the input image
///
/// On failure `image` is the original input and `success` is false.
#[derive(Debug, Clone)]
pub struct ColorizationOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub image: DynamicImage,
    pub pixel_count: usize,
    pub coverage_percent: f32,
    pub result: Option<ColorizationResult>,
}

impl ColorizationOutcome {
    /// Build an outcome from a pipeline result, keeping `original` on failure
    #[must_use]
    pub fn from_result(original: &DynamicImage, result: Result<ColorizationResult>) -> Self {
        match result {
            Ok(result) => Self {
                success: true,
                error: None,
                image: DynamicImage::ImageRgb8(result.image.clone()),
                pixel_count: result.pixel_count,
                coverage_percent: result.coverage_percent,
                result: Some(result),
            },
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
                image: original.clone(),
                pixel_count: 0,
                coverage_percent: 0.0,
                result: None,
            },
        }
    }
}

/// Serializable summary of one colorization, used for JSON reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorizationReport {
    pub input: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub pixel_count: usize,
    pub coverage_percent: f32,
    pub width: u32,
    pub height: u32,
    pub method: Option<String>,
    pub backend: Option<String>,
    pub target: Option<ColorDescription>,
    pub timings: Option<StageTimings>,
    pub processed_at: DateTime<Utc>,
}

impl ColorizationReport {
    /// Report for an input that failed before or during processing
    #[must_use]
    pub fn failure(input: Option<&str>, error: &ColorizeError) -> Self {
        Self {
            input: input.map(str::to_string),
            success: false,
            error: Some(error.to_string()),
            pixel_count: 0,
            coverage_percent: 0.0,
            width: 0,
            height: 0,
            method: None,
            backend: None,
            target: None,
            timings: None,
            processed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_creation() {
        let mask = Mask::new(4, 3);
        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(mask.count(), 0);
        assert!(mask.is_empty());

        let full = Mask::filled(4, 3, true);
        assert_eq!(full.count(), 12);
    }

    #[test]
    fn test_mask_get_set_out_of_range() {
        let mut mask = Mask::new(2, 2);
        mask.set(1, 0, true);
        mask.set(5, 5, true);
        assert!(mask.get(1, 0));
        assert!(!mask.get(0, 1));
        assert!(!mask.get(5, 5));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn test_mask_boolean_composition() {
        let left = Mask::from_fn(4, 1, |x, _| x < 2);
        let even = Mask::from_fn(4, 1, |x, _| x % 2 == 0);

        assert_eq!(left.and(&even).unwrap().count(), 1);
        assert_eq!(left.or(&even).unwrap().count(), 3);
        assert_eq!(left.and_not(&even).unwrap().count(), 1);
        assert!(left.and_not(&even).unwrap().get(1, 0));
        assert_eq!(left.not().count(), 2);
    }

    #[test]
    fn test_mask_shape_mismatch_is_error() {
        let a = Mask::new(2, 2);
        let b = Mask::new(3, 2);
        assert!(a.and(&b).is_err());
        assert!(a.or(&b).is_err());
    }

    #[test]
    fn test_touches_border() {
        let mut mask = Mask::new(5, 5);
        mask.set(2, 2, true);
        assert!(!mask.touches_border());
        mask.set(4, 1, true);
        assert!(mask.touches_border());
    }

    #[test]
    fn test_clear_rect_clamps() {
        let mut mask = Mask::filled(4, 4, true);
        mask.clear_rect(2, 2, 10, 10);
        assert_eq!(mask.count(), 12);
    }

    #[test]
    fn test_luma_round_trip_preserves_pixels() {
        let mask = Mask::from_fn(3, 2, |x, y| (x + y) % 2 == 0);
        let image = mask.to_luma_image();
        assert_eq!(image.get_pixel(0, 0)[0], 255);
        assert_eq!(image.get_pixel(1, 0)[0], 0);
        assert_eq!(Mask::from_luma_image(&image), mask);
    }

    #[test]
    fn test_mask_statistics() {
        let mask = Mask::from_fn(2, 2, |x, _| x == 0);
        let stats = mask.statistics();
        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.foreground_pixels, 2);
        assert_eq!(stats.background_pixels, 2);
        assert_eq!(stats.foreground_ratio, 0.5);
    }

    #[test]
    fn test_coverage_percent_rounding() {
        assert_eq!(coverage_percent(0, 10, 10), 0.0);
        assert_eq!(coverage_percent(25, 10, 10), 25.0);
        assert_eq!(coverage_percent(1, 3, 3), 11.1);
        assert_eq!(coverage_percent(5, 0, 0), 0.0);
    }

    #[test]
    fn test_timing_summary() {
        let timings = StageTimings {
            edges_ms: 10,
            regions_ms: 20,
            recolor_ms: 20,
            total_ms: 50,
            ..StageTimings::default()
        };
        assert_eq!(timings.measured_ms(), 50);
        let summary = timings.summary();
        assert!(summary.contains("Total: 50ms"));
        assert!(summary.contains("Regions: 20ms (40.0%)"));
        assert!(!summary.contains("Elements"));
    }

    #[test]
    fn test_outcome_keeps_original_on_failure() {
        let original = DynamicImage::new_rgb8(3, 3);
        let outcome = ColorizationOutcome::from_result(
            &original,
            Err(ColorizeError::invalid_image("bad")),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.pixel_count, 0);
        assert_eq!(outcome.image, original);
        assert!(outcome.error.unwrap().contains("bad"));
    }
}
