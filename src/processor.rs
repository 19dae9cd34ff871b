//! Sketch colorization processor
//!
//! `SketchColorizer` runs the segmentation stages in order and applies the
//! target colors. It holds only configuration and the resolved mask backend,
//! so one instance can serve any number of independent calls.

use crate::{
    backends::{create_backend, MaskBackend},
    color::TargetColor,
    config::{ColorizationConfig, ColorizationRequest},
    error::Result,
    garment::GarmentCategory,
    recolor::Recolorizer,
    segmentation::{
        AnatomicalExcluder, EdgeDetector, ElementColors, ElementRegionDetector, ElementRegions, MaskCleaner,
        RegionExtractor, RegionFilter, SketchImage, SkinExcluder,
    },
    services::{ImageIOService, ProcessingStage, ProgressReporter, ProgressTracker},
    types::{coverage_percent, ColorizationOutcome, ColorizationResult, Mask, ProcessingMetadata, StageTimings},
    utils::NumericValidator,
};
use image::{imageops::FilterType, DynamicImage};
use instant::Instant;
use std::path::Path;
use tracing::{debug, info, instrument, span, Level};

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn report(tracker: &mut Option<ProgressTracker<'_>>, stage: ProcessingStage) {
    if let Some(tracker) = tracker.as_mut() {
        tracker.report_stage(stage);
    }
}

/// Colorizes garment sketches with a fixed configuration
pub struct SketchColorizer {
    config: ColorizationConfig,
    backend: Box<dyn MaskBackend + Send + Sync>,
    reporter: Option<Box<dyn ProgressReporter>>,
}

impl SketchColorizer {
    /// Create a colorizer, validating the configuration and resolving the backend once
    ///
    /// # Errors
    /// - Invalid configuration values
    pub fn new(config: ColorizationConfig) -> Result<Self> {
        config.validate()?;
        let backend = create_backend(config.backend);
        info!(backend = backend.name(), "Sketch colorizer ready");
        Ok(Self {
            config,
            backend,
            reporter: None,
        })
    }

    /// Attach a progress reporter notified at every stage
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ColorizationConfig {
        &self.config
    }

    /// Name of the resolved mask backend
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Colorize a decoded sketch
    ///
    /// An empty garment mask is a success with `pixel_count == 0` and the
    /// image returned unchanged.
    ///
    /// # Errors
    /// - `InvalidImage` for zero-sized images
    /// - `Processing` for internal stage failures
    #[instrument(
        skip(self, image, request),
        fields(
            backend = self.backend.name(),
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    pub fn colorize(&self, image: &DynamicImage, request: &ColorizationRequest) -> Result<ColorizationResult> {
        let total_start = Instant::now();
        let mut tracker = self
            .reporter
            .as_deref()
            .map(|reporter| ProgressTracker::new(reporter, total_start));

        let result = self.run(image, request, total_start, &mut tracker);

        if let Some(tracker) = tracker.as_mut() {
            match &result {
                Ok(result) => tracker.report_completion(&result.metadata.timings),
                Err(e) => tracker.report_error(&e.to_string()),
            }
        }
        result
    }

    /// Decode bytes and colorize
    ///
    /// # Errors
    /// - `Decode` when the bytes are not an image
    /// - Everything [`SketchColorizer::colorize`] can return
    pub fn colorize_bytes(&self, bytes: &[u8], request: &ColorizationRequest) -> Result<ColorizationResult> {
        let image = ImageIOService::load_from_bytes(bytes)?;
        self.colorize(&image, request)
    }

    /// Load a file and colorize
    ///
    /// # Errors
    /// - `Io` or `Decode` when the file cannot be read as an image
    /// - Everything [`SketchColorizer::colorize`] can return
    pub fn colorize_file<P: AsRef<Path>>(&self, path: P, request: &ColorizationRequest) -> Result<ColorizationResult> {
        let image = ImageIOService::load_image(path)?;
        self.colorize(&image, request)
    }

    /// Colorize without losing the input: failures return the original image
    #[must_use]
    pub fn colorize_or_original(&self, image: &DynamicImage, request: &ColorizationRequest) -> ColorizationOutcome {
        ColorizationOutcome::from_result(image, self.colorize(image, request))
    }

    /// Resolve the default color for a call
    ///
    /// An explicit target color wins (falling back to gray when malformed);
    /// otherwise the category palette is used only when enabled.
    #[must_use]
    pub fn resolve_target_color(&self, request: &ColorizationRequest, category: GarmentCategory) -> TargetColor {
        match request.target_color.as_deref() {
            Some(color) => TargetColor::parse_or_default(Some(color)),
            None if self.config.use_category_color => category.palette_color(),
            None => TargetColor::DEFAULT,
        }
    }

    /// Downscale so the longer side fits `max_dimension`
    fn prepare(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let (width, height) = NumericValidator::validate_dimensions(image.width(), image.height())?;

        match self.config.max_dimension {
            Some(max_dimension) if width.max(height) > max_dimension => {
                let scale = f64::from(max_dimension) / f64::from(width.max(height));
                let new_width = ((f64::from(width) * scale).round() as u32).max(1);
                let new_height = ((f64::from(height) * scale).round() as u32).max(1);
                debug!(width, height, new_width, new_height, "Downscaling sketch");
                Ok(image.resize_exact(new_width, new_height, FilterType::Lanczos3))
            },
            _ => Ok(image.clone()),
        }
    }

    fn log_stage(&self, stage: &str, mask: &Mask) {
        if self.config.debug {
            debug!(stage, pixels = mask.count(), "Stage mask");
        }
    }

    #[allow(clippy::too_many_lines)]
    fn run(
        &self,
        image: &DynamicImage,
        request: &ColorizationRequest,
        total_start: Instant,
        tracker: &mut Option<ProgressTracker<'_>>,
    ) -> Result<ColorizationResult> {
        let config = &self.config;
        let backend = self.backend.as_ref();
        let mut timings = StageTimings::default();

        // Preprocessing
        report(tracker, ProcessingStage::Preprocessing);
        let stage_start = Instant::now();
        let (sketch, gray, category, target, element_colors) = {
            let _span = span!(Level::DEBUG, "preprocessing").entered();
            let prepared = self.prepare(image)?;
            let sketch = SketchImage::from_dynamic(&prepared);
            let gray = sketch.gray();
            let category = GarmentCategory::from_optional(request.garment_category.as_deref());
            let target = self.resolve_target_color(request, category);
            let element_colors = ElementColors::from_raw(&request.element_colors);
            (sketch, gray, category, target, element_colors)
        };
        timings.preprocess_ms = elapsed_ms(stage_start);

        let dimensions = sketch.dimensions();
        let mut metadata = ProcessingMetadata::new(backend.name(), dimensions);
        metadata.grayscale_input = sketch.is_grayscale();
        metadata.garment_category = category;

        info!(
            width = dimensions.0,
            height = dimensions.1,
            category = %category,
            target = %target,
            grayscale = sketch.is_grayscale(),
            "Starting colorization"
        );

        // Line detection
        report(tracker, ProcessingStage::EdgeDetection);
        let stage_start = Instant::now();
        let lines = {
            let _span = span!(Level::DEBUG, "edges", threshold = %config.line_threshold).entered();
            EdgeDetector::new(config.line_threshold).detect(&gray, backend)
        };
        timings.edges_ms = elapsed_ms(stage_start);
        self.log_stage("edges", &lines);

        // Enclosed region extraction and filtering
        report(tracker, ProcessingStage::RegionExtraction);
        let stage_start = Instant::now();
        let (mask, summary) = {
            let _span = span!(Level::DEBUG, "regions", min_area = config.min_area).entered();
            let grid = RegionExtractor::new(config.white_threshold, config.color_variance, config.connectivity)
                .extract(&sketch, &lines, backend)?;
            RegionFilter::new(config.min_area).filter(&grid)
        };
        timings.regions_ms = elapsed_ms(stage_start);
        metadata.regions_found = summary.found;
        metadata.regions_kept = summary.kept;
        debug!(
            found = summary.found,
            kept = summary.kept,
            rejected_small = summary.rejected_small,
            rejected_border = summary.rejected_border,
            "Region filtering"
        );
        self.log_stage("regions", &mask);

        // Skin and anatomical exclusion
        report(tracker, ProcessingStage::Exclusion);
        let stage_start = Instant::now();
        let mask = {
            let _span = span!(Level::DEBUG, "exclusion", category = %category).entered();
            let mask = match sketch.as_rgb() {
                Some(rgb) => SkinExcluder::from_config(config).exclude(rgb, &mask, backend)?,
                None => mask,
            };
            AnatomicalExcluder::new(config.anatomical_zone).exclude(&mask, category)
        };
        timings.exclusion_ms = elapsed_ms(stage_start);
        self.log_stage("exclusion", &mask);

        // Cleanup
        report(tracker, ProcessingStage::Cleanup);
        let stage_start = Instant::now();
        let mask = {
            let _span = span!(Level::DEBUG, "cleanup").entered();
            MaskCleaner::new(config.min_area, config.connectivity).clean(&mask, backend)
        };
        timings.cleanup_ms = elapsed_ms(stage_start);
        self.log_stage("cleanup", &mask);

        // Element subdivision, only when element colors were supplied
        let element_regions: Option<ElementRegions> = if element_colors.is_empty() || mask.is_empty() {
            None
        } else {
            report(tracker, ProcessingStage::ElementDetection);
            let stage_start = Instant::now();
            let regions = {
                let _span = span!(Level::DEBUG, "elements").entered();
                ElementRegionDetector::new().detect(&mask, &element_colors.elements(), backend)?
            };
            timings.elements_ms = elapsed_ms(stage_start);
            metadata.elements_applied = regions.iter().map(|(element, _)| element).collect();
            Some(regions)
        };

        // Recoloring
        report(tracker, ProcessingStage::Recoloring);
        let stage_start = Instant::now();
        let colorized = {
            let _span = span!(Level::DEBUG, "recolor", mode = %config.blend_mode).entered();
            Recolorizer::new(config.blend_mode).recolor(
                &sketch,
                &mask,
                target,
                element_regions.as_ref().map(|regions| (regions, &element_colors)),
            )?
        };
        timings.recolor_ms = elapsed_ms(stage_start);

        let pixel_count = mask.count();
        timings.total_ms = elapsed_ms(total_start);
        metadata.timings = timings;

        info!(
            pixels = pixel_count,
            elapsed_ms = metadata.timings.total_ms,
            "Colorization finished"
        );

        Ok(ColorizationResult {
            image: colorized,
            coverage_percent: coverage_percent(pixel_count, dimensions.0, dimensions.1),
            pixel_count,
            mask,
            target_color: target,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessingBackend;
    use crate::services::ProgressUpdate;
    use image::{Rgb, RgbImage};
    use std::sync::{Arc, Mutex};

    /// White 120×120 canvas with a closed 2px square outline
    fn boxed_sketch() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(120, 120, |x, y| {
            let ring = |v: u32| (20..22).contains(&v) || (98..100).contains(&v);
            let inside = (20..100).contains(&x) && (20..100).contains(&y);
            if inside && (ring(x) || ring(y)) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        }))
    }

    fn colorizer() -> SketchColorizer {
        SketchColorizer::new(ColorizationConfig {
            backend: ProcessingBackend::Basic,
            ..ColorizationConfig::default()
        })
        .unwrap()
    }

    struct StageRecorder(Arc<Mutex<Vec<ProcessingStage>>>);

    impl ProgressReporter for StageRecorder {
        fn report_progress(&self, update: ProgressUpdate) {
            self.0.lock().unwrap().push(update.stage);
        }

        fn report_completion(&self, _timings: &StageTimings) {}

        fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ColorizationConfig {
            skin_protection: 2.0,
            ..ColorizationConfig::default()
        };
        assert!(SketchColorizer::new(config).is_err());
    }

    #[test]
    fn test_enclosed_box_is_colored() {
        let request = ColorizationRequest::new().with_target_color("#00FF00");
        let result = colorizer().colorize(&boxed_sketch(), &request).unwrap();

        assert!(result.pixel_count > 0);
        assert_eq!(result.image.get_pixel(60, 60).0, [0, 255, 0]);
        assert_eq!(result.image.get_pixel(5, 5).0, [255, 255, 255]);
        assert_eq!(result.metadata.method, "line_enclosed");
        assert_eq!(result.metadata.backend, "basic");
        assert_eq!(result.metadata.regions_kept, 1);
    }

    #[test]
    fn test_zero_sized_image_is_error() {
        let empty = DynamicImage::new_rgb8(0, 0);
        let err = colorizer().colorize(&empty, &ColorizationRequest::new()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_category_color_requires_opt_in() {
        let request = ColorizationRequest::new().with_garment_category("corset");
        assert_eq!(
            colorizer().resolve_target_color(&request, GarmentCategory::Corset),
            TargetColor::DEFAULT
        );

        let opted_in = SketchColorizer::new(ColorizationConfig {
            use_category_color: true,
            ..ColorizationConfig::default()
        })
        .unwrap();
        assert_eq!(
            opted_in.resolve_target_color(&request, GarmentCategory::Corset),
            TargetColor::new(220, 20, 60)
        );

        let explicit = request.with_target_color("#0000FF");
        assert_eq!(
            opted_in.resolve_target_color(&explicit, GarmentCategory::Corset),
            TargetColor::new(0, 0, 255)
        );
    }

    #[test]
    fn test_max_dimension_downscales() {
        let colorizer = SketchColorizer::new(ColorizationConfig {
            max_dimension: Some(60),
            min_area: 100,
            ..ColorizationConfig::default()
        })
        .unwrap();
        let result = colorizer.colorize(&boxed_sketch(), &ColorizationRequest::new()).unwrap();
        assert_eq!(result.dimensions(), (60, 60));
        assert_eq!(result.metadata.dimensions, (60, 60));
    }

    #[test]
    fn test_progress_reporter_sees_stages() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let colorizer = colorizer().with_progress_reporter(Box::new(StageRecorder(Arc::clone(&stages))));
        colorizer.colorize(&boxed_sketch(), &ColorizationRequest::new()).unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&ProcessingStage::Preprocessing));
        assert_eq!(stages.last(), Some(&ProcessingStage::Completed));
        assert!(!stages.contains(&ProcessingStage::ElementDetection));
    }

    #[test]
    fn test_colorize_bytes_rejects_garbage() {
        let err = colorizer()
            .colorize_bytes(b"not an image", &ColorizationRequest::new())
            .unwrap_err();
        assert!(matches!(err, crate::error::ColorizeError::Decode(_)));
    }
}
