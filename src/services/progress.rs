//! Progress reporting service
//!
//! Frontends plug in their own reporter; the pipeline only announces stages.

use crate::types::StageTimings;
use instant::Instant;

/// Stages of one colorization call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Decoding and optional downscaling
    Preprocessing,
    /// Line mask extraction
    EdgeDetection,
    /// Labelling and filtering enclosed white regions
    RegionExtraction,
    /// Skin and anatomical exclusion
    Exclusion,
    /// Morphological close and small-component removal
    Cleanup,
    /// Collar, straps and trim subdivision
    ElementDetection,
    /// Writing target colors into the garment mask
    Recoloring,
    Completed,
}

impl ProcessingStage {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Preprocessing => "Preparing sketch",
            ProcessingStage::EdgeDetection => "Detecting line art",
            ProcessingStage::RegionExtraction => "Extracting enclosed regions",
            ProcessingStage::Exclusion => "Excluding skin and anatomical zones",
            ProcessingStage::Cleanup => "Cleaning garment mask",
            ProcessingStage::ElementDetection => "Detecting garment elements",
            ProcessingStage::Recoloring => "Applying target color",
            ProcessingStage::Completed => "Colorization completed",
        }
    }

    /// Typical progress percentage reached when this stage starts
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            ProcessingStage::Preprocessing => 5,
            ProcessingStage::EdgeDetection => 15,
            ProcessingStage::RegionExtraction => 30,
            ProcessingStage::Exclusion => 50,
            ProcessingStage::Cleanup => 65,
            ProcessingStage::ElementDetection => 75,
            ProcessingStage::Recoloring => 85,
            ProcessingStage::Completed => 100,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub description: String,
    /// Elapsed time since the call started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            description: stage.description().to_string(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
        }
    }
}

/// Receives stage notifications from a colorization call
pub trait ProgressReporter: Send + Sync {
    fn report_progress(&self, update: ProgressUpdate);

    /// Report completion with final timings
    fn report_completion(&self, timings: &StageTimings);

    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// Discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _timings: &StageTimings) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Logs progress through the `log` facade
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress,
                update.description,
                update.elapsed_ms
            );
        } else {
            log::debug!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: &StageTimings) {
        log::info!("Colorization completed in {}ms", timings.total_ms);
        if self.verbose {
            log::info!("  {}", timings.summary());
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("Error during {}: {}", stage.description(), error);
    }
}

/// Tracks the current stage for one call and forwards to a reporter
pub struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    start_time: Instant,
    current_stage: Option<ProcessingStage>,
}

impl<'a> ProgressTracker<'a> {
    #[must_use]
    pub fn new(reporter: &'a dyn ProgressReporter, start_time: Instant) -> Self {
        Self {
            reporter,
            start_time,
            current_stage: None,
        }
    }

    pub fn report_stage(&mut self, stage: ProcessingStage) {
        self.current_stage = Some(stage);
        self.reporter.report_progress(ProgressUpdate::new(stage, self.start_time));
    }

    pub fn report_completion(&mut self, timings: &StageTimings) {
        self.report_stage(ProcessingStage::Completed);
        self.reporter.report_completion(timings);
    }

    /// Report an error against the stage that was running
    pub fn report_error(&self, error: &str) {
        let stage = self.current_stage.unwrap_or(ProcessingStage::Preprocessing);
        self.reporter.report_error(stage, error);
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<ProcessingStage> {
        self.current_stage
    }
}
