//! Garment colorization CLI tool
//!
//! Command-line interface for batch colorization of garment sketches.

use super::config::CliConfigBuilder;
use crate::{
    color::SampleMethod,
    config::{BlendMode, LineThreshold, OutputFormat, ProcessingBackend},
    processor::SketchColorizer,
    services::ConsoleProgressReporter,
    tracing_config::{init_cli_tracing, spans, TracingFormat},
    types::ColorizationReport,
    ColorizationRequest,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "tiff", "tif"];

/// Garment sketch colorization CLI tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "garment-colorize")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input sketch files or directories
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Output file (single input) or directory (batch processing)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Target garment color, `#RRGGBB` or `rgb(r, g, b)` [default: #A8A8A8]
    #[arg(short, long)]
    pub color: Option<String>,

    /// Sample the target color from a reference image when --color is absent
    #[arg(long, value_name = "IMAGE")]
    pub color_from: Option<PathBuf>,

    /// How the reference image color is sampled
    #[arg(long, value_enum, default_value_t = CliSampleMethod::Dominant)]
    pub sample_method: CliSampleMethod,

    /// Per-element color as name=color (main, straps, collar, trim); repeatable
    #[arg(short, long, value_name = "NAME=COLOR")]
    pub element: Vec<String>,

    /// Garment category text, e.g. "corset bodysuit"
    #[arg(long)]
    pub category: Option<String>,

    /// Use the category palette color when no --color is given
    #[arg(long)]
    pub use_category_color: bool,

    /// Channel minimum for paper pixels
    #[arg(long, default_value_t = 245)]
    pub white_threshold: u8,

    /// Maximum channel spread for paper pixels
    #[arg(long, default_value_t = 30)]
    pub color_variance: u8,

    /// Skin dilation strength (0.0-1.0)
    #[arg(long, default_value_t = 0.3)]
    pub skin_protection: f32,

    /// Regions must be larger than this many pixels
    #[arg(long, default_value_t = 500)]
    pub min_area: usize,

    /// Line threshold, a value 0-255 or "otsu"
    #[arg(long, default_value = "100")]
    pub line_threshold: LineThreshold,

    /// Label regions with 8-connectivity instead of 4
    #[arg(long)]
    pub eight_connected: bool,

    /// Blend mode for applying the target color
    #[arg(long, value_enum, default_value_t = CliBlendMode::Shaded)]
    pub blend: CliBlendMode,

    /// Mask operation backend
    #[arg(long, value_enum, default_value_t = CliBackend::Auto)]
    pub backend: CliBackend,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Png)]
    pub format: CliOutputFormat,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = 90)]
    pub jpeg_quality: u8,

    /// Downscale sketches whose longer side exceeds this many pixels
    #[arg(long)]
    pub max_dimension: Option<u32>,

    /// Process directory recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for batch processing (e.g., "*.png")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Write a JSON report of every processed file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Also save the garment mask as `<stem>_mask.png` next to each output
    #[arg(long)]
    pub save_mask: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Increase logging verbosity (-v: DEBUG, -vv: TRACE and stage details)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Webp => OutputFormat::WebP,
            CliOutputFormat::Tiff => OutputFormat::Tiff,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBlendMode {
    Shaded,
    HueSaturation,
}

impl From<CliBlendMode> for BlendMode {
    fn from(mode: CliBlendMode) -> Self {
        match mode {
            CliBlendMode::Shaded => BlendMode::Shaded,
            CliBlendMode::HueSaturation => BlendMode::HueSaturation,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBackend {
    Auto,
    Accelerated,
    Basic,
}

impl From<CliBackend> for ProcessingBackend {
    fn from(backend: CliBackend) -> Self {
        match backend {
            CliBackend::Auto => ProcessingBackend::Auto,
            CliBackend::Accelerated => ProcessingBackend::Accelerated,
            CliBackend::Basic => ProcessingBackend::Basic,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliSampleMethod {
    Dominant,
    Center,
}

impl From<CliSampleMethod> for SampleMethod {
    fn from(method: CliSampleMethod) -> Self {
        match method {
            CliSampleMethod::Dominant => SampleMethod::Dominant,
            CliSampleMethod::Center => SampleMethod::Center,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

/// Counts and reports for one CLI run
#[derive(Debug, Default)]
struct BatchSummary {
    processed: usize,
    failed: usize,
    reports: Vec<ColorizationReport>,
}

/// CLI entry point
///
/// Returns an error when any input fails so the process exits non-zero.
pub fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id =
        init_cli_tracing(cli.verbose, cli.log_format.into()).context("Failed to initialize logging")?;

    CliConfigBuilder::validate_cli(&cli)?;
    let config = CliConfigBuilder::from_cli(&cli)?;
    let request = CliConfigBuilder::request_from_cli(&cli)?;

    let mut colorizer = SketchColorizer::new(config).context("Failed to create colorizer")?;
    if cli.verbose > 0 {
        colorizer = colorizer.with_progress_reporter(Box::new(ConsoleProgressReporter::new(cli.verbose > 1)));
    }

    let _session = spans::session(&session_id, colorizer.backend_name()).entered();
    debug!(config = ?colorizer.config(), "Colorizer ready");

    let summary = process_inputs(&cli, &colorizer, &request)?;

    if let Some(report_path) = &cli.report {
        write_report(report_path, &summary.reports)?;
        info!("Report written to {}", report_path.display());
    }

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} file(s) failed to colorize",
            summary.failed,
            summary.processed + summary.failed
        );
    }

    Ok(())
}

/// Expand file and directory inputs into a sorted, de-duplicated file list
fn collect_inputs(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut all_files = Vec::new();

    for input in &cli.inputs {
        let path = PathBuf::from(input);

        if path.is_file() {
            if is_image_file(&path) {
                all_files.push(path);
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let dir_files = find_image_files(&path, cli.recursive, cli.pattern.as_deref())
                .with_context(|| format!("Failed to scan directory {}", path.display()))?;
            all_files.extend(dir_files);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    // Sort files alphanumerically for consistent processing order
    all_files.sort();
    all_files.dedup();
    Ok(all_files)
}

fn process_inputs(cli: &Cli, colorizer: &SketchColorizer, request: &ColorizationRequest) -> Result<BatchSummary> {
    let all_files = collect_inputs(cli)?;
    let mut summary = BatchSummary::default();

    if all_files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(summary);
    }

    let file_count = all_files.len();
    info!("Found {} sketch(es) to process", file_count);
    let _batch = spans::batch_processing(file_count).entered();

    let progress = if file_count > 1 {
        let pb = ProgressBar::new(file_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let output_format = colorizer.config().output_format;
    let output_dir = resolve_output_dir(cli.output.as_deref(), file_count)?;
    let batch_start_time = Instant::now();

    for input_file in &all_files {
        if let Some(pb) = &progress {
            pb.set_message(format!("Colorizing {}", input_file.display()));
        }

        let output_path = match (&output_dir, &cli.output) {
            (Some(dir), _) => generate_output_path_with_dir(input_file, dir, output_format),
            (None, Some(target)) => PathBuf::from(target),
            (None, None) => generate_output_path(input_file, output_format),
        };

        let input_label = input_file.display().to_string();
        match process_single_file(colorizer, request, input_file, &output_path, cli.save_mask) {
            Ok(report) => {
                summary.processed += 1;
                summary.reports.push(report);
            },
            Err(e) => {
                error!("Failed to colorize {}: {}", input_label, e);
                summary.failed += 1;
                summary.reports.push(ColorizationReport::failure(Some(&input_label), &e));
            },
        }

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Completed! Processed: {}, Failed: {}",
            summary.processed, summary.failed
        ));
    }

    if file_count > 1 {
        let total = batch_start_time.elapsed();
        info!("Batch summary:");
        info!("  Files processed: {}", summary.processed);
        info!("  Files failed: {}", summary.failed);
        info!("  Total time: {:.2}s", total.as_secs_f64());
    }

    Ok(summary)
}

/// Colorize one file and write its output (and optionally its mask)
fn process_single_file(
    colorizer: &SketchColorizer,
    request: &ColorizationRequest,
    input_path: &Path,
    output_path: &Path,
    save_mask: bool,
) -> crate::Result<ColorizationReport> {
    let _span = spans::file_processing(input_path).entered();
    let config = colorizer.config();

    let result = colorizer.colorize_file(input_path, request)?;
    result.save(output_path, config.output_format, config.jpeg_quality)?;

    if save_mask {
        let mask_path = mask_output_path(output_path);
        result.mask.save_png(&mask_path)?;
        debug!(mask = %mask_path.display(), "Saved garment mask");
    }

    if result.is_unchanged() {
        warn!(
            "No enclosed garment region found in {}; output is unchanged",
            input_path.display()
        );
    }

    info!(
        "{} -> {} ({} px, {:.1}%, {}ms)",
        input_path.display(),
        output_path.display(),
        result.pixel_count,
        result.coverage_percent,
        result.metadata.timings.total_ms
    );

    Ok(result.report(Some(&input_path.display().to_string())))
}

/// Decide the output directory: required for batches, optional for one file
fn resolve_output_dir(output: Option<&str>, file_count: usize) -> Result<Option<PathBuf>> {
    let Some(output) = output else {
        return Ok(None);
    };
    let output_path = PathBuf::from(output);
    let names_directory =
        output.ends_with('/') || output.ends_with(std::path::MAIN_SEPARATOR) || output_path.is_dir();

    if file_count == 1 && !names_directory {
        return Ok(None);
    }

    if output_path.is_file() {
        anyhow::bail!(
            "Output path exists and is a file, not a directory: {}",
            output_path.display()
        );
    }
    if !output_path.exists() {
        std::fs::create_dir_all(&output_path)
            .with_context(|| format!("Failed to create output directory: {}", output_path.display()))?;
    }
    Ok(Some(output_path))
}

fn write_report(path: &Path, reports: &[ColorizationReport]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
        }
    }
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create report {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), reports)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}

fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let path = entry.path();
                if is_image_file(path) && matches_pattern(path, pattern) {
                    files.push(path.to_path_buf());
                }
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if is_image_file(&path) && matches_pattern(&path, pattern) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Check if file is an image based on extension
fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Check if the file name matches the given glob pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|filename| glob::Pattern::new(pat).is_ok_and(|p| p.matches(filename))),
        None => true,
    }
}

fn output_file_name(input_path: &Path, format: OutputFormat) -> String {
    let stem = input_path.file_stem().unwrap_or_default();
    format!("{}_colorized.{}", stem.to_string_lossy(), format.extension())
}

/// Default output path next to the input
fn generate_output_path(input_path: &Path, format: OutputFormat) -> PathBuf {
    let dir = input_path.parent().unwrap_or(Path::new("."));
    dir.join(output_file_name(input_path, format))
}

fn generate_output_path_with_dir(input_path: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    output_dir.join(output_file_name(input_path, format))
}

/// `<stem>_mask.png` in the output's directory
fn mask_output_path(output_path: &Path) -> PathBuf {
    let stem = output_path.file_stem().unwrap_or_default().to_string_lossy();
    let stem = stem.strip_suffix("_colorized").unwrap_or(&*stem);
    output_path.with_file_name(format!("{}_mask.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::fs;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["garment-colorize"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    /// White page with a closed 3px black box outline
    fn boxed_sketch() -> DynamicImage {
        let image = RgbImage::from_fn(120, 120, |x, y| {
            let on_x = (20..23).contains(&x) || (97..100).contains(&x);
            let on_y = (20..23).contains(&y) || (97..100).contains(&y);
            let inside = (20..100).contains(&x) && (20..100).contains(&y);
            if inside && (on_x || on_y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        DynamicImage::ImageRgb8(image)
    }

    #[test]
    fn test_cli_defaults() {
        let cli = parse(&["sketch.png"]);
        assert_eq!(cli.inputs, vec!["sketch.png"]);
        assert_eq!(cli.format, CliOutputFormat::Png);
        assert_eq!(cli.blend, CliBlendMode::Shaded);
        assert_eq!(cli.backend, CliBackend::Auto);
        assert_eq!(cli.line_threshold, LineThreshold::Fixed(100));
        assert_eq!(cli.white_threshold, 245);
        assert_eq!(cli.min_area, 500);
        assert!(cli.element.is_empty());
        assert!(!cli.recursive);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_requires_input_and_valid_threshold() {
        assert!(Cli::try_parse_from(["garment-colorize"]).is_err());
        assert!(Cli::try_parse_from(["garment-colorize", "a.png", "--line-threshold", "300"]).is_err());
        assert!(Cli::try_parse_from(["garment-colorize", "a.png", "--blend", "multiply"]).is_err());
    }

    #[test]
    fn test_repeated_flags() {
        let cli = parse(&["a.png", "-e", "straps=#000000", "-e", "trim=#FFFFFF", "-vv"]);
        assert_eq!(cli.element.len(), 2);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("sketch.png")));
        assert!(is_image_file(Path::new("sketch.JPEG")));
        assert!(is_image_file(Path::new("scan.tif")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern(Path::new("any_file.jpg"), None));
        assert!(matches_pattern(Path::new("look_01.png"), Some("look_*.png")));
        assert!(matches_pattern(Path::new("img001.jpg"), Some("img???.jpg")));
        assert!(!matches_pattern(Path::new("test.png"), Some("*.jpg")));
        assert!(!matches_pattern(Path::new(""), Some("*.jpg")));
    }

    #[test]
    fn test_generate_output_path() {
        let output = generate_output_path(Path::new("/looks/bodysuit.jpg"), OutputFormat::Png);
        assert_eq!(output, PathBuf::from("/looks/bodysuit_colorized.png"));

        let output = generate_output_path(Path::new("my.complex.name.png"), OutputFormat::Jpeg);
        assert_eq!(output.file_name().unwrap(), "my.complex.name_colorized.jpg");

        let output = generate_output_path_with_dir(Path::new("in/a.png"), Path::new("out"), OutputFormat::WebP);
        assert_eq!(output, PathBuf::from("out/a_colorized.webp"));
    }

    #[test]
    fn test_mask_output_path() {
        assert_eq!(
            mask_output_path(Path::new("out/look_colorized.jpg")),
            PathBuf::from("out/look_mask.png")
        );
        assert_eq!(mask_output_path(Path::new("custom.png")), PathBuf::from("custom_mask.png"));
    }

    #[test]
    fn test_find_image_files_recursive_and_sorted() {
        let temp_dir = tempdir().unwrap();
        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        fs::write(temp_dir.path().join("z_last.jpg"), b"test").unwrap();
        fs::write(temp_dir.path().join("a_first.png"), b"test").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"test").unwrap();
        fs::write(sub_dir.join("nested.webp"), b"test").unwrap();

        let files = find_image_files(temp_dir.path(), false, None).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
        assert_eq!(names, vec!["a_first.png", "z_last.jpg"]);

        let files = find_image_files(temp_dir.path(), true, None).unwrap();
        assert_eq!(files.len(), 3);

        let files = find_image_files(temp_dir.path(), true, Some("*.webp")).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_collect_inputs_rejects_missing_path() {
        let cli = parse(&["/definitely/not/here.png"]);
        assert!(collect_inputs(&cli).is_err());
    }

    #[test]
    fn test_resolve_output_dir() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("taken.png");
        fs::write(&file, b"x").unwrap();

        assert!(resolve_output_dir(None, 3).unwrap().is_none());
        assert!(resolve_output_dir(Some("single.png"), 1).unwrap().is_none());
        assert!(resolve_output_dir(Some(file.to_str().unwrap()), 2).is_err());

        let batch_dir = temp_dir.path().join("batch");
        let resolved = resolve_output_dir(Some(batch_dir.to_str().unwrap()), 2).unwrap();
        assert_eq!(resolved, Some(batch_dir.clone()));
        assert!(batch_dir.is_dir());
    }

    #[test]
    fn test_batch_counts_failures_and_writes_outputs() {
        let temp_dir = tempdir().unwrap();
        let input_dir = temp_dir.path().join("in");
        let output_dir = temp_dir.path().join("out");
        fs::create_dir(&input_dir).unwrap();

        boxed_sketch().save(input_dir.join("good.png")).unwrap();
        fs::write(input_dir.join("broken.png"), b"not an image").unwrap();

        let cli = parse(&[
            input_dir.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
            "--color",
            "#00FF00",
            "--save-mask",
        ]);
        let colorizer = SketchColorizer::new(CliConfigBuilder::from_cli(&cli).unwrap()).unwrap();
        let request = CliConfigBuilder::request_from_cli(&cli).unwrap();

        let summary = process_inputs(&cli, &colorizer, &request).unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.reports.len(), 2);
        assert!(output_dir.join("good_colorized.png").is_file());
        assert!(output_dir.join("good_mask.png").is_file());
        assert!(!output_dir.join("broken_colorized.png").exists());

        let report_path = temp_dir.path().join("report.json");
        write_report(&report_path, &summary.reports).unwrap();
        let parsed: Vec<ColorizationReport> =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert!(parsed.iter().any(|r| r.success && r.pixel_count > 0));
        assert!(parsed.iter().any(|r| !r.success && r.error.is_some()));
    }
}
