//! Conversion from CLI arguments to library configuration

use crate::cli::main_impl::Cli;
use crate::{
    color::{sample_color, TargetColor},
    config::{ColorizationConfig, ColorizationRequest, Connectivity},
    segmentation::Element,
    services::ImageIOService,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to a `ColorizationConfig` and `ColorizationRequest`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the pipeline configuration from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<ColorizationConfig> {
        let connectivity = if cli.eight_connected {
            Connectivity::Eight
        } else {
            Connectivity::Four
        };

        ColorizationConfig::builder()
            .white_threshold(cli.white_threshold)
            .color_variance(cli.color_variance)
            .skin_protection(cli.skin_protection)
            .min_area(cli.min_area)
            .line_threshold(cli.line_threshold)
            .connectivity(connectivity)
            .blend_mode(cli.blend.into())
            .backend(cli.backend.into())
            .use_category_color(cli.use_category_color)
            .max_dimension(cli.max_dimension)
            .output_format(cli.format.into())
            .jpeg_quality(cli.jpeg_quality)
            .debug(cli.verbose >= 2)
            .build()
            .context("Invalid colorization settings")
    }

    /// Build the per-file request shared by every input
    ///
    /// Unlike the library, which falls back to gray, the CLI rejects
    /// malformed colors so typos surface before a batch runs.
    pub(crate) fn request_from_cli(cli: &Cli) -> Result<ColorizationRequest> {
        let mut request = ColorizationRequest::new();

        if let Some(color) = &cli.color {
            let parsed: TargetColor = color.parse()?;
            request = request.with_target_color(parsed.to_hex());
        } else if let Some(reference) = &cli.color_from {
            let swatch = ImageIOService::load_image(reference)
                .with_context(|| format!("Failed to load color reference {}", reference.display()))?;
            let sampled = sample_color(&swatch.to_rgb8(), cli.sample_method.into())
                .with_context(|| format!("Color reference {} has no pixels", reference.display()))?;
            log::info!("Sampled target color {} from {}", sampled, reference.display());
            request = request.with_target_color(sampled.to_hex());
        }

        for entry in &cli.element {
            let (name, color) = entry
                .split_once('=')
                .with_context(|| format!("--element expects name=color, got '{}'", entry))?;
            let element: Element = name.trim().parse()?;
            let parsed: TargetColor = color.trim().parse()?;
            request = request.with_element_color(element.as_str(), parsed.to_hex());
        }

        if let Some(category) = &cli.category {
            request = request.with_garment_category(category.clone());
        }

        Ok(request)
    }

    /// Validate arguments that clap cannot check on its own
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern).with_context(|| format!("Invalid --pattern '{}'", pattern))?;
        }

        if cli.color.is_some() && cli.color_from.is_some() {
            log::warn!("Both --color and --color-from given; --color wins");
        }

        Ok(())
    }
}
