//! Line detection

use crate::{backends::MaskBackend, config::LineThreshold, types::Mask};
use image::GrayImage;
use tracing::debug;

/// Structuring element closing one-pixel gaps in the line art
const LINE_DILATION_KERNEL: u32 = 3;

/// Extracts the dilated line mask from a grayscale sketch
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    threshold: LineThreshold,
}

impl EdgeDetector {
    #[must_use]
    pub fn new(threshold: LineThreshold) -> Self {
        Self { threshold }
    }

    /// Raw line mask before dilation
    ///
    /// With a fixed threshold a pixel is a line when its intensity is strictly
    /// below it. With Otsu the computed level belongs to the line class.
    #[must_use]
    pub fn line_mask(&self, gray: &GrayImage, backend: &dyn MaskBackend) -> Mask {
        // Brightest intensity still counted as line; None when nothing is
        let brightest_line = match self.threshold {
            LineThreshold::Fixed(level) => level.checked_sub(1),
            LineThreshold::Otsu => {
                let level = backend.otsu_level(gray);
                debug!(level, "Otsu line threshold");
                Some(level)
            },
        };

        match brightest_line {
            Some(max) => Mask::from_fn(gray.width(), gray.height(), |x, y| gray.get_pixel(x, y)[0] <= max),
            None => Mask::new(gray.width(), gray.height()),
        }
    }

    /// Line mask dilated once with a 3×3 square
    #[must_use]
    pub fn detect(&self, gray: &GrayImage, backend: &dyn MaskBackend) -> Mask {
        let lines = self.line_mask(gray, backend);
        backend.dilate(&lines, LINE_DILATION_KERNEL, 1)
    }
}
