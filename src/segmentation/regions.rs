//! Enclosed white-region extraction and filtering

use super::SketchImage;
use crate::{
    backends::MaskBackend,
    config::Connectivity,
    types::{LabelGrid, Mask, Region},
};
use serde::{Deserialize, Serialize};

/// Labels connected white areas that are not covered by line art
#[derive(Debug, Clone, Copy)]
pub struct RegionExtractor {
    white_threshold: u8,
    color_variance: u8,
    connectivity: Connectivity,
}

impl RegionExtractor {
    #[must_use]
    pub fn new(white_threshold: u8, color_variance: u8, connectivity: Connectivity) -> Self {
        Self {
            white_threshold,
            color_variance,
            connectivity,
        }
    }

    /// Paper-white pixels
    ///
    /// RGB: every channel above `white_threshold` and every pairwise channel
    /// difference below `color_variance`. Grayscale: intensity above
    /// `white_threshold`.
    #[must_use]
    pub fn white_mask(&self, sketch: &SketchImage) -> Mask {
        let threshold = self.white_threshold;
        let variance = i16::from(self.color_variance);

        match sketch {
            SketchImage::Rgb(rgb) => Mask::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let (ri, gi, bi) = (i16::from(r), i16::from(g), i16::from(b));
                r > threshold
                    && g > threshold
                    && b > threshold
                    && (ri - gi).abs() < variance
                    && (gi - bi).abs() < variance
                    && (ri - bi).abs() < variance
            }),
            SketchImage::Gray(gray) => {
                Mask::from_fn(gray.width(), gray.height(), |x, y| gray.get_pixel(x, y)[0] > threshold)
            },
        }
    }

    /// Candidate pixels: white and not line
    ///
    /// # Errors
    /// Line mask dimensions differ from the sketch
    pub fn candidates(&self, sketch: &SketchImage, lines: &Mask) -> crate::Result<Mask> {
        self.white_mask(sketch).and_not(lines)
    }

    /// Label candidate regions
    ///
    /// # Errors
    /// Line mask dimensions differ from the sketch
    pub fn extract(
        &self,
        sketch: &SketchImage,
        lines: &Mask,
        backend: &dyn MaskBackend,
    ) -> crate::Result<LabelGrid> {
        let candidates = self.candidates(sketch, lines)?;
        Ok(backend.label(&candidates, self.connectivity))
    }
}

/// Counts of labelled regions before and after filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub found: usize,
    pub kept: usize,
    pub rejected_small: usize,
    pub rejected_border: usize,
}

/// Keeps regions larger than `min_area` that do not reach the image border
#[derive(Debug, Clone, Copy)]
pub struct RegionFilter {
    min_area: usize,
}

impl RegionFilter {
    #[must_use]
    pub fn new(min_area: usize) -> Self {
        Self { min_area }
    }

    /// Area and border adjacency of every labelled region, ordered by label
    #[must_use]
    pub fn regions(grid: &LabelGrid) -> Vec<Region> {
        let mut regions: Vec<Region> = (1..=grid.region_count)
            .map(|label| Region {
                label,
                area: 0,
                touches_border: false,
            })
            .collect();

        let (rows, cols) = grid.labels.dim();
        for ((y, x), &label) in grid.labels.indexed_iter() {
            if label == 0 {
                continue;
            }
            if let Some(region) = regions.get_mut(label as usize - 1) {
                region.area += 1;
                if y == 0 || x == 0 || y + 1 == rows || x + 1 == cols {
                    region.touches_border = true;
                }
            }
        }

        regions
    }

    /// Whether a region becomes part of the garment mask
    #[must_use]
    pub fn keeps(&self, region: &Region) -> bool {
        region.area > self.min_area && !region.touches_border
    }

    /// Union of kept regions
    #[must_use]
    pub fn filter(&self, grid: &LabelGrid) -> (Mask, RegionSummary) {
        let regions = Self::regions(grid);
        let keep: Vec<bool> = regions.iter().map(|r| self.keeps(r)).collect();

        let summary = RegionSummary {
            found: regions.len(),
            kept: keep.iter().filter(|&&k| k).count(),
            rejected_small: regions.iter().filter(|r| r.area <= self.min_area).count(),
            rejected_border: regions
                .iter()
                .filter(|r| r.area > self.min_area && r.touches_border)
                .count(),
        };

        let mask = Mask::from_array(grid.labels.mapv(|label| {
            label != 0 && keep.get(label as usize - 1).copied().unwrap_or(false)
        }));

        (mask, summary)
    }
}
