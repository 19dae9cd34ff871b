//! imageproc-backed mask backend
//!
//! imageproc morphology works on L∞ radii, which covers odd square kernels.
//! Even kernels and radii beyond what imageproc's distance transform can
//! represent run once on the basic path instead.

use super::{
    basic::{label_components, BasicBackend},
    MaskBackend,
};
use crate::{
    config::Connectivity,
    types::{LabelGrid, Mask},
};
use image::{GrayImage, Luma};
use imageproc::{
    distance_transform::Norm,
    morphology,
    region_labelling::{self, Connectivity as ImageprocConnectivity},
};
use ndarray::Array2;
use tracing::trace;

/// Largest radius handed to imageproc; its distances saturate at 255
const MAX_RADIUS: u32 = 254;

/// Backend delegating to imageproc
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceleratedBackend {
    fallback: BasicBackend,
}

impl AcceleratedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fallback: BasicBackend::new(),
        }
    }

    /// Combined L∞ radius, or `None` when imageproc cannot express the operation
    fn radius(kernel: u32, iterations: u32) -> Option<u8> {
        if kernel % 2 == 0 {
            return None;
        }
        let radius = (kernel / 2).checked_mul(iterations)?;
        if radius > MAX_RADIUS {
            return None;
        }
        u8::try_from(radius).ok()
    }
}

impl MaskBackend for AcceleratedBackend {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn dilate(&self, mask: &Mask, kernel: u32, iterations: u32) -> Mask {
        match Self::radius(kernel, iterations) {
            Some(0) => mask.clone(),
            Some(radius) => {
                Mask::from_luma_image(&morphology::dilate(&mask.to_luma_image(), Norm::LInf, radius))
            },
            None => {
                trace!(kernel, iterations, "Dilation outside imageproc range, using basic path");
                self.fallback.dilate(mask, kernel, iterations)
            },
        }
    }

    fn erode(&self, mask: &Mask, kernel: u32, iterations: u32) -> Mask {
        match Self::radius(kernel, iterations) {
            Some(0) => mask.clone(),
            Some(radius) => {
                Mask::from_luma_image(&morphology::erode(&mask.to_luma_image(), Norm::LInf, radius))
            },
            None => {
                trace!(kernel, iterations, "Erosion outside imageproc range, using basic path");
                self.fallback.erode(mask, kernel, iterations)
            },
        }
    }

    fn label(&self, mask: &Mask, connectivity: Connectivity) -> LabelGrid {
        let (width, height) = mask.dimensions();
        if width == 0 || height == 0 {
            return label_components(mask, connectivity);
        }

        let conn = match connectivity {
            Connectivity::Four => ImageprocConnectivity::Four,
            Connectivity::Eight => ImageprocConnectivity::Eight,
        };
        let labelled = region_labelling::connected_components(&mask.to_luma_image(), conn, Luma([0_u8]));

        let labels = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            labelled.get_pixel(x as u32, y as u32)[0]
        });
        let region_count = labels.iter().copied().max().unwrap_or(0);

        LabelGrid { labels, region_count }
    }

    fn otsu_level(&self, gray: &GrayImage) -> u8 {
        imageproc::contrast::otsu_level(gray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> Mask {
        Mask::from_fn(20, 20, |x, y| {
            ((4..12).contains(&x) && (5..15).contains(&y)) || (x == 16 && y == 3) || (x == 0 && y < 6)
        })
    }

    #[test]
    fn test_radius_selection() {
        assert_eq!(AcceleratedBackend::radius(3, 1), Some(1));
        assert_eq!(AcceleratedBackend::radius(5, 2), Some(4));
        assert_eq!(AcceleratedBackend::radius(4, 1), None);
        assert_eq!(AcceleratedBackend::radius(1, 3), Some(0));
        assert_eq!(AcceleratedBackend::radius(511, 1), None);
    }

    #[test]
    fn test_matches_basic_dilation_and_erosion() {
        let fast = AcceleratedBackend::new();
        let basic = BasicBackend::new();
        let mask = blob();

        for (kernel, iterations) in [(3, 1), (5, 1), (3, 2), (4, 1), (7, 1)] {
            assert_eq!(
                fast.dilate(&mask, kernel, iterations),
                basic.dilate(&mask, kernel, iterations),
                "dilate k={kernel} n={iterations}"
            );
            assert_eq!(
                fast.erode(&mask, kernel, iterations),
                basic.erode(&mask, kernel, iterations),
                "erode k={kernel} n={iterations}"
            );
        }
    }

    #[test]
    fn test_label_counts_match_basic() {
        let fast = AcceleratedBackend::new();
        let basic = BasicBackend::new();
        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            assert_eq!(
                fast.label(&blob(), connectivity).region_count,
                basic.label(&blob(), connectivity).region_count
            );
        }
    }
}
