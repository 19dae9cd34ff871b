//! Mask operation backends
//!
//! Two interchangeable implementations of the morphology and labelling
//! primitives used by the segmentation stages:
//! - Basic backend (pure ndarray, always available)
//! - Accelerated backend (imageproc, feature `accelerated`)
//!
//! Both use square structuring elements anchored at `kernel / 2` and treat
//! pixels outside the image as absent for dilation and as set for erosion,
//! so they produce identical masks.

pub mod basic;

#[cfg(feature = "accelerated")]
pub mod accelerated;

pub use self::basic::BasicBackend;

#[cfg(feature = "accelerated")]
pub use self::accelerated::AcceleratedBackend;

use crate::{
    config::{Connectivity, ProcessingBackend},
    types::{LabelGrid, Mask},
};
use image::GrayImage;
use tracing::{debug, warn};

/// Morphology and labelling primitives over binary masks
pub trait MaskBackend {
    /// Backend name for logs and metadata
    fn name(&self) -> &'static str;

    /// Dilate with a `kernel × kernel` square, `iterations` times
    fn dilate(&self, mask: &Mask, kernel: u32, iterations: u32) -> Mask;

    /// Erode with a `kernel × kernel` square, `iterations` times
    fn erode(&self, mask: &Mask, kernel: u32, iterations: u32) -> Mask;

    /// Label connected components of set pixels
    fn label(&self, mask: &Mask, connectivity: Connectivity) -> LabelGrid;

    /// Otsu threshold of a grayscale image
    fn otsu_level(&self, gray: &GrayImage) -> u8;

    /// Morphological closing: dilation followed by erosion
    fn close(&self, mask: &Mask, kernel: u32, iterations: u32) -> Mask {
        let dilated = self.dilate(mask, kernel, iterations);
        self.erode(&dilated, kernel, iterations)
    }
}

/// Whether the accelerated backend was compiled in
#[must_use]
pub fn accelerated_available() -> bool {
    cfg!(feature = "accelerated")
}

/// Resolve a requested backend against the compiled capabilities
///
/// Requesting `Accelerated` without the feature logs a warning and resolves
/// to `Basic`; the result is never `Auto`.
#[must_use]
pub fn resolve_backend(requested: ProcessingBackend) -> ProcessingBackend {
    match requested {
        ProcessingBackend::Basic => ProcessingBackend::Basic,
        ProcessingBackend::Auto if accelerated_available() => ProcessingBackend::Accelerated,
        ProcessingBackend::Auto => ProcessingBackend::Basic,
        ProcessingBackend::Accelerated if accelerated_available() => ProcessingBackend::Accelerated,
        ProcessingBackend::Accelerated => {
            warn!("Accelerated backend requested but not compiled in, using basic backend");
            ProcessingBackend::Basic
        },
    }
}

/// Create the mask backend for a requested selection
#[must_use]
pub fn create_backend(requested: ProcessingBackend) -> Box<dyn MaskBackend + Send + Sync> {
    let resolved = resolve_backend(requested);
    debug!(requested = %requested, resolved = %resolved, "Selected mask backend");

    match resolved {
        #[cfg(feature = "accelerated")]
        ProcessingBackend::Accelerated => Box::new(AcceleratedBackend::new()),
        _ => Box::new(BasicBackend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_is_always_honoured() {
        assert_eq!(resolve_backend(ProcessingBackend::Basic), ProcessingBackend::Basic);
        assert_eq!(create_backend(ProcessingBackend::Basic).name(), "basic");
    }

    #[test]
    fn test_auto_never_stays_auto() {
        let resolved = resolve_backend(ProcessingBackend::Auto);
        assert_ne!(resolved, ProcessingBackend::Auto);
        if accelerated_available() {
            assert_eq!(resolved, ProcessingBackend::Accelerated);
        } else {
            assert_eq!(resolved, ProcessingBackend::Basic);
        }
    }

    #[test]
    fn test_accelerated_request_resolves_to_available_backend() {
        let backend = create_backend(ProcessingBackend::Accelerated);
        let expected = if accelerated_available() { "accelerated" } else { "basic" };
        assert_eq!(backend.name(), expected);
    }

    #[test]
    fn test_default_close_fills_single_pixel_gap() {
        let backend = BasicBackend::new();
        let mask = Mask::from_fn(11, 11, |x, y| (2..9).contains(&y) && (2..9).contains(&x) && x != 5);
        let closed = backend.close(&mask, 3, 1);
        assert!(closed.get(5, 5));
        assert!(!closed.get(0, 0));
    }
}
