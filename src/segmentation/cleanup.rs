//! Final mask stabilisation

use crate::{backends::MaskBackend, config::Connectivity, types::Mask};
use tracing::debug;

const CLOSING_KERNEL: u32 = 5;

/// Morphological close followed by small-component removal
#[derive(Debug, Clone, Copy)]
pub struct MaskCleaner {
    min_area: usize,
    connectivity: Connectivity,
}

impl MaskCleaner {
    #[must_use]
    pub fn new(min_area: usize, connectivity: Connectivity) -> Self {
        Self { min_area, connectivity }
    }

    /// Drop connected components with fewer than `min_area` pixels
    #[must_use]
    pub fn remove_small_components(&self, mask: &Mask, backend: &dyn MaskBackend) -> Mask {
        let grid = backend.label(mask, self.connectivity);
        let mut areas = vec![0_usize; grid.region_count as usize + 1];
        for &label in &grid.labels {
            if let Some(area) = areas.get_mut(label as usize) {
                *area += 1;
            }
        }

        let removed = areas
            .iter()
            .skip(1)
            .filter(|&&area| area > 0 && area < self.min_area)
            .count();
        if removed > 0 {
            debug!(removed, "Removed small components after closing");
        }

        Mask::from_array(grid.labels.mapv(|label| {
            label != 0 && areas.get(label as usize).is_some_and(|&area| area >= self.min_area)
        }))
    }

    /// Close with a 5×5 square, then remove small components
    #[must_use]
    pub fn clean(&self, mask: &Mask, backend: &dyn MaskBackend) -> Mask {
        if mask.is_empty() {
            return mask.clone();
        }
        let closed = backend.close(mask, CLOSING_KERNEL, 1);
        self.remove_small_components(&closed, backend)
    }
}
