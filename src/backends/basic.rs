//! Pure ndarray mask backend
//!
//! Square structuring elements are separable, so dilation and erosion run
//! as a row pass followed by a column pass.

use super::MaskBackend;
use crate::{
    config::Connectivity,
    types::{LabelGrid, Mask},
};
use image::GrayImage;
use ndarray::{Array2, ArrayViewMut1, Axis};
use std::collections::VecDeque;

/// Backend using only ndarray operations
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicBackend;

impl BasicBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Window offsets `[-(k/2), k - 1 - k/2]` for a kernel of size `k`
fn window(kernel: u32) -> (isize, isize) {
    let k = kernel.max(1) as isize;
    (-(k / 2), k - 1 - k / 2)
}

/// One 1-D pass over a lane; out-of-range neighbours are skipped
fn morph_lane(lane: &mut ArrayViewMut1<'_, bool>, scratch: &mut Vec<bool>, kernel: u32, dilate: bool) {
    let (lo, hi) = window(kernel);
    scratch.clear();
    scratch.extend(lane.iter().copied());
    let len = scratch.len() as isize;

    for (i, out) in lane.iter_mut().enumerate() {
        let i = i as isize;
        let start = (i + lo).max(0) as usize;
        let end = (i + hi).min(len - 1);
        if end < 0 || (start as isize) > end {
            continue;
        }
        let neighbours = scratch.get(start..=end as usize).unwrap_or(&[]);
        *out = if dilate {
            neighbours.iter().any(|&v| v)
        } else {
            neighbours.iter().all(|&v| v)
        };
    }
}

fn morph(mask: &Mask, kernel: u32, iterations: u32, dilate: bool) -> Mask {
    let mut data: Array2<bool> = mask.as_array().clone();
    if kernel <= 1 {
        return Mask::from_array(data);
    }

    let mut scratch = Vec::new();
    for _ in 0..iterations {
        for axis in [Axis(1), Axis(0)] {
            for mut lane in data.lanes_mut(axis) {
                morph_lane(&mut lane, &mut scratch, kernel, dilate);
            }
        }
    }
    Mask::from_array(data)
}

/// Flood-fill labelling in raster order of each region's first pixel
pub(crate) fn label_components(mask: &Mask, connectivity: Connectivity) -> LabelGrid {
    let source = mask.as_array();
    let (rows, cols) = source.dim();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut next_label = 0_u32;
    let mut queue = VecDeque::new();

    let offsets: &[(isize, isize)] = match connectivity {
        Connectivity::Four => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
        Connectivity::Eight => &[
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ],
    };

    for ((y, x), &set) in source.indexed_iter() {
        if !set || labels[[y, x]] != 0 {
            continue;
        }

        next_label += 1;
        labels[[y, x]] = next_label;
        queue.push_back((y, x));

        while let Some((cy, cx)) = queue.pop_front() {
            for &(dy, dx) in offsets {
                let ny = cy as isize + dy;
                let nx = cx as isize + dx;
                if ny < 0 || nx < 0 || ny >= rows as isize || nx >= cols as isize {
                    continue;
                }
                let (ny, nx) = (ny as usize, nx as usize);
                if source[[ny, nx]] && labels[[ny, nx]] == 0 {
                    labels[[ny, nx]] = next_label;
                    queue.push_back((ny, nx));
                }
            }
        }
    }

    LabelGrid {
        labels,
        region_count: next_label,
    }
}

/// Otsu's method over a 256-bin histogram
///
/// Returns the level `t` maximising between-class variance for the classes
/// `[0, t]` and `(t, 255]`; the lowest such level wins ties.
pub(crate) fn otsu_from_histogram(histogram: &[u64; 256]) -> u8 {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_count = 0_u64;
    let mut background_sum = 0.0_f64;
    let mut best_level = 0_u8;
    let mut best_variance = -1.0_f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_count += count;
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_count as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_count as f64;
        let variance = background_count as f64
            * foreground_count as f64
            * (background_mean - foreground_mean).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

impl MaskBackend for BasicBackend {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn dilate(&self, mask: &Mask, kernel: u32, iterations: u32) -> Mask {
        morph(mask, kernel, iterations, true)
    }

    fn erode(&self, mask: &Mask, kernel: u32, iterations: u32) -> Mask {
        morph(mask, kernel, iterations, false)
    }

    fn label(&self, mask: &Mask, connectivity: Connectivity) -> LabelGrid {
        label_components(mask, connectivity)
    }

    fn otsu_level(&self, gray: &GrayImage) -> u8 {
        let mut histogram = [0_u64; 256];
        for pixel in gray.pixels() {
            if let Some(bin) = histogram.get_mut(usize::from(pixel[0])) {
                *bin += 1;
            }
        }
        otsu_from_histogram(&histogram)
    }
}
