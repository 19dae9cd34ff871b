//! Garment-region segmentation stages
//!
//! Stages run in order: edges, region extraction and filtering, skin and
//! anatomical exclusion, cleanup, then optional element subdivision. Each
//! stage allocates fresh masks; nothing is cached between calls.

pub mod cleanup;
pub mod edges;
pub mod elements;
pub mod exclusion;
pub mod regions;

pub use cleanup::MaskCleaner;
pub use edges::EdgeDetector;
pub use elements::{Element, ElementColors, ElementRegionDetector, ElementRegions};
pub use exclusion::{AnatomicalExcluder, SkinExcluder};
pub use regions::{RegionExtractor, RegionFilter, RegionSummary};

use image::{DynamicImage, GrayImage, Luma, RgbImage};

/// `0.299 R + 0.587 G + 0.114 B` scaled by 2^16
fn luma_601([r, g, b]: [u8; 3]) -> u8 {
    let weighted = 19_595 * u32::from(r) + 38_470 * u32::from(g) + 7_471 * u32::from(b) + 0x8000;
    (weighted >> 16) as u8
}

/// Decoded sketch in its processing color model
#[derive(Debug, Clone)]
pub enum SketchImage {
    Rgb(RgbImage),
    Gray(GrayImage),
}

impl SketchImage {
    /// Classify a decoded image; alpha is dropped and 16-bit data is narrowed
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::Gray(gray.clone()),
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => Self::Gray(image.to_luma8()),
            _ => Self::Rgb(image.to_rgb8()),
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Rgb(rgb) => rgb.dimensions(),
            Self::Gray(gray) => gray.dimensions(),
        }
    }

    #[must_use]
    pub fn is_grayscale(&self) -> bool {
        matches!(self, Self::Gray(_))
    }

    /// Luma intensity with ITU-R 601 weights, rounded in 16-bit fixed point
    #[must_use]
    pub fn gray(&self) -> GrayImage {
        match self {
            Self::Rgb(rgb) => GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                Luma([luma_601(rgb.get_pixel(x, y).0)])
            }),
            Self::Gray(gray) => gray.clone(),
        }
    }

    /// RGB view of the sketch; grayscale is replicated across channels
    #[must_use]
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Self::Rgb(rgb) => rgb.clone(),
            Self::Gray(gray) => DynamicImage::ImageLuma8(gray.clone()).to_rgb8(),
        }
    }

    /// The RGB buffer when the sketch has color, for skin classification
    #[must_use]
    pub fn as_rgb(&self) -> Option<&RgbImage> {
        match self {
            Self::Rgb(rgb) => Some(rgb),
            Self::Gray(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{LumaA, Rgb, Rgba};

    #[test]
    fn test_grayscale_detection() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([10])));
        assert!(SketchImage::from_dynamic(&gray).is_grayscale());

        let gray_alpha = DynamicImage::ImageLumaA8(image::ImageBuffer::from_pixel(2, 2, LumaA([10, 255])));
        assert!(SketchImage::from_dynamic(&gray_alpha).is_grayscale());

        let rgba = DynamicImage::ImageRgba8(image::ImageBuffer::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        let sketch = SketchImage::from_dynamic(&rgba);
        assert!(!sketch.is_grayscale());
        assert_eq!(sketch.as_rgb().unwrap().get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_gray_sketch_to_rgb() {
        let sketch = SketchImage::Gray(GrayImage::from_pixel(3, 1, Luma([77])));
        assert_eq!(sketch.to_rgb().get_pixel(2, 0), &Rgb([77, 77, 77]));
        assert_eq!(sketch.dimensions(), (3, 1));
        assert!(sketch.as_rgb().is_none());
    }

    #[test]
    fn test_white_rgb_stays_white_in_gray() {
        let sketch = SketchImage::Rgb(RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));
        assert_eq!(sketch.gray().get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_green_ink_reads_as_line_intensity() {
        let sketch = SketchImage::Rgb(RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([0, 150, 0]),
            1 => Rgb([255, 0, 0]),
            _ => Rgb([0, 0, 255]),
        }));
        let gray = sketch.gray();
        // Green-weighted ink falls under the default line threshold of 100
        assert_eq!(gray.get_pixel(0, 0)[0], 88);
        assert_eq!(gray.get_pixel(1, 0)[0], 76);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }
}
