//! Skin-tone and anatomical exclusion

use crate::{
    backends::MaskBackend,
    color::Hsv,
    config::{AnatomicalZone, ColorizationConfig, SkinToneRange},
    garment::GarmentCategory,
    types::Mask,
};
use image::RgbImage;
use tracing::debug;

/// Removes skin-toned pixels, grown by a protection margin, from the mask
#[derive(Debug, Clone, Copy)]
pub struct SkinExcluder {
    range: SkinToneRange,
    kernel: u32,
    iterations: u32,
}

impl SkinExcluder {
    #[must_use]
    pub fn new(range: SkinToneRange, kernel: u32, iterations: u32) -> Self {
        Self {
            range,
            kernel,
            iterations,
        }
    }

    /// Build from configuration; dilation follows `skin_protection`
    #[must_use]
    pub fn from_config(config: &ColorizationConfig) -> Self {
        let (kernel, iterations) = config.skin_dilation();
        Self::new(config.skin_tone, kernel, iterations)
    }

    /// Dilation kernel size and iteration count
    #[must_use]
    pub fn dilation(&self) -> (u32, u32) {
        (self.kernel, self.iterations)
    }

    /// Pixels inside the skin-tone HSV box
    #[must_use]
    pub fn skin_mask(&self, rgb: &RgbImage) -> Mask {
        Mask::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            let hsv = Hsv::from_rgb(r, g, b);
            self.range.contains(hsv.hue, hsv.saturation_byte(), hsv.value)
        })
    }

    /// Skin mask grown by the protection margin
    #[must_use]
    pub fn protected_zone(&self, rgb: &RgbImage, backend: &dyn MaskBackend) -> Mask {
        backend.dilate(&self.skin_mask(rgb), self.kernel, self.iterations)
    }

    /// Remove the protected skin zone from `mask`
    ///
    /// # Errors
    /// Mask dimensions differ from the image
    pub fn exclude(&self, rgb: &RgbImage, mask: &Mask, backend: &dyn MaskBackend) -> crate::Result<Mask> {
        let zone = self.protected_zone(rgb, backend);
        debug!(skin_pixels = zone.count(), "Skin zone");
        mask.and_not(&zone)
    }
}

/// Clears a fixed zone for garments whose category calls for it
#[derive(Debug, Clone, Copy)]
pub struct AnatomicalExcluder {
    zone: AnatomicalZone,
}

impl AnatomicalExcluder {
    #[must_use]
    pub fn new(zone: AnatomicalZone) -> Self {
        Self { zone }
    }

    #[must_use]
    pub fn exclude(&self, mask: &Mask, category: GarmentCategory) -> Mask {
        let mut out = mask.clone();
        if category.requires_anatomical_exclusion() {
            let (x0, y0, x1, y1) = self.zone.rect(mask.width(), mask.height());
            debug!(x0, y0, x1, y1, category = %category, "Clearing anatomical zone");
            out.clear_rect(x0, y0, x1, y1);
        }
        out
    }
}
