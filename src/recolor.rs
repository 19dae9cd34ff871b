//! Brightness-preserving recoloring of masked pixels

use crate::{
    color::{Hsv, TargetColor},
    config::BlendMode,
    error::{ColorizeError, Result},
    segmentation::{Element, ElementColors, ElementRegions, SketchImage},
    types::Mask,
};
use image::RgbImage;
use ndarray::{ArrayView2, ArrayViewMut3, Axis, Zip};
use tracing::debug;

/// Weight of the full target color in the shaded blend
const BASE_WEIGHT: f32 = 0.6;
/// Weight of the original grayscale brightness in the shaded blend
const BRIGHTNESS_WEIGHT: f32 = 0.4;

/// Target color prepared for per-pixel application
#[derive(Debug, Clone, Copy)]
struct Paint {
    channels: [f32; 3],
    hsv: Hsv,
}

impl Paint {
    fn new(color: TargetColor) -> Self {
        let [r, g, b] = color.channels();
        Self {
            channels: [f32::from(r), f32::from(g), f32::from(b)],
            hsv: color.to_hsv(),
        }
    }

    fn apply(&self, mode: BlendMode, gray: u8, original_value: u8) -> [u8; 3] {
        match mode {
            BlendMode::Shaded => {
                let factor = BASE_WEIGHT + BRIGHTNESS_WEIGHT * f32::from(gray) / 255.0;
                self.channels
                    .map(|channel| (channel * factor).round().clamp(0.0, 255.0) as u8)
            },
            BlendMode::HueSaturation => self.hsv.with_value(f32::from(original_value)).to_rgb(),
        }
    }
}

/// Per-element colors paired with their masks, in lookup priority order
struct ElementPaints<'a> {
    regions: &'a ElementRegions,
    paints: Vec<(Element, Paint)>,
}

impl ElementPaints<'_> {
    fn paint_at(&self, x: u32, y: u32) -> Option<&Paint> {
        let element = self.regions.element_at(x, y)?;
        self.paints
            .iter()
            .find(|(candidate, _)| *candidate == element)
            .map(|(_, paint)| paint)
    }
}

/// Writes target colors into masked pixels while keeping shading
#[derive(Debug, Clone, Copy, Default)]
pub struct Recolorizer {
    mode: BlendMode,
}

impl Recolorizer {
    #[must_use]
    pub fn new(mode: BlendMode) -> Self {
        Self { mode }
    }

    /// Recolor `mask` pixels of `sketch`
    ///
    /// Element colors, when given, are looked up in priority order; masked
    /// pixels outside every element region get `default`. Pixels outside the
    /// mask are copied unchanged. Grayscale sketches produce RGB output.
    ///
    /// # Errors
    /// - Mask dimensions differ from the sketch
    pub fn recolor(
        &self,
        sketch: &SketchImage,
        mask: &Mask,
        default: TargetColor,
        elements: Option<(&ElementRegions, &ElementColors)>,
    ) -> Result<RgbImage> {
        let (width, height) = sketch.dimensions();
        if mask.dimensions() != (width, height) {
            return Err(ColorizeError::processing(format!(
                "Mask {:?} does not match sketch {}x{}",
                mask.dimensions(),
                width,
                height
            )));
        }

        let mut output = sketch.to_rgb();
        if mask.is_empty() {
            debug!("Empty garment mask, image left unchanged");
            return Ok(output);
        }

        let default_paint = Paint::new(default);
        let element_paints = elements.map(|(regions, colors)| ElementPaints {
            regions,
            paints: regions
                .iter()
                .filter_map(|(element, _)| colors.get(element).map(|color| (element, Paint::new(color))))
                .collect(),
        });

        let gray = sketch.gray();
        let shape = (height as usize, width as usize);
        let gray_view = ArrayView2::from_shape(shape, gray.as_raw())
            .map_err(|e| ColorizeError::internal(format!("Grayscale buffer layout: {}", e)))?;
        let mut pixels = ArrayViewMut3::from_shape((shape.0, shape.1, 3), &mut *output)
            .map_err(|e| ColorizeError::internal(format!("RGB buffer layout: {}", e)))?;

        let mode = self.mode;
        Zip::indexed(pixels.lanes_mut(Axis(2)))
            .and(mask.as_array())
            .and(&gray_view)
            .for_each(|(y, x), mut pixel, &selected, &intensity| {
                if !selected {
                    return;
                }
                let paint = element_paints
                    .as_ref()
                    .and_then(|paints| paints.paint_at(x as u32, y as u32))
                    .unwrap_or(&default_paint);
                let original_value = pixel.iter().copied().max().unwrap_or(0);
                let recolored = paint.apply(mode, intensity, original_value);
                for (channel, value) in pixel.iter_mut().zip(recolored) {
                    *channel = value;
                }
            });

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BasicBackend;
    use crate::segmentation::ElementRegionDetector;
    use image::{GrayImage, Luma, Rgb};

    fn white(width: u32, height: u32) -> SketchImage {
        SketchImage::Rgb(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    #[test]
    fn test_shaded_blend_on_white_is_full_color() {
        let mask = Mask::filled(4, 4, true);
        let out = Recolorizer::default()
            .recolor(&white(4, 4), &mask, TargetColor::new(255, 0, 0), None)
            .unwrap();
        assert!(out.pixels().all(|p| p.0 == [255, 0, 0]));
    }

    #[test]
    fn test_shaded_blend_darkens_with_shading() {
        let sketch = SketchImage::Gray(GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 128 }])));
        let mask = Mask::filled(2, 1, true);
        let out = Recolorizer::default()
            .recolor(&sketch, &mask, TargetColor::new(200, 100, 50), None)
            .unwrap();
        // factor 0.6 for black, 0.6 + 0.4 * 128/255 for mid gray
        assert_eq!(out.get_pixel(0, 0).0, [120, 60, 30]);
        assert_eq!(out.get_pixel(1, 0).0, [160, 80, 40]);
    }

    #[test]
    fn test_unmasked_pixels_untouched() {
        let mut rgb = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        rgb.put_pixel(2, 0, Rgb([10, 20, 30]));
        let mask = Mask::from_fn(3, 1, |x, _| x == 0);
        let out = Recolorizer::default()
            .recolor(&SketchImage::Rgb(rgb), &mask, TargetColor::new(0, 0, 255), None)
            .unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(2, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_empty_mask_returns_copy() {
        let sketch = white(5, 5);
        let out = Recolorizer::default()
            .recolor(&sketch, &Mask::new(5, 5), TargetColor::new(255, 0, 0), None)
            .unwrap();
        assert_eq!(out, sketch.to_rgb());
    }

    #[test]
    fn test_mask_size_mismatch_is_error() {
        let result = Recolorizer::default().recolor(&white(5, 5), &Mask::new(4, 5), TargetColor::DEFAULT, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_hue_saturation_keeps_value() {
        let rgb = RgbImage::from_pixel(1, 1, Rgb([100, 100, 100]));
        let mask = Mask::filled(1, 1, true);
        let out = Recolorizer::new(BlendMode::HueSaturation)
            .recolor(&SketchImage::Rgb(rgb), &mask, TargetColor::new(255, 0, 0), None)
            .unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [100, 0, 0]);
    }

    #[test]
    fn test_hue_saturation_is_fixed_point() {
        let rgb = RgbImage::from_fn(8, 8, |x, y| {
            let v = (40 + x * 20 + y * 5) as u8;
            Rgb([v, v.saturating_sub(30), v / 2])
        });
        let mask = Mask::filled(8, 8, true);
        let recolorizer = Recolorizer::new(BlendMode::HueSaturation);
        let target = TargetColor::new(255, 105, 180);

        let once = recolorizer
            .recolor(&SketchImage::Rgb(rgb), &mask, target, None)
            .unwrap();
        let twice = recolorizer
            .recolor(&SketchImage::Rgb(once.clone()), &mask, target, None)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_element_colors_override_default() {
        let mask = Mask::filled(100, 100, true);
        let mut colors = ElementColors::new();
        colors.insert(Element::Straps, TargetColor::new(0, 0, 0));
        let regions = ElementRegionDetector::new()
            .detect(&mask, &colors.elements(), &BasicBackend::new())
            .unwrap();

        let out = Recolorizer::default()
            .recolor(&white(100, 100), &mask, TargetColor::new(255, 105, 180), Some((&regions, &colors)))
            .unwrap();
        assert_eq!(out.get_pixel(5, 5).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(50, 5).0, [255, 105, 180]);
        assert_eq!(out.get_pixel(5, 50).0, [255, 105, 180]);
    }
}
