//! Synthetic sketch builders shared by the integration tests

#![allow(dead_code)]

use garment_colorize::{ColorizationConfig, ColorizationRequest, ColorizationResult, SketchColorizer};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const SKIN: Rgb<u8> = Rgb([230, 160, 140]);

/// Whether `(x, y)` lies on the outline of the half-open rect `[x0, x1) × [y0, y1)`
///
/// Coordinates are signed so outlines may extend past the canvas.
pub fn on_outline(x: i64, y: i64, rect: (i64, i64, i64, i64), thickness: i64) -> bool {
    let (x0, y0, x1, y1) = rect;
    let inside = (x0..x1).contains(&x) && (y0..y1).contains(&y);
    let near_edge = x < x0 + thickness || x >= x1 - thickness || y < y0 + thickness || y >= y1 - thickness;
    inside && near_edge
}

/// White canvas with one black rectangle outline
pub fn outlined_rect(width: u32, height: u32, rect: (i64, i64, i64, i64), thickness: i64) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if on_outline(i64::from(x), i64::from(y), rect, thickness) {
            BLACK
        } else {
            WHITE
        }
    })
}

/// Grayscale version of [`outlined_rect`]
pub fn outlined_rect_gray(width: u32, height: u32, rect: (i64, i64, i64, i64), thickness: i64) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if on_outline(i64::from(x), i64::from(y), rect, thickness) {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Fill a half-open rectangle with one color
pub fn fill_rect(image: &mut RgbImage, rect: (u32, u32, u32, u32), color: Rgb<u8>) {
    let (x0, y0, x1, y1) = rect;
    for y in y0..y1.min(image.height()) {
        for x in x0..x1.min(image.width()) {
            image.put_pixel(x, y, color);
        }
    }
}

/// 400×600 page with a closed 3px outline at (100,150)-(300,450)
pub fn scenario_a() -> RgbImage {
    outlined_rect(400, 600, (100, 150, 300, 450), 3)
}

/// 220×220 page whose enclosed region is roughly 200×200
pub fn large_garment() -> RgbImage {
    outlined_rect(220, 220, (5, 5, 215, 215), 3)
}

/// Run the pipeline with the given config, panicking on error
pub fn colorize(image: RgbImage, request: &ColorizationRequest, config: ColorizationConfig) -> ColorizationResult {
    SketchColorizer::new(config)
        .unwrap()
        .colorize(&DynamicImage::ImageRgb8(image), request)
        .unwrap()
}

/// BT.601 luma of an RGB pixel, scaled by 1000
pub fn luma(pixel: Rgb<u8>) -> u32 {
    let [r, g, b] = pixel.0;
    299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)
}
