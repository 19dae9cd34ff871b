//! Color-science description and representative color sampling

use super::TargetColor;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// D65 reference white
const WHITE_POINT: [f64; 3] = [0.95047, 1.0, 1.08883];

/// Coarse color family of an RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFamily {
    Red,
    Green,
    Blue,
    Neutral,
    Mixed,
}

impl ColorFamily {
    /// Classify by dominant channel
    ///
    /// A channel dominates when it is the maximum and exceeds both others
    /// by more than 30. Otherwise the color is neutral when adjacent channel
    /// spreads are both below 20.
    #[must_use]
    pub fn classify(color: TargetColor) -> Self {
        let (r, g, b) = (i32::from(color.r), i32::from(color.g), i32::from(color.b));
        let max = r.max(g).max(b);

        if r == max && r > g + 30 && r > b + 30 {
            Self::Red
        } else if g == max && g > r + 30 && g > b + 30 {
            Self::Green
        } else if b == max && b > r + 30 && b > g + 30 {
            Self::Blue
        } else if (r - g).abs() < 20 && (g - b).abs() < 20 {
            Self::Neutral
        } else {
            Self::Mixed
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Neutral => "Gray/Neutral",
            Self::Mixed => "Complex/Mixed",
        }
    }
}

impl std::fmt::Display for ColorFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Serializable description of a color for reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorDescription {
    pub hex: String,
    pub rgb: [u8; 3],
    /// CIELAB `[L, a, b]`, rounded to two decimals
    pub lab: [f64; 3],
    pub family: ColorFamily,
}

/// Convert sRGB to CIELAB under D65
#[must_use]
pub fn rgb_to_lab(color: TargetColor) -> [f64; 3] {
    let linear = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let (r, g, b) = (linear(color.r), linear(color.g), linear(color.b));

    let x = (r * 0.412_456_4 + g * 0.357_576_1 + b * 0.180_437_5) / WHITE_POINT[0];
    let y = (r * 0.212_672_9 + g * 0.715_152_2 + b * 0.072_175_0) / WHITE_POINT[1];
    let z = (r * 0.019_333_9 + g * 0.119_192_0 + b * 0.950_304_1) / WHITE_POINT[2];

    let f = |t: f64| {
        if t > 0.008_856 {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    };
    let (fx, fy, fz) = (f(x), f(y), f(z));

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Describe a color: hex, rounded Lab and family
#[must_use]
pub fn describe(color: TargetColor) -> ColorDescription {
    let round2 = |v: f64| (v * 100.0).round() / 100.0;
    let lab = rgb_to_lab(color);
    ColorDescription {
        hex: color.to_hex(),
        rgb: color.channels(),
        lab: [round2(lab[0]), round2(lab[1]), round2(lab[2])],
        family: ColorFamily::classify(color),
    }
}

/// How to pick a representative color from an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleMethod {
    /// Mean of pixels that are neither near-black nor near-white
    #[default]
    Dominant,
    /// Mean of the central half-size box
    Center,
}

/// Extract a representative color; `None` for an empty image
///
/// Channel means are truncated toward zero.
#[must_use]
pub fn sample_color(image: &RgbImage, method: SampleMethod) -> Option<TargetColor> {
    match method {
        SampleMethod::Dominant => {
            let channel_sum = |p: &image::Rgb<u8>| p.0.iter().map(|&c| u32::from(c)).sum::<u32>();
            let filtered = mean_color(
                image
                    .pixels()
                    .filter(|p| (51..700).contains(&channel_sum(p)))
                    .map(|p| p.0),
            );
            filtered.or_else(|| mean_color(image.pixels().map(|p| p.0)))
        }
        SampleMethod::Center => {
            let (w, h) = image.dimensions();
            let (x0, x1, y0, y1) = (w / 4, 3 * w / 4, h / 4, 3 * h / 4);
            mean_color(
                image
                    .enumerate_pixels()
                    .filter(|(x, y, _)| (x0..x1).contains(x) && (y0..y1).contains(y))
                    .map(|(_, _, p)| p.0),
            )
        }
    }
}

fn mean_color<I>(pixels: I) -> Option<TargetColor>
where
    I: Iterator<Item = [u8; 3]>,
{
    let (count, sums) = pixels.fold((0_u64, [0_u64; 3]), |(n, mut acc), px| {
        for (sum, &c) in acc.iter_mut().zip(px.iter()) {
            *sum += u64::from(c);
        }
        (n + 1, acc)
    });

    if count == 0 {
        return None;
    }

    let channel = |i: usize| (sums.get(i).copied().unwrap_or(0) / count) as u8;
    Some(TargetColor::new(channel(0), channel(1), channel(2)))
}
