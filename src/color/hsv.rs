//! RGB and HSV conversion
//!
//! Hue is in degrees `[0, 360)`, saturation in `[0, 1]` and value is the
//! maximum channel on the byte scale. Converting back with an integral value
//! reproduces that value exactly as the largest output channel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

impl Hsv {
    #[must_use]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == rf {
            60.0 * ((gf - bf) / delta).rem_euclid(6.0)
        } else if max == gf {
            60.0 * ((bf - rf) / delta + 2.0)
        } else {
            60.0 * ((rf - gf) / delta + 4.0)
        };

        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        Self {
            hue: if hue >= 360.0 { hue - 360.0 } else { hue },
            saturation,
            value: max,
        }
    }

    /// Saturation on the 0-255 byte scale
    #[must_use]
    pub fn saturation_byte(&self) -> f32 {
        self.saturation * 255.0
    }

    /// Same hue and saturation with a different value
    #[must_use]
    pub fn with_value(self, value: f32) -> Self {
        Self { value, ..self }
    }

    #[must_use]
    pub fn to_rgb(&self) -> [u8; 3] {
        let value = self.value.clamp(0.0, 255.0);
        let chroma = value * self.saturation.clamp(0.0, 1.0);
        let sector = self.hue.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
        let m = value - chroma;

        let (r, g, b) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let to_byte = |c: f32| (c + m).round().clamp(0.0, 255.0) as u8;
        [to_byte(r), to_byte(g), to_byte(b)]
    }
}
