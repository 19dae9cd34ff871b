//! Geometric subdivision of the garment mask into named elements
//!
//! Zones are positional heuristics over the whole image, not semantic
//! segmentation. Only elements that carry a usable color are materialised;
//! `main` is whatever remains of the mask after those.

use crate::{
    backends::MaskBackend,
    color::TargetColor,
    error::{ColorizeError, Result},
    types::Mask,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, warn};

/// Named garment element, declared in lookup priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Straps,
    Collar,
    Trim,
    Main,
}

impl Element {
    /// Lookup priority, first match wins
    pub const PRIORITY: [Element; 4] = [Element::Straps, Element::Collar, Element::Trim, Element::Main];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Straps => "straps",
            Self::Collar => "collar",
            Self::Trim => "trim",
            Self::Main => "main",
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Element {
    type Err = ColorizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "straps" | "strap" => Ok(Self::Straps),
            "collar" => Ok(Self::Collar),
            "trim" => Ok(Self::Trim),
            "main" | "body" => Ok(Self::Main),
            other => Err(ColorizeError::invalid_config(format!(
                "Unknown garment element '{}' (expected main, straps, collar or trim)",
                other
            ))),
        }
    }
}

/// Parsed per-element target colors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementColors {
    colors: BTreeMap<Element, TargetColor>,
}

impl ElementColors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw `element → color` strings
    ///
    /// Unknown element names and unparseable colors are skipped with a
    /// warning; affected pixels then get the default target color.
    #[must_use]
    pub fn from_raw(raw: &BTreeMap<String, String>) -> Self {
        let mut colors = BTreeMap::new();
        for (name, value) in raw {
            let element = match name.parse::<Element>() {
                Ok(element) => element,
                Err(e) => {
                    warn!(element = %name, "Ignoring element color: {}", e);
                    continue;
                },
            };
            match TargetColor::parse(value) {
                Some(color) => {
                    colors.insert(element, color);
                },
                None => warn!(element = %element, color = %value, "Unrecognised element color, using default"),
            }
        }
        Self { colors }
    }

    pub fn insert(&mut self, element: Element, color: TargetColor) {
        self.colors.insert(element, color);
    }

    #[must_use]
    pub fn get(&self, element: Element) -> Option<TargetColor> {
        self.colors.get(&element).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Elements with a color, in priority order
    #[must_use]
    pub fn elements(&self) -> Vec<Element> {
        self.colors.keys().copied().collect()
    }
}

/// Element masks derived from one garment mask
#[derive(Debug, Clone, Default)]
pub struct ElementRegions {
    regions: BTreeMap<Element, Mask>,
}

impl ElementRegions {
    #[must_use]
    pub fn get(&self, element: Element) -> Option<&Mask> {
        self.regions.get(&element)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Present elements in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Element, &Mask)> {
        self.regions.iter().map(|(element, mask)| (*element, mask))
    }

    /// First element in priority order containing the pixel
    #[must_use]
    pub fn element_at(&self, x: u32, y: u32) -> Option<Element> {
        self.regions
            .iter()
            .find(|(_, mask)| mask.get(x, y))
            .map(|(element, _)| *element)
    }

    /// Pixel counts per element
    #[must_use]
    pub fn pixel_counts(&self) -> Vec<(Element, usize)> {
        self.iter().map(|(element, mask)| (element, mask.count())).collect()
    }
}

/// Partitions a garment mask into collar, straps, trim and main
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementRegionDetector;

impl ElementRegionDetector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Trim band width for an image
    #[must_use]
    pub fn trim_band(width: u32, height: u32) -> u32 {
        (width.min(height) / 20).max(5)
    }

    /// Top quarter, middle half horizontally
    #[must_use]
    pub fn collar_zone(mask: &Mask) -> Mask {
        let (w, h) = mask.dimensions();
        Mask::from_fn(w, h, |x, y| mask.get(x, y) && y < h / 4 && x >= w / 4 && x < 3 * w / 4)
    }

    /// Top third, outer quarters horizontally
    #[must_use]
    pub fn straps_zone(mask: &Mask) -> Mask {
        let (w, h) = mask.dimensions();
        Mask::from_fn(w, h, |x, y| mask.get(x, y) && y < h / 3 && (x < w / 4 || x >= 3 * w / 4))
    }

    /// Mask pixels within one trim band of the mask boundary
    ///
    /// # Errors
    /// Never in practice; erosion preserves dimensions
    pub fn trim_zone(mask: &Mask, backend: &dyn MaskBackend) -> Result<Mask> {
        let band = Self::trim_band(mask.width(), mask.height());
        let eroded = backend.erode(mask, band, 1);
        mask.and_not(&eroded)
    }

    /// Compute masks for `elements`
    ///
    /// Empty element masks are omitted; `main` subtracts every other
    /// requested element.
    ///
    /// # Errors
    /// Internal mask dimension mismatch
    pub fn detect(&self, mask: &Mask, elements: &[Element], backend: &dyn MaskBackend) -> Result<ElementRegions> {
        let mut regions = BTreeMap::new();

        for &element in elements {
            let zone = match element {
                Element::Collar => Self::collar_zone(mask),
                Element::Straps => Self::straps_zone(mask),
                Element::Trim => Self::trim_zone(mask, backend)?,
                Element::Main => continue,
            };
            if !zone.is_empty() {
                regions.insert(element, zone);
            }
        }

        if elements.contains(&Element::Main) {
            let mut main = mask.clone();
            for zone in regions.values() {
                main = main.and_not(zone)?;
            }
            if !main.is_empty() {
                regions.insert(Element::Main, main);
            }
        }

        let detected = ElementRegions { regions };
        debug!(regions = ?detected.pixel_counts(), "Detected element regions");
        Ok(detected)
    }
}
