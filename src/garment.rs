//! Garment categories and category-dependent behavior

use crate::color::TargetColor;
use serde::{Deserialize, Serialize};

/// Closed set of garment categories the pipeline distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentCategory {
    Bodysuit,
    Corset,
    Bustier,
    Swimwear,
    Tops,
    #[default]
    Unknown,
}

impl GarmentCategory {
    /// Classify free text such as an upstream classifier's garment type
    ///
    /// Keywords are matched case-insensitively in priority order, so
    /// `"corset bodysuit"` is a corset.
    #[must_use]
    pub fn from_description(text: &str) -> Self {
        let text = text.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

        if has(&["corset"]) {
            Self::Corset
        } else if has(&["bodysuit", "teddy"]) {
            Self::Bodysuit
        } else if has(&["bustier"]) {
            Self::Bustier
        } else if has(&["swimsuit", "swimwear", "leotard", "bikini"]) {
            Self::Swimwear
        } else if has(&["top", "shirt", "blouse", "jacket", "coat"]) {
            Self::Tops
        } else {
            Self::Unknown
        }
    }

    /// Resolve an optional category string, defaulting to `Unknown`
    #[must_use]
    pub fn from_optional(text: Option<&str>) -> Self {
        text.map_or(Self::Unknown, Self::from_description)
    }

    /// Whether the crotch-seam zone is cleared from the mask
    #[must_use]
    pub fn requires_anatomical_exclusion(self) -> bool {
        match self {
            Self::Bodysuit | Self::Corset => true,
            Self::Bustier | Self::Swimwear | Self::Tops | Self::Unknown => false,
        }
    }

    /// Fallback palette color when the caller opts into category colors
    #[must_use]
    pub fn palette_color(self) -> TargetColor {
        match self {
            Self::Corset => TargetColor::new(220, 20, 60),
            Self::Bustier => TargetColor::new(255, 69, 0),
            Self::Swimwear => TargetColor::new(0, 191, 255),
            Self::Bodysuit => TargetColor::new(138, 43, 226),
            Self::Tops | Self::Unknown => TargetColor::new(255, 192, 157),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bodysuit => "bodysuit",
            Self::Corset => "corset",
            Self::Bustier => "bustier",
            Self::Swimwear => "swimwear",
            Self::Tops => "tops",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
