//! The fixed set of filter effects a photo can carry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named image filter attached to a photo at upload time.
///
/// The set is closed: names are matched exactly and anything else is
/// rejected during form validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterEffect {
    Blur,
    Contour,
    Detail,
    EdgeEnhance,
    EdgeEnhanceMore,
    Emboss,
    FindEdges,
    Sharpen,
    Smooth,
    SmoothMore,
}

impl FilterEffect {
    /// Every supported effect, in declaration order.
    pub const ALL: [FilterEffect; 10] = [
        FilterEffect::Blur,
        FilterEffect::Contour,
        FilterEffect::Detail,
        FilterEffect::EdgeEnhance,
        FilterEffect::EdgeEnhanceMore,
        FilterEffect::Emboss,
        FilterEffect::FindEdges,
        FilterEffect::Sharpen,
        FilterEffect::Smooth,
        FilterEffect::SmoothMore,
    ];

    /// Wire name of the effect (e.g. `"EDGE_ENHANCE"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterEffect::Blur => "BLUR",
            FilterEffect::Contour => "CONTOUR",
            FilterEffect::Detail => "DETAIL",
            FilterEffect::EdgeEnhance => "EDGE_ENHANCE",
            FilterEffect::EdgeEnhanceMore => "EDGE_ENHANCE_MORE",
            FilterEffect::Emboss => "EMBOSS",
            FilterEffect::FindEdges => "FIND_EDGES",
            FilterEffect::Sharpen => "SHARPEN",
            FilterEffect::Smooth => "SMOOTH",
            FilterEffect::SmoothMore => "SMOOTH_MORE",
        }
    }
}

impl fmt::Display for FilterEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name is not one of [`FilterEffect::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilterEffect(pub String);

impl fmt::Display for UnknownFilterEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" is not a valid choice.", self.0)
    }
}

impl std::error::Error for UnknownFilterEffect {}

impl FromStr for FilterEffect {
    type Err = UnknownFilterEffect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterEffect::ALL
            .iter()
            .copied()
            .find(|effect| effect.as_str() == s)
            .ok_or_else(|| UnknownFilterEffect(s.to_string()))
    }
}
