//! Engine-wide settings that individual effects do not carry themselves.

use serde::{Deserialize, Serialize};

use crate::convolve::BoundaryPolicy;
use crate::histogram::MAX_CHART_SIDE;
use crate::types::{Dimensions, EffectsError};

/// Configuration shared by every effect the engine applies.
///
/// Missing fields deserialize to their defaults, so a host can send
/// `{}` or override a single setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Amount added to each color channel at the bright edge of a light
    /// leak.
    pub light_leak_strength: f32,

    /// Width of a rendered histogram chart in pixels.
    pub histogram_width: u32,

    /// Height of a rendered histogram chart in pixels.
    pub histogram_height: u32,

    /// How convolution samples beyond the image edge.
    pub boundary: BoundaryPolicy,
}

impl EngineConfig {
    /// Default for [`light_leak_strength`](Self::light_leak_strength).
    pub const DEFAULT_LIGHT_LEAK_STRENGTH: f32 = 50.0;

    /// Default for [`histogram_width`](Self::histogram_width): one column
    /// per bucket.
    pub const DEFAULT_HISTOGRAM_WIDTH: u32 = 256;

    /// Default for [`histogram_height`](Self::histogram_height).
    pub const DEFAULT_HISTOGRAM_HEIGHT: u32 = 256;

    /// Histogram canvas size.
    #[must_use]
    pub const fn histogram_size(&self) -> Dimensions {
        Dimensions::new(self.histogram_width, self.histogram_height)
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidParameter`] if the light leak
    /// strength is negative or not finite, or a histogram dimension is
    /// zero or larger than [`MAX_CHART_SIDE`].
    pub fn validate(&self) -> Result<(), EffectsError> {
        if !(self.light_leak_strength >= 0.0 && self.light_leak_strength.is_finite()) {
            return Err(EffectsError::InvalidParameter(format!(
                "light_leak_strength must be a non-negative number, got {}",
                self.light_leak_strength
            )));
        }
        let side_ok = |side: u32| (1..=MAX_CHART_SIDE).contains(&side);
        if !side_ok(self.histogram_width) || !side_ok(self.histogram_height) {
            return Err(EffectsError::InvalidParameter(format!(
                "histogram sides must be between 1 and {MAX_CHART_SIDE}, got {}",
                self.histogram_size()
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            light_leak_strength: Self::DEFAULT_LIGHT_LEAK_STRENGTH,
            histogram_width: Self::DEFAULT_HISTOGRAM_WIDTH,
            histogram_height: Self::DEFAULT_HISTOGRAM_HEIGHT,
            boundary: BoundaryPolicy::default(),
        }
    }
}
