//! Position-dependent effects: vignette, light leak, and circular crop.
//!
//! Intensities are computed from integer pixel coordinates relative to
//! the buffer center `(width / 2, height / 2)` and clamped to `[0, 1]`,
//! so pixels beyond the nominal radius go dark rather than inverting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, EffectsError, RgbaImage, saturate};

/// Which edge a light leak enters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightLeakSide {
    /// Brightest at `x = 0`.
    #[default]
    Left,
    /// Brightest at `x = width`.
    Right,
    /// Brightest at `y = 0`.
    Top,
    /// Brightest at `y = height`.
    Bottom,
    /// Unrecognized side: the leak contributes nothing.
    #[serde(other)]
    None,
}

impl From<&str> for LightLeakSide {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            _ => Self::None,
        }
    }
}

impl fmt::Display for LightLeakSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::None => "none",
        })
    }
}

/// Darken toward the edges: each color channel is multiplied by
/// `1 - distance / radius`, clamped to `[0, 1]`.
///
/// # Errors
///
/// Returns [`EffectsError::InvalidParameter`] if `radius` is not a
/// positive, finite number.
#[allow(clippy::cast_precision_loss)]
pub fn vignette(image: &mut RgbaImage, radius: f32) -> Result<(), EffectsError> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(EffectsError::InvalidParameter(format!(
            "vignette radius must be positive, got {radius}"
        )));
    }

    let (cx, cy) = Dimensions::of(image).center();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let distance = (x as f32 - cx).hypot(y as f32 - cy);
        let intensity = (1.0 - distance / radius).clamp(0.0, 1.0);
        for c in &mut pixel.0[..3] {
            *c = saturate(f32::from(*c) * intensity);
        }
    }
    Ok(())
}

/// Brighten from one edge: intensity ramps linearly from 1 at `side` to
/// 0 at the center line, and `intensity * strength` is added to each
/// color channel.
///
/// [`LightLeakSide::None`] leaves the buffer untouched.
#[allow(clippy::cast_precision_loss)]
pub fn light_leak(image: &mut RgbaImage, side: LightLeakSide, strength: f32) {
    if side == LightLeakSide::None {
        log::debug!("light leak skipped: no side");
        return;
    }

    let dims = Dimensions::of(image);
    let (cx, cy) = dims.center();
    let (w, h) = (dims.width as f32, dims.height as f32);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let (x, y) = (x as f32, y as f32);
        let ramp = match side {
            LightLeakSide::Left => 1.0 - x / cx,
            LightLeakSide::Right => 1.0 - (w - x) / cx,
            LightLeakSide::Top => 1.0 - y / cy,
            LightLeakSide::Bottom => 1.0 - (h - y) / cy,
            LightLeakSide::None => 0.0,
        };
        let boost = ramp.clamp(0.0, 1.0) * strength;
        if boost == 0.0 {
            continue;
        }
        for c in &mut pixel.0[..3] {
            *c = saturate(f32::from(*c) + boost);
        }
    }
}

/// Mask the buffer to a centered circle of radius `width / 2`.
///
/// Pixels whose centers fall outside the circle become fully
/// transparent black; pixels inside are untouched.
#[allow(clippy::cast_precision_loss)]
pub fn crop_circle(image: &mut RgbaImage) {
    let dims = Dimensions::of(image);
    let (cx, cy) = dims.center();
    let radius = dims.width as f32 / 2.0;
    let radius_sq = radius * radius;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx.mul_add(dx, dy * dy) > radius_sq {
            pixel.0 = [0, 0, 0, 0];
        }
    }
}
