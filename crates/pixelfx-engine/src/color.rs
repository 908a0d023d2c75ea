//! Color-space conversions: RGB, HSL, CMYK, and `#rrggbb` hex strings.
//!
//! Everything here is a pure function over small value types. HSL and
//! CMYK components live in `[0, 1]`; RGB components are bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::EffectsError;

/// An 8-bit RGB color.
///
/// Serializes as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pixel with the given alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, a])
    }

    /// Color of an RGBA pixel, ignoring alpha.
    #[must_use]
    pub const fn from_pixel(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, _] = pixel.0;
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rgb_to_hex(*self))
    }
}

impl FromStr for Rgb {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_rgb(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = EffectsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        hex_to_rgb(&s)
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb_to_hex(rgb)
    }
}

/// Hue, saturation, lightness; each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    /// Hue as a fraction of a full turn.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Lightness.
    pub l: f64,
}

impl Hsl {
    /// Convert back to 8-bit RGB, rounding each channel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgb(self) -> Rgb {
        let [r, g, b] = hsl_to_rgb(self).map(|c| c.round().clamp(0.0, 255.0) as u8);
        Rgb::new(r, g, b)
    }
}

/// Cyan, magenta, yellow, key (black); each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cmyk {
    /// Cyan.
    pub c: f64,
    /// Magenta.
    pub m: f64,
    /// Yellow.
    pub y: f64,
    /// Key (black).
    pub k: f64,
}

/// Format a color as `#rrggbb` with lowercase, zero-padded hex digits.
#[must_use]
pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b)
}

/// Parse `#rrggbb`, `rrggbb`, `#rgb`, or `rgb` (case-insensitive).
///
/// # Errors
///
/// Returns [`EffectsError::InvalidColor`] for any other shape or for
/// non-hex digits.
pub fn hex_to_rgb(s: &str) -> Result<Rgb, EffectsError> {
    let invalid = || EffectsError::InvalidColor(format!("expected #rrggbb or #rgb, got '{s}'"));
    let digits = s.trim().strip_prefix('#').unwrap_or_else(|| s.trim());
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |hex: &str| u8::from_str_radix(hex, 16).map_err(|_| invalid());
    match digits.len() {
        6 => Ok(Rgb::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            // Each shorthand digit `d` expands to `dd`, i.e. `d * 17`.
            let short = |i: usize| channel(&digits[i..=i]).map(|v| v * 17);
            Ok(Rgb::new(short(0)?, short(1)?, short(2)?))
        }
        _ => Err(invalid()),
    }
}

/// Convert RGB to HSL.
///
/// Achromatic colors (all channels equal) have hue and saturation 0.
#[must_use]
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if rgb.r == rgb.g && rgb.g == rgb.b {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    // Branch on the byte values so ties resolve red, then green, then blue.
    let top = rgb.r.max(rgb.g).max(rgb.b);
    let h = if rgb.r == top {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if rgb.g == top {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl { h: h / 6.0, s, l }
}

/// Convert HSL to RGB, returning unrounded channels in `[0, 255]`.
///
/// Use [`Hsl::to_rgb`] for a rounded byte triple.
#[must_use]
pub fn hsl_to_rgb(hsl: Hsl) -> [f64; 3] {
    let Hsl { h, s, l } = hsl;
    if s == 0.0 {
        return [l * 255.0; 3];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0f64.mul_add(l, -q);

    [
        hue_to_channel(p, q, h + 1.0 / 3.0) * 255.0,
        hue_to_channel(p, q, h) * 255.0,
        hue_to_channel(p, q, h - 1.0 / 3.0) * 255.0,
    ]
}

/// One channel of the HSL → RGB piecewise interpolation.
fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        ((q - p) * 6.0).mul_add(t, p)
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        ((q - p) * (2.0 / 3.0 - t)).mul_add(6.0, p)
    } else {
        p
    }
}

/// Convert RGB to CMYK.
///
/// Pure black (`k == 1`) yields `c = m = y = 0` instead of dividing by
/// zero.
#[must_use]
pub fn rgb_to_cmyk(rgb: Rgb) -> Cmyk {
    let c = 1.0 - f64::from(rgb.r) / 255.0;
    let m = 1.0 - f64::from(rgb.g) / 255.0;
    let y = 1.0 - f64::from(rgb.b) / 255.0;
    let k = c.min(m).min(y);

    if rgb.r == 0 && rgb.g == 0 && rgb.b == 0 {
        return Cmyk {
            c: 0.0,
            m: 0.0,
            y: 0.0,
            k: 1.0,
        };
    }

    let scale = 1.0 - k;
    Cmyk {
        c: (c - k) / scale,
        m: (m - k) / scale,
        y: (y - k) / scale,
        k,
    }
}
