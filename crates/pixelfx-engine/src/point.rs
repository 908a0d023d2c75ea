//! Per-pixel, position-independent effects.
//!
//! Every function here mutates the buffer in place in a single pass.
//! Alpha is left alone except by [`glitch`], which replaces whole pixels.

use rand::Rng;

use crate::types::{RgbaImage, saturate};

/// Standard sepia matrix, one row per output channel.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Replace R, G and B with their unweighted average.
///
/// Idempotent: a pixel whose channels are already equal is unchanged.
#[allow(clippy::cast_possible_truncation)]
pub fn grayscale(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        // Rounded integer mean; fits in u8 since the sum is at most 765.
        let sum = u16::from(r) + u16::from(g) + u16::from(b);
        let avg = ((sum + 1) / 3) as u8;
        pixel.0[..3].fill(avg);
    }
}

/// Invert R, G and B (`255 - c`).
pub fn invert(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        for c in &mut pixel.0[..3] {
            *c = 255 - *c;
        }
    }
}

/// Apply the sepia color matrix, saturating each output channel.
pub fn sepia(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let rgb = [
            f32::from(pixel.0[0]),
            f32::from(pixel.0[1]),
            f32::from(pixel.0[2]),
        ];
        for (out, row) in pixel.0[..3].iter_mut().zip(&SEPIA) {
            let value = row[0].mul_add(rgb[0], row[1].mul_add(rgb[1], row[2] * rgb[2]));
            *out = saturate(value);
        }
    }
}

/// Warm (positive `delta`) or cool (negative) the image: red moves by
/// `+delta`, green and blue by `-delta`, all saturating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn temperature(image: &mut RgbaImage, delta: i32) {
    let shift = |c: u8, d: i32| i32::from(c).saturating_add(d).clamp(0, 255) as u8;
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        pixel.0[0] = shift(r, delta);
        pixel.0[1] = shift(g, delta.saturating_neg());
        pixel.0[2] = shift(b, delta.saturating_neg());
    }
}

/// Film grain: per pixel, draw one value in `[0, strength)` and add it
/// to R, G and B alike.
///
/// Non-positive (or NaN) strength is a no-op.
pub fn film_grain<R: Rng + ?Sized>(image: &mut RgbaImage, strength: f32, rng: &mut R) {
    if !(strength > 0.0 && strength.is_finite()) {
        log::debug!("film grain skipped: strength {strength} is not positive");
        return;
    }
    for pixel in image.pixels_mut() {
        let grain: f32 = rng.random_range(0.0..strength);
        for c in &mut pixel.0[..3] {
            *c = saturate(f32::from(*c) + grain);
        }
    }
}

/// Glitch: each pixel independently has an even chance of keeping its
/// RGBA value or being replaced by four uniformly random bytes.
pub fn glitch<R: Rng + ?Sized>(image: &mut RgbaImage, rng: &mut R) {
    for pixel in image.pixels_mut() {
        if !rng.random_bool(0.5) {
            pixel.0 = rng.random();
        }
    }
}
