//! Shared types for the pixelfx effects engine.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can hand buffers to the
/// engine without depending on `image` directly.
pub use image::RgbaImage;

/// The buffer every effect operates on: 8-bit RGBA samples, row-major,
/// top-left origin, `width * height * 4` bytes long.
///
/// `image::RgbaImage` enforces the length invariant at construction, so
/// a `PixelBuffer` that exists is always well-formed. Raw byte slices
/// from a host enter through [`from_raw`].
pub type PixelBuffer = RgbaImage;

/// Bytes per pixel in a [`PixelBuffer`].
pub const CHANNELS: usize = 4;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new set of dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing buffer.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Expected byte length of an RGBA buffer with these dimensions, or
    /// `None` if it does not fit in `usize`.
    #[must_use]
    pub fn byte_len(self) -> Option<usize> {
        usize::try_from(self.pixel_count())
            .ok()?
            .checked_mul(CHANNELS)
    }

    /// Geometric center `(width / 2, height / 2)` in pixel coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Check that a raw buffer of `len` bytes can hold a `width x height`
/// RGBA image.
///
/// # Errors
///
/// Returns [`EffectsError::InvalidParameter`] if either dimension is zero
/// and [`EffectsError::MalformedBuffer`] if `len` is not exactly
/// `width * height * 4`.
pub fn check_raw(width: u32, height: u32, len: usize) -> Result<(), EffectsError> {
    let dims = Dimensions::new(width, height);
    if width == 0 || height == 0 {
        return Err(EffectsError::InvalidParameter(format!(
            "dimensions must be positive, got {dims}"
        )));
    }
    let expected = dims.byte_len().unwrap_or(usize::MAX);
    if len == expected {
        Ok(())
    } else {
        Err(EffectsError::MalformedBuffer {
            expected,
            actual: len,
        })
    }
}

/// Wrap raw RGBA bytes in a [`PixelBuffer`], validating the length.
///
/// # Errors
///
/// See [`check_raw`].
pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<PixelBuffer, EffectsError> {
    check_raw(width, height, data.len())?;
    let actual = data.len();
    RgbaImage::from_raw(width, height, data).ok_or(EffectsError::MalformedBuffer {
        expected: Dimensions::new(width, height)
            .byte_len()
            .unwrap_or(usize::MAX),
        actual,
    })
}

/// Round a floating-point channel value and saturate it to `0..=255`.
///
/// NaN maps to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn saturate(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Errors reported by the effects engine.
///
/// Uses custom `Serialize`/`Deserialize` through a proxy enum so hosts
/// can ship errors across a serialization boundary alongside results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectsError {
    /// A raw buffer's length does not match its declared dimensions.
    #[error("malformed pixel buffer: expected {expected} bytes, got {actual}")]
    MalformedBuffer {
        /// `width * height * 4`.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// An effect parameter is outside its supported range.
    #[error("invalid effect parameter: {0}")]
    InvalidParameter(String),

    /// A convolution kernel is not odd-sized or its weights do not fill it.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The host cancelled a long-running operation.
    #[error("operation cancelled")]
    Cancelled,
}

/// Serde-compatible proxy for `EffectsError`.
#[derive(Serialize, Deserialize)]
enum EffectsErrorProxy {
    MalformedBuffer { expected: usize, actual: usize },
    InvalidParameter(String),
    InvalidKernel(String),
    InvalidColor(String),
    Cancelled,
}

impl Serialize for EffectsError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::MalformedBuffer { expected, actual } => EffectsErrorProxy::MalformedBuffer {
                expected: *expected,
                actual: *actual,
            },
            Self::InvalidParameter(s) => EffectsErrorProxy::InvalidParameter(s.clone()),
            Self::InvalidKernel(s) => EffectsErrorProxy::InvalidKernel(s.clone()),
            Self::InvalidColor(s) => EffectsErrorProxy::InvalidColor(s.clone()),
            Self::Cancelled => EffectsErrorProxy::Cancelled,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EffectsError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match EffectsErrorProxy::deserialize(deserializer)? {
            EffectsErrorProxy::MalformedBuffer { expected, actual } => {
                Self::MalformedBuffer { expected, actual }
            }
            EffectsErrorProxy::InvalidParameter(s) => Self::InvalidParameter(s),
            EffectsErrorProxy::InvalidKernel(s) => Self::InvalidKernel(s),
            EffectsErrorProxy::InvalidColor(s) => Self::InvalidColor(s),
            EffectsErrorProxy::Cancelled => Self::Cancelled,
        })
    }
}
