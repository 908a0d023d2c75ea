//! Discrete 2D convolution kernels.
//!
//! A [`Kernel`] is a row-major grid of weights with odd width and height,
//! so it always has a center tap. Weights need not sum to 1 (sharpening
//! kernels deliberately do not), but [`Kernel::gaussian`] always does.

use crate::types::EffectsError;

/// An odd-sized grid of convolution weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    width: usize,
    height: usize,
    weights: Vec<f32>,
}

impl Kernel {
    /// Build a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidKernel`] if either dimension is even
    /// or zero, or if `weights.len() != width * height`.
    pub fn new(width: usize, height: usize, weights: Vec<f32>) -> Result<Self, EffectsError> {
        if width % 2 == 0 || height % 2 == 0 {
            return Err(EffectsError::InvalidKernel(format!(
                "dimensions must be odd, got {width}x{height}"
            )));
        }
        if weights.len() != width * height {
            return Err(EffectsError::InvalidKernel(format!(
                "{width}x{height} kernel needs {} weights, got {}",
                width * height,
                weights.len()
            )));
        }
        Ok(Self {
            width,
            height,
            weights,
        })
    }

    /// Build a kernel from a list of equally long rows.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidKernel`] for ragged rows or even
    /// dimensions.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, EffectsError> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(EffectsError::InvalidKernel(
                "rows must all have the same length".to_string(),
            ));
        }
        Self::new(width, rows.len(), rows.concat())
    }

    /// The single-tap identity kernel `[1.0]`.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            width: 1,
            height: 1,
            weights: vec![1.0],
        }
    }

    /// The fixed 3x3 sharpening kernel:
    ///
    /// ```text
    ///  0 -1  0
    /// -1  5 -1
    ///  0 -1  0
    /// ```
    #[must_use]
    pub fn sharpen() -> Self {
        Self {
            width: 3,
            height: 3,
            weights: vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
        }
    }

    /// Largest radius [`Kernel::gaussian`] will build: a 1025x1025 grid.
    pub const MAX_GAUSSIAN_RADIUS: u32 = 512;

    /// A normalized Gaussian kernel of side `2 * radius + 1`.
    ///
    /// Uses `sigma = radius / 3`, so the kernel spans three standard
    /// deviations each way. Weights are divided by their sum, making the
    /// blur unity-gain. `radius == 0` returns [`Kernel::identity`].
    ///
    /// Radii above [`Kernel::MAX_GAUSSIAN_RADIUS`] are clamped to it.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss
    )]
    pub fn gaussian(radius: u32) -> Self {
        if radius == 0 {
            return Self::identity();
        }
        if radius > Self::MAX_GAUSSIAN_RADIUS {
            log::warn!(
                "gaussian radius {radius} clamped to {}",
                Self::MAX_GAUSSIAN_RADIUS
            );
        }
        let radius = radius.min(Self::MAX_GAUSSIAN_RADIUS);

        let r = i64::from(radius);
        let side = 2 * radius as usize + 1;
        let sigma = f64::from(radius) / 3.0;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let scale = 1.0 / (sigma * std::f64::consts::TAU.sqrt());

        let mut raw = Vec::with_capacity(side * side);
        for y in -r..=r {
            for x in -r..=r {
                let dist_sq = (x * x + y * y) as f64;
                raw.push(scale * (-dist_sq / two_sigma_sq).exp());
            }
        }

        let sum: f64 = raw.iter().sum();
        let weights = raw.into_iter().map(|w| (w / sum) as f32).collect();
        log::trace!("gaussian kernel: radius={radius} side={side} sigma={sigma:.3}");

        Self {
            width: side,
            height: side,
            weights,
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weight at `(row, col)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.height && col < self.width {
            self.weights.get(row * self.width + col).copied()
        } else {
            None
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Iterate over `(dx, dy, weight)` with offsets relative to the
    /// center tap.
    #[allow(clippy::cast_possible_wrap)]
    pub fn taps(&self) -> impl Iterator<Item = (i64, i64, f32)> + '_ {
        let cx = (self.width / 2) as i64;
        let cy = (self.height / 2) as i64;
        let width = self.width;
        self.weights.iter().enumerate().map(move |(i, &w)| {
            let col = (i % width) as i64;
            let row = (i / width) as i64;
            (col - cx, row - cy, w)
        })
    }
}
