//! 2D convolution of an RGBA buffer with an arbitrary [`Kernel`].
//!
//! R, G and B are accumulated independently; alpha is not convolved and
//! the output is always opaque. Taps that land outside the image are
//! resolved by a [`BoundaryPolicy`] in both axes, so the left and right
//! edges never read pixels from the neighbouring row.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::kernel::Kernel;
use crate::types::{EffectsError, RgbaImage, saturate};

/// How taps that fall outside the image are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Repeat the nearest edge pixel.
    ///
    /// A uniform image stays uniform under any normalized kernel.
    #[default]
    ClampToEdge,
    /// Treat everything outside the image as black.
    ZeroPad,
}

/// Convolve with the default [`BoundaryPolicy::ClampToEdge`].
#[must_use = "returns the convolved image"]
pub fn convolve(image: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    convolve_with(image, kernel, BoundaryPolicy::default())
}

/// Convolve with an explicit boundary policy.
///
/// Returns a new buffer of the same dimensions. Each output channel is
/// rounded and saturated to `0..=255`.
#[must_use = "returns the convolved image"]
pub fn convolve_with(image: &RgbaImage, kernel: &Kernel, policy: BoundaryPolicy) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for y in 0..image.height() {
        convolve_row(image, kernel, policy, y, &mut out);
    }
    out
}

/// Convolve, checking `cancel` before each output row.
///
/// Large kernels on large images can take a while; a host running this
/// on a worker can flip `cancel` to abandon the work.
///
/// # Errors
///
/// Returns [`EffectsError::Cancelled`] if `cancel` is observed `true`.
pub fn convolve_cancellable(
    image: &RgbaImage,
    kernel: &Kernel,
    policy: BoundaryPolicy,
    cancel: &AtomicBool,
) -> Result<RgbaImage, EffectsError> {
    let mut out = RgbaImage::new(image.width(), image.height());
    for y in 0..image.height() {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("convolution cancelled at row {y}/{}", image.height());
            return Err(EffectsError::Cancelled);
        }
        convolve_row(image, kernel, policy, y, &mut out);
    }
    Ok(out)
}

/// Compute output row `y`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn convolve_row(
    image: &RgbaImage,
    kernel: &Kernel,
    policy: BoundaryPolicy,
    y: u32,
    out: &mut RgbaImage,
) {
    let max_x = i64::from(image.width()) - 1;
    let max_y = i64::from(image.height()) - 1;

    for x in 0..image.width() {
        let mut acc = [0.0_f32; 3];
        for (dx, dy, weight) in kernel.taps() {
            let mut sx = i64::from(x) + dx;
            let mut sy = i64::from(y) + dy;
            match policy {
                BoundaryPolicy::ClampToEdge => {
                    sx = sx.clamp(0, max_x);
                    sy = sy.clamp(0, max_y);
                }
                BoundaryPolicy::ZeroPad => {
                    if sx < 0 || sx > max_x || sy < 0 || sy > max_y {
                        continue;
                    }
                }
            }
            // In range: 0 <= sx <= max_x < u32::MAX, likewise sy.
            let src = image.get_pixel(sx as u32, sy as u32).0;
            for (a, &s) in acc.iter_mut().zip(&src[..3]) {
                *a = f32::from(s).mul_add(weight, *a);
            }
        }
        out.put_pixel(
            x,
            y,
            image::Rgba([saturate(acc[0]), saturate(acc[1]), saturate(acc[2]), 255]),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Left half black, right half white, half-transparent everywhere.
    fn sharp_edge_image() -> RgbaImage {
        RgbaImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Rgba([0, 0, 0, 128])
            } else {
                image::Rgba([255, 255, 255, 128])
            }
        })
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = RgbaImage::new(17, 31);
        let out = convolve(&img, &Kernel::gaussian(2));
        assert_eq!(out.dimensions(), (17, 31));
    }

    #[test]
    fn alpha_is_forced_opaque() {
        let out = convolve(&sharp_edge_image(), &Kernel::gaussian(1));
        assert!(out.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn identity_kernel_preserves_color() {
        let img = sharp_edge_image();
        let out = convolve(&img, &Kernel::identity());
        for (a, b) in img.pixels().zip(out.pixels()) {
            assert_eq!(a.0[..3], b.0[..3]);
        }
    }

    #[test]
    fn uniform_image_unchanged_with_clamp_to_edge() {
        let img = RgbaImage::from_pixel(9, 7, image::Rgba([100, 150, 200, 255]));
        for kernel in [Kernel::gaussian(1), Kernel::gaussian(4), Kernel::sharpen()] {
            let out = convolve(&img, &kernel);
            for p in out.pixels() {
                assert_eq!(p.0, [100, 150, 200, 255]);
            }
        }
    }

    #[test]
    fn zero_pad_darkens_borders() {
        let img = RgbaImage::from_pixel(9, 9, image::Rgba([200, 200, 200, 255]));
        let out = convolve_with(&img, &Kernel::gaussian(2), BoundaryPolicy::ZeroPad);
        assert!(out.get_pixel(0, 0).0[0] < 200);
        assert_eq!(out.get_pixel(4, 4).0[0], 200);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let out = convolve(&sharp_edge_image(), &Kernel::gaussian(2));
        let left = out.get_pixel(4, 5).0[0];
        let right = out.get_pixel(5, 5).0[0];
        assert!(left > 0, "expected left-of-edge above 0, got {left}");
        assert!(right < 255, "expected right-of-edge below 255, got {right}");
    }

    #[test]
    fn row_edges_do_not_wrap() {
        // Column 0 is white, everything else black. A horizontal kernel
        // at the right edge must not pick up column 0 of the next row.
        let img = RgbaImage::from_fn(6, 3, |x, _| {
            if x == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        let kernel = Kernel::from_rows(&[vec![1.0, 1.0, 1.0]]).unwrap();
        let out = convolve(&img, &kernel);
        for y in 0..3 {
            assert_eq!(out.get_pixel(5, y).0[0], 0, "row {y} wrapped");
        }
    }

    #[test]
    fn sharpen_saturates_instead_of_wrapping() {
        let out = convolve(&sharp_edge_image(), &Kernel::sharpen());
        // Bright side of the edge: 5*255 - 255 - 0 - 255 - 255 = 510 -> 255.
        assert_eq!(out.get_pixel(5, 5).0[0], 255);
        // Dark side: 0 - 255 = -255 -> 0.
        assert_eq!(out.get_pixel(4, 5).0[0], 0);
    }

    #[test]
    fn cancellable_matches_plain_when_not_cancelled() {
        let img = sharp_edge_image();
        let kernel = Kernel::gaussian(1);
        let cancel = AtomicBool::new(false);
        let out = convolve_cancellable(&img, &kernel, BoundaryPolicy::ClampToEdge, &cancel).unwrap();
        assert_eq!(out, convolve(&img, &kernel));
    }

    #[test]
    fn cancellable_stops_when_flagged() {
        let cancel = AtomicBool::new(true);
        let result = convolve_cancellable(
            &sharp_edge_image(),
            &Kernel::gaussian(1),
            BoundaryPolicy::ClampToEdge,
            &cancel,
        );
        assert_eq!(result, Err(EffectsError::Cancelled));
    }

    #[test]
    fn empty_image_is_fine() {
        let out = convolve(&RgbaImage::new(0, 0), &Kernel::gaussian(3));
        assert_eq!(out.dimensions(), (0, 0));
    }
}
