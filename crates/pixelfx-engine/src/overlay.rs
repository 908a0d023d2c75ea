//! Vector overlays rasterized with `tiny-skia`.
//!
//! `tiny-skia` draws into premultiplied RGBA; everything here converts
//! back to straight alpha before it touches an [`RgbaImage`].

use tiny_skia::{Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::color::Rgb;
use crate::types::{EffectsError, RgbaImage, saturate};

/// Hexagons per row and per column of the grid overlay.
pub const HEX_GRID_CELLS: u32 = 10;

/// Stroke width of the hexagon outlines, in pixels.
pub const HEX_STROKE_WIDTH: f32 = 2.0;

/// Minor grid line color of the empty canvas (`#ccc`).
pub const CANVAS_MINOR: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

/// Major grid line color of the empty canvas (`#aaa`).
pub const CANVAS_MAJOR: Rgb = Rgb::new(0xaa, 0xaa, 0xaa);

/// A major line is drawn every this many minor cells.
pub const CANVAS_MAJOR_EVERY: u32 = 5;

/// Stroke a 10x10 grid of hexagon outlines over `image`.
///
/// Each hexagon fits a `width / 10` square cell: pointed top and bottom,
/// vertical sides from a quarter to three quarters of the cell height.
/// The outlines are composited source-over, so transparent regions of
/// `image` pick up the grid color at full opacity.
///
/// A zero-sized image is left alone.
#[allow(clippy::cast_precision_loss)]
pub fn hexagonal_grid(image: &mut RgbaImage, color: Rgb) {
    let (width, height) = image.dimensions();
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        log::debug!("hex grid skipped: {width}x{height} image");
        return;
    };

    let size = width as f32 / HEX_GRID_CELLS as f32;
    let mut pb = PathBuilder::new();
    for i in 0..HEX_GRID_CELLS {
        for j in 0..HEX_GRID_CELLS {
            let x = i as f32 * size;
            let y = j as f32 * size;
            pb.move_to(x + size / 2.0, y);
            pb.line_to(x + size, y + size / 4.0);
            pb.line_to(x + size, y + size * 3.0 / 4.0);
            pb.line_to(x + size / 2.0, y + size);
            pb.line_to(x, y + size * 3.0 / 4.0);
            pb.line_to(x, y + size / 4.0);
            pb.close();
        }
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let stroke = Stroke {
        width: HEX_STROKE_WIDTH,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);

    let layer = to_straight(&pixmap);
    for (dst, src) in image.pixels_mut().zip(layer.pixels()) {
        dst.0 = source_over(src.0, dst.0);
    }
}

/// Render the placeholder canvas shown before an image is loaded.
///
/// Transparent background with 1 px `#ccc` lines every `cell` pixels and
/// `#aaa` lines every `5 * cell` pixels, drawn on top. Lines sit on
/// integer coordinates from 0 up to and including the canvas edge.
///
/// # Errors
///
/// Returns [`EffectsError::InvalidParameter`] if a dimension or `cell`
/// is zero.
pub fn empty_canvas(width: u32, height: u32, cell: u32) -> Result<RgbaImage, EffectsError> {
    if cell == 0 {
        return Err(EffectsError::InvalidParameter(
            "grid cell size must be positive".to_string(),
        ));
    }
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return Err(EffectsError::InvalidParameter(format!(
            "canvas dimensions must be positive, got {width}x{height}"
        )));
    };

    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    let major = cell.saturating_mul(CANVAS_MAJOR_EVERY);
    for (step, color) in [(cell, CANVAS_MINOR), (major, CANVAS_MAJOR)] {
        if let Some(path) = grid_path(width, height, step) {
            pixmap.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
        }
    }
    Ok(to_straight(&pixmap))
}

/// Vertical and horizontal lines every `step` pixels, edges inclusive.
#[allow(clippy::cast_precision_loss)]
fn grid_path(width: u32, height: u32, step: u32) -> Option<tiny_skia::Path> {
    let (w, h) = (width as f32, height as f32);
    let mut pb = PathBuilder::new();
    for x in (0..=width).step_by(step as usize) {
        pb.move_to(x as f32, 0.0);
        pb.line_to(x as f32, h);
    }
    for y in (0..=height).step_by(step as usize) {
        pb.move_to(0.0, y as f32);
        pb.line_to(w, y as f32);
    }
    pb.finish()
}

fn solid(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

/// Convert a premultiplied pixmap to a straight-alpha image.
#[allow(clippy::cast_possible_truncation)]
fn to_straight(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, src) in img.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        let a = src[3];
        if a == 0 {
            continue;
        }
        // channel = premultiplied * 255 / alpha, always <= 255.
        let un = |c: u8| (u16::from(c) * 255 / u16::from(a)) as u8;
        pixel.0 = [un(src[0]), un(src[1]), un(src[2]), a];
    }
    img
}

/// Porter-Duff source-over on straight-alpha pixels.
fn source_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    match src[3] {
        0 => dst,
        255 => src,
        _ => {
            let sa = f32::from(src[3]) / 255.0;
            let da = f32::from(dst[3]) / 255.0 * (1.0 - sa);
            let out_a = sa + da;
            let mix = |s: u8, d: u8| saturate(f32::from(s).mul_add(sa, f32::from(d) * da) / out_a);
            [
                mix(src[0], dst[0]),
                mix(src[1], dst[1]),
                mix(src[2], dst[2]),
                saturate(out_a * 255.0),
            ]
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- hexagonal grid ---

    #[test]
    fn hex_grid_strokes_shared_vertical_edge() {
        let mut img = RgbaImage::from_pixel(100, 100, image::Rgba([255, 255, 255, 255]));
        hexagonal_grid(&mut img, Rgb::new(255, 0, 0));
        // Cells are 10 px; the edge between the first two hexagons runs
        // along x = 10 from y = 2.5 to 7.5 and the 2 px stroke fully
        // covers columns 9 and 10.
        assert_eq!(img.get_pixel(10, 5).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(9, 5).0, [255, 0, 0, 255]);
        // Hexagon interiors are untouched.
        assert_eq!(img.get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(55, 45).0, [255, 255, 255, 255]);
    }

    #[test]
    fn hex_grid_is_opaque_over_transparent_pixels() {
        let mut img = RgbaImage::new(50, 50);
        hexagonal_grid(&mut img, Rgb::new(0, 0, 200));
        assert_eq!(img.get_pixel(5, 2).0, [0, 0, 200, 255]);
        assert_eq!(img.get_pixel(2, 2).0[3], 0);
    }

    #[test]
    fn hex_grid_keeps_dimensions_and_skips_empty() {
        let mut img = RgbaImage::new(37, 12);
        hexagonal_grid(&mut img, Rgb::new(1, 2, 3));
        assert_eq!(img.dimensions(), (37, 12));

        let mut empty = RgbaImage::new(0, 0);
        hexagonal_grid(&mut empty, Rgb::new(1, 2, 3));
        assert_eq!(empty.dimensions(), (0, 0));
    }

    // --- empty canvas ---

    #[test]
    fn empty_canvas_draws_minor_lines() {
        let canvas = empty_canvas(60, 30, 10).unwrap();
        assert_eq!(canvas.dimensions(), (60, 30));
        // Between lines: transparent.
        assert_eq!(canvas.get_pixel(5, 5).0, [0, 0, 0, 0]);
        // The x = 10 line straddles columns 9 and 10.
        let line = canvas.get_pixel(10, 5).0;
        assert!(line[3] > 0);
        assert!(line[0].abs_diff(0xcc) <= 2, "{line:?}");
    }

    #[test]
    fn empty_canvas_major_lines_are_darker() {
        let canvas = empty_canvas(60, 30, 10).unwrap();
        let minor = canvas.get_pixel(10, 5).0;
        let major = canvas.get_pixel(50, 5).0;
        assert!(major[0] < minor[0], "major {major:?} minor {minor:?}");
        assert!(major[3] >= minor[3]);
    }

    #[test]
    fn empty_canvas_is_gray() {
        let canvas = empty_canvas(40, 40, 8).unwrap();
        for p in canvas.pixels() {
            let [r, g, b, _] = p.0;
            assert!(r == g && g == b);
        }
    }

    #[test]
    fn empty_canvas_rejects_degenerate_input() {
        for (w, h, cell) in [(0, 10, 5), (10, 0, 5), (10, 10, 0)] {
            assert!(matches!(
                empty_canvas(w, h, cell),
                Err(EffectsError::InvalidParameter(_))
            ));
        }
    }

    // --- compositing ---

    #[test]
    fn source_over_half_alpha_blends() {
        let out = source_over([255, 0, 0, 128], [0, 0, 255, 255]);
        assert_eq!(out[3], 255);
        assert!(out[0].abs_diff(128) <= 1 && out[2].abs_diff(127) <= 1, "{out:?}");
    }

    #[test]
    fn source_over_onto_transparent_keeps_source() {
        let out = source_over([10, 20, 30, 64], [0, 0, 0, 0]);
        assert_eq!(out, [10, 20, 30, 64]);
    }
}
