//! Tile shuffling: cut the buffer into a `slices x slices` grid, permute
//! the tiles, optionally rotate them, and reassemble.
//!
//! Tile size is `floor(width / slices) x floor(height / slices)`. When
//! `slices` does not divide a dimension, the leftover strip along the
//! right or bottom edge is not part of any tile and stays where it is.
//!
//! Rotations must keep each tile's footprint, so square tiles turn by any
//! multiple of 90° while non-square tiles only turn by 0° or 180°.

use image::imageops;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::{EffectsError, RgbaImage};

/// Shuffle the tiles of `image` in place.
///
/// Tiles are cut column by column, shuffled (Fisher-Yates), and written
/// back in the same grid order. With `rotate`, every tile except the one
/// landing in the last grid cell (bottom-right) gets a random rotation.
///
/// `slices == 1` leaves the buffer unchanged.
///
/// # Errors
///
/// Returns [`EffectsError::InvalidParameter`] if `slices` is zero or
/// larger than either dimension (which would make tiles empty).
pub fn fragment<R: Rng + ?Sized>(
    image: &mut RgbaImage,
    slices: u32,
    rotate: bool,
    rng: &mut R,
) -> Result<(), EffectsError> {
    let (width, height) = image.dimensions();
    if slices == 0 || slices > width || slices > height {
        return Err(EffectsError::InvalidParameter(format!(
            "slices must be between 1 and min(width, height) = {}, got {slices}",
            width.min(height)
        )));
    }
    if slices == 1 {
        return Ok(());
    }

    let tile_w = width / slices;
    let tile_h = height / slices;
    if width % slices != 0 || height % slices != 0 {
        log::warn!(
            "{width}x{height} does not divide into {slices} slices; \
             leaving a {}x{} remainder strip in place",
            width % slices,
            height % slices,
        );
    }
    if rotate && tile_w != tile_h {
        log::warn!("tiles are {tile_w}x{tile_h}; restricting rotation to 0 and 180 degrees");
    }
    log::trace!("fragment: {slices}x{slices} tiles of {tile_w}x{tile_h}, rotate={rotate}");

    let cells: Vec<(u32, u32)> = (0..slices)
        .flat_map(|i| (0..slices).map(move |j| (i * tile_w, j * tile_h)))
        .collect();

    let mut tiles: Vec<RgbaImage> = cells
        .iter()
        .map(|&(x, y)| imageops::crop_imm(&*image, x, y, tile_w, tile_h).to_image())
        .collect();
    tiles.shuffle(rng);

    let last = cells.len() - 1;
    for (index, (tile, &(x, y))) in tiles.into_iter().zip(&cells).enumerate() {
        let tile = if rotate && index != last {
            rotate_tile(tile, rng)
        } else {
            tile
        };
        imageops::replace(image, &tile, i64::from(x), i64::from(y));
    }
    Ok(())
}

/// Rotate a tile by a random multiple of 90° that preserves its
/// dimensions.
fn rotate_tile<R: Rng + ?Sized>(tile: RgbaImage, rng: &mut R) -> RgbaImage {
    let quarter_turns = if tile.width() == tile.height() {
        rng.random_range(0..4)
    } else {
        rng.random_range(0..2) * 2
    };
    match quarter_turns {
        1 => imageops::rotate90(&tile),
        2 => imageops::rotate180(&tile),
        3 => imageops::rotate270(&tile),
        _ => tile,
    }
}
