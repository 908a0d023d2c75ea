//! The closed set of effects and the dispatcher that applies them.
//!
//! An [`Effect`] is plain data: a kind plus its parameters. It
//! serializes as an internally tagged object
//! (`{"kind": "blur", "radius": 3}`) and parses from the short
//! `name[=value]` form used on the command line.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::color::{Rgb, hex_to_rgb};
use crate::config::EngineConfig;
use crate::convolve::convolve_with;
use crate::kernel::Kernel;
use crate::radial::LightLeakSide;
use crate::types::{Dimensions, EffectsError, RgbaImage, from_raw};
use crate::{overlay, point, radial, tiles};

/// A pixel effect and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Unweighted RGB average.
    Grayscale,
    /// `255 - c` on color channels.
    Invert,
    /// Fixed 3x3 sharpening kernel.
    Sharpen,
    /// Sepia color matrix.
    Sepia,
    /// Radial darkening; `radius` in pixels must be positive.
    Vignette {
        /// Distance from center at which intensity reaches zero.
        radius: f32,
    },
    /// Directional brightening from one edge.
    LightLeak {
        /// Edge the light enters from.
        #[serde(default)]
        side: LightLeakSide,
    },
    /// Gaussian blur. Radius 0 leaves the image untouched.
    Blur {
        /// Kernel radius in pixels.
        radius: u32,
    },
    /// Film grain.
    Noise {
        /// Upper bound of the per-pixel grain value.
        strength: f32,
    },
    /// Tile shuffle.
    Fragment {
        /// Tiles per row and per column.
        slices: u32,
        /// Randomly rotate tiles.
        #[serde(default = "default_rotate")]
        rotate: bool,
    },
    /// Circular transparency mask.
    CropCircle,
    /// Warm (positive) or cool (negative) color shift.
    Temperature {
        /// Amount added to red and subtracted from green and blue.
        delta: i32,
    },
    /// Random pixel corruption.
    Glitch,
    /// Hexagon outline overlay.
    HexGrid {
        /// Stroke color.
        color: Rgb,
    },
}

const fn default_rotate() -> bool {
    true
}

impl Effect {
    /// Snake-case kind name, as used in JSON and on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Invert => "invert",
            Self::Sharpen => "sharpen",
            Self::Sepia => "sepia",
            Self::Vignette { .. } => "vignette",
            Self::LightLeak { .. } => "light_leak",
            Self::Blur { .. } => "blur",
            Self::Noise { .. } => "noise",
            Self::Fragment { .. } => "fragment",
            Self::CropCircle => "crop_circle",
            Self::Temperature { .. } => "temperature",
            Self::Glitch => "glitch",
            Self::HexGrid { .. } => "hex_grid",
        }
    }

    /// Parse the short `name` / `name=value` form.
    ///
    /// Names accept `-` in place of `_`. Values:
    ///
    /// | effect        | value                         |
    /// |---------------|-------------------------------|
    /// | `vignette`    | radius (required)             |
    /// | `light_leak`  | side (default `left`)         |
    /// | `blur`        | radius (required)             |
    /// | `noise`       | strength (required)           |
    /// | `fragment`    | `slices` or `slices,norotate` |
    /// | `temperature` | signed delta (required)       |
    /// | `hex_grid`    | hex color (required)          |
    ///
    /// The remaining effects take no value.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidParameter`] for an unknown name or
    /// a missing, unexpected, or unparseable value, and
    /// [`EffectsError::InvalidColor`] for a bad `hex_grid` color.
    pub fn parse_spec(spec: &str) -> Result<Self, EffectsError> {
        let (name, value) = match spec.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (spec.trim(), None),
        };
        let name = name.to_ascii_lowercase().replace('-', "_");

        let effect = match name.as_str() {
            "grayscale" => Self::Grayscale,
            "invert" => Self::Invert,
            "sharpen" => Self::Sharpen,
            "sepia" => Self::Sepia,
            "crop_circle" => Self::CropCircle,
            "glitch" => Self::Glitch,
            "vignette" => Self::Vignette {
                radius: number(&name, value)?,
            },
            "light_leak" => Self::LightLeak {
                side: value.map(LightLeakSide::from).unwrap_or_default(),
            },
            "blur" => Self::Blur {
                radius: number(&name, value)?,
            },
            "noise" => Self::Noise {
                strength: number(&name, value)?,
            },
            "fragment" => {
                let raw = required(&name, value)?;
                let (slices, rotate) = match raw.split_once(',') {
                    Some((slices, "norotate")) => (slices, false),
                    Some((_, flag)) => {
                        return Err(EffectsError::InvalidParameter(format!(
                            "fragment: unknown flag '{flag}', expected 'norotate'"
                        )));
                    }
                    None => (raw, true),
                };
                Self::Fragment {
                    slices: number(&name, Some(slices))?,
                    rotate,
                }
            }
            "temperature" => Self::Temperature {
                delta: number(&name, value)?,
            },
            "hex_grid" => Self::HexGrid {
                color: hex_to_rgb(required(&name, value)?)?,
            },
            _ => {
                return Err(EffectsError::InvalidParameter(format!(
                    "unknown effect '{name}'"
                )));
            }
        };

        if value.is_some() && !effect.takes_value() {
            return Err(EffectsError::InvalidParameter(format!(
                "{name} takes no value"
            )));
        }
        Ok(effect)
    }

    const fn takes_value(&self) -> bool {
        !matches!(
            self,
            Self::Grayscale
                | Self::Invert
                | Self::Sharpen
                | Self::Sepia
                | Self::CropCircle
                | Self::Glitch
        )
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, EffectsError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EffectsError::InvalidParameter(format!("{name} requires a value")))
}

fn number<T: FromStr>(name: &str, value: Option<&str>) -> Result<T, EffectsError> {
    let raw = required(name, value)?;
    raw.parse()
        .map_err(|_| EffectsError::InvalidParameter(format!("{name}: '{raw}' is not a valid number")))
}

impl FromStr for Effect {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_spec(s)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::Vignette { radius } => write!(f, "{name}={radius}"),
            Self::LightLeak { side } => write!(f, "{name}={side}"),
            Self::Blur { radius } => write!(f, "{name}={radius}"),
            Self::Noise { strength } => write!(f, "{name}={strength}"),
            Self::Fragment { slices, rotate } => {
                write!(f, "{name}={slices}")?;
                if !rotate {
                    f.write_str(",norotate")?;
                }
                Ok(())
            }
            Self::Temperature { delta } => write!(f, "{name}={delta}"),
            Self::HexGrid { color } => write!(f, "{name}={color}"),
            Self::Grayscale
            | Self::Invert
            | Self::Sharpen
            | Self::Sepia
            | Self::CropCircle
            | Self::Glitch => f.write_str(name),
        }
    }
}

/// Something that can transform a pixel buffer in place.
///
/// Takes `&mut dyn RngCore` so implementors stay object-safe; effects that
/// need no randomness ignore it.
pub trait PixelEffect {
    /// Apply to `image`.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter or `config` is out of range. The
    /// buffer is left unmodified in that case.
    fn apply(
        &self,
        image: &mut RgbaImage,
        config: &EngineConfig,
        rng: &mut dyn RngCore,
    ) -> Result<(), EffectsError>;
}

impl PixelEffect for Effect {
    fn apply(
        &self,
        image: &mut RgbaImage,
        config: &EngineConfig,
        rng: &mut dyn RngCore,
    ) -> Result<(), EffectsError> {
        config.validate()?;
        match *self {
            Self::Grayscale => point::grayscale(image),
            Self::Invert => point::invert(image),
            Self::Sepia => point::sepia(image),
            Self::Sharpen => {
                *image = convolve_with(image, &Kernel::sharpen(), config.boundary);
            }
            Self::Blur { radius } => {
                if radius > Kernel::MAX_GAUSSIAN_RADIUS {
                    return Err(EffectsError::InvalidParameter(format!(
                        "blur radius must be at most {}, got {radius}",
                        Kernel::MAX_GAUSSIAN_RADIUS
                    )));
                }
                if radius == 0 {
                    log::debug!("blur radius 0: nothing to do");
                } else {
                    let kernel = Kernel::gaussian(radius);
                    *image = convolve_with(image, &kernel, config.boundary);
                }
            }
            Self::Vignette { radius } => radial::vignette(image, radius)?,
            Self::LightLeak { side } => radial::light_leak(image, side, config.light_leak_strength),
            Self::CropCircle => radial::crop_circle(image),
            Self::Noise { strength } => point::film_grain(image, strength, rng),
            Self::Fragment { slices, rotate } => tiles::fragment(image, slices, rotate, rng)?,
            Self::Temperature { delta } => point::temperature(image, delta),
            Self::Glitch => point::glitch(image, rng),
            Self::HexGrid { color } => overlay::hexagonal_grid(image, color),
        }
        Ok(())
    }
}

/// Apply one effect, logging its kind, the buffer size and the time taken.
///
/// # Errors
///
/// See [`PixelEffect::apply`].
pub fn apply(
    effect: &Effect,
    image: &mut RgbaImage,
    config: &EngineConfig,
    rng: &mut dyn RngCore,
) -> Result<(), EffectsError> {
    let dims = Dimensions::of(image);
    let start = std::time::Instant::now();
    effect.apply(image, config, rng)?;
    log::debug!("{} on {dims} in {:.2?}", effect.name(), start.elapsed());
    Ok(())
}

/// Apply a sequence of effects in order.
///
/// All or nothing: the chain runs on a copy and `image` is only replaced
/// once every effect has succeeded.
///
/// # Errors
///
/// Returns the first effect's error; `image` is then unchanged.
pub fn apply_chain(
    effects: &[Effect],
    image: &mut RgbaImage,
    config: &EngineConfig,
    rng: &mut dyn RngCore,
) -> Result<(), EffectsError> {
    let mut work = image.clone();
    for (index, effect) in effects.iter().enumerate() {
        log::trace!("chain step {index}: {effect}");
        apply(effect, &mut work, config, rng).inspect_err(|e| {
            log::warn!("chain aborted at step {index} ({effect}): {e}");
        })?;
    }
    *image = work;
    Ok(())
}

/// Apply an effect to raw RGBA bytes in place.
///
/// # Errors
///
/// Returns [`EffectsError::MalformedBuffer`] or
/// [`EffectsError::InvalidParameter`] if `bytes` does not describe a
/// `width x height` RGBA image, plus any error from the effect itself.
pub fn apply_raw(
    effect: &Effect,
    bytes: &mut [u8],
    width: u32,
    height: u32,
    config: &EngineConfig,
    rng: &mut dyn RngCore,
) -> Result<(), EffectsError> {
    let mut image = from_raw(width, height, bytes.to_vec())?;
    apply(effect, &mut image, config, rng)?;
    bytes.copy_from_slice(image.as_raw());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn run(effect: &Effect, image: &mut RgbaImage) -> Result<(), EffectsError> {
        apply(
            effect,
            image,
            &EngineConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
    }

    // --- parsing ---

    #[test]
    fn parse_bare_names() {
        assert_eq!(Effect::parse_spec("grayscale").unwrap(), Effect::Grayscale);
        assert_eq!(Effect::parse_spec("crop-circle").unwrap(), Effect::CropCircle);
        assert_eq!(Effect::parse_spec(" Glitch ").unwrap(), Effect::Glitch);
    }

    #[test]
    fn parse_values() {
        assert_eq!(
            Effect::parse_spec("blur=3").unwrap(),
            Effect::Blur { radius: 3 }
        );
        assert_eq!(
            Effect::parse_spec("temperature=-15").unwrap(),
            Effect::Temperature { delta: -15 }
        );
        assert_eq!(
            Effect::parse_spec("light_leak=top").unwrap(),
            Effect::LightLeak {
                side: LightLeakSide::Top
            }
        );
        assert_eq!(
            Effect::parse_spec("light-leak").unwrap(),
            Effect::LightLeak {
                side: LightLeakSide::Left
            }
        );
        assert_eq!(
            Effect::parse_spec("hex_grid=#f00").unwrap(),
            Effect::HexGrid {
                color: Rgb::new(255, 0, 0)
            }
        );
    }

    #[test]
    fn parse_fragment_flags() {
        assert_eq!(
            Effect::parse_spec("fragment=4").unwrap(),
            Effect::Fragment {
                slices: 4,
                rotate: true
            }
        );
        assert_eq!(
            Effect::parse_spec("fragment=4,norotate").unwrap(),
            Effect::Fragment {
                slices: 4,
                rotate: false
            }
        );
        assert!(Effect::parse_spec("fragment=4,spin").is_err());
    }

    #[test]
    fn parse_rejects_bad_input() {
        for spec in ["sparkle", "blur", "blur=", "blur=-1", "vignette=wide", "invert=1"] {
            assert!(
                matches!(Effect::parse_spec(spec), Err(EffectsError::InvalidParameter(_))),
                "{spec}"
            );
        }
        assert!(matches!(
            Effect::parse_spec("hex_grid=#xyz"),
            Err(EffectsError::InvalidColor(_))
        ));
    }

    #[test]
    fn display_parses_back() {
        let effects = [
            Effect::Sepia,
            Effect::Vignette { radius: 12.5 },
            Effect::LightLeak {
                side: LightLeakSide::Bottom,
            },
            Effect::Fragment {
                slices: 3,
                rotate: false,
            },
            Effect::HexGrid {
                color: Rgb::new(1, 2, 3),
            },
        ];
        for effect in effects {
            assert_eq!(effect.to_string().parse::<Effect>().unwrap(), effect);
        }
    }

    // --- serde ---

    #[test]
    fn json_uses_kind_tag() {
        let json = serde_json::to_value(Effect::Blur { radius: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "blur", "radius": 2}));

        let json = serde_json::to_value(Effect::CropCircle).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "crop_circle"}));
    }

    #[test]
    fn json_defaults() {
        let fragment: Effect = serde_json::from_str(r#"{"kind":"fragment","slices":2}"#).unwrap();
        assert_eq!(
            fragment,
            Effect::Fragment {
                slices: 2,
                rotate: true
            }
        );
        let leak: Effect = serde_json::from_str(r#"{"kind":"light_leak"}"#).unwrap();
        assert_eq!(
            leak,
            Effect::LightLeak {
                side: LightLeakSide::Left
            }
        );
    }

    #[test]
    fn json_hex_grid_color_is_a_string() {
        let effect: Effect =
            serde_json::from_str(r##"{"kind":"hex_grid","color":"#00ff00"}"##).unwrap();
        assert_eq!(
            effect,
            Effect::HexGrid {
                color: Rgb::new(0, 255, 0)
            }
        );
    }

    // --- dispatch ---

    #[test]
    fn blur_radius_zero_is_identity() {
        let original = RgbaImage::from_pixel(5, 5, image::Rgba([10, 20, 30, 40]));
        let mut img = original.clone();
        run(&Effect::Blur { radius: 0 }, &mut img).unwrap();
        assert_eq!(img, original);
    }

    #[test]
    fn blur_rejects_oversized_radius() {
        let original = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 40]));
        let mut img = original.clone();
        for radius in [Kernel::MAX_GAUSSIAN_RADIUS + 1, 4_000_000_000] {
            assert!(matches!(
                run(&Effect::Blur { radius }, &mut img),
                Err(EffectsError::InvalidParameter(_))
            ));
        }
        assert_eq!(img, original);

        let parsed: Effect = "blur=4000000000".parse().unwrap();
        assert!(run(&parsed, &mut img).is_err());
    }

    #[test]
    fn blur_at_max_radius_on_tiny_image() {
        let mut img = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let effect = Effect::Blur {
            radius: Kernel::MAX_GAUSSIAN_RADIUS,
        };
        run(&effect, &mut img).unwrap();
        for p in img.pixels() {
            let [r, g, b, a] = p.0;
            assert_eq!(a, 255);
            assert!(r.abs_diff(10) <= 1 && g.abs_diff(20) <= 1 && b.abs_diff(30) <= 1);
        }
    }

    #[test]
    fn unvalidated_config_is_rejected() {
        let original = RgbaImage::from_pixel(10, 2, image::Rgba([80, 80, 80, 255]));
        let mut img = original.clone();
        let config = EngineConfig {
            light_leak_strength: f32::NAN,
            ..EngineConfig::default()
        };
        let effect = Effect::LightLeak {
            side: LightLeakSide::Left,
        };
        let result = apply(&effect, &mut img, &config, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(EffectsError::InvalidParameter(_))));
        let chained = apply_chain(&[effect], &mut img, &config, &mut StdRng::seed_from_u64(0));
        assert!(chained.is_err());
        assert_eq!(img, original);
    }

    #[test]
    fn blur_makes_output_opaque() {
        let mut img = RgbaImage::from_pixel(5, 5, image::Rgba([10, 20, 30, 40]));
        run(&Effect::Blur { radius: 1 }, &mut img).unwrap();
        assert!(img.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn light_leak_uses_configured_strength() {
        let mut img = RgbaImage::from_pixel(10, 2, image::Rgba([0, 0, 0, 255]));
        let config = EngineConfig {
            light_leak_strength: 100.0,
            ..EngineConfig::default()
        };
        let effect = Effect::LightLeak {
            side: LightLeakSide::Left,
        };
        apply(&effect, &mut img, &config, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [100, 100, 100, 255]);
    }

    #[test]
    fn invalid_parameter_leaves_buffer_untouched() {
        let original = RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 9]));
        let mut img = original.clone();
        assert!(run(&Effect::Vignette { radius: 0.0 }, &mut img).is_err());
        assert!(
            run(
                &Effect::Fragment {
                    slices: 0,
                    rotate: true
                },
                &mut img
            )
            .is_err()
        );
        assert_eq!(img, original);
    }

    #[test]
    fn every_effect_preserves_dimensions() {
        let effects = [
            Effect::Grayscale,
            Effect::Invert,
            Effect::Sharpen,
            Effect::Sepia,
            Effect::Vignette { radius: 5.0 },
            Effect::LightLeak {
                side: LightLeakSide::Right,
            },
            Effect::Blur { radius: 2 },
            Effect::Noise { strength: 20.0 },
            Effect::Fragment {
                slices: 3,
                rotate: true,
            },
            Effect::CropCircle,
            Effect::Temperature { delta: 10 },
            Effect::Glitch,
            Effect::HexGrid {
                color: Rgb::new(0, 0, 0),
            },
        ];
        for effect in &effects {
            let mut img = RgbaImage::from_pixel(12, 9, image::Rgba([120, 60, 30, 255]));
            run(effect, &mut img).unwrap();
            assert_eq!(img.dimensions(), (12, 9), "{effect}");
        }
    }

    #[test]
    fn trait_object_dispatch() {
        let boxed: Vec<Box<dyn PixelEffect>> =
            vec![Box::new(Effect::Invert), Box::new(Effect::Invert)];
        let original = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 4]));
        let mut img = original.clone();
        let mut rng = StdRng::seed_from_u64(0);
        for effect in &boxed {
            effect
                .apply(&mut img, &EngineConfig::default(), &mut rng)
                .unwrap();
        }
        assert_eq!(img, original);
    }

    // --- chains ---

    #[test]
    fn chain_is_all_or_nothing() {
        let original = RgbaImage::from_pixel(4, 4, image::Rgba([50, 50, 50, 255]));
        let mut img = original.clone();
        let chain = [Effect::Invert, Effect::Vignette { radius: -1.0 }];
        let result = apply_chain(
            &chain,
            &mut img,
            &EngineConfig::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(result.is_err());
        assert_eq!(img, original);
    }

    #[test]
    fn chain_applies_in_order() {
        let mut img = RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]));
        let chain = [Effect::Temperature { delta: 20 }, Effect::Invert];
        apply_chain(
            &chain,
            &mut img,
            &EngineConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 20, 20, 255]);
    }

    // --- raw buffers ---

    #[test]
    fn apply_raw_mutates_bytes() {
        let mut bytes = vec![0, 100, 255, 7, 10, 20, 30, 40];
        apply_raw(
            &Effect::Invert,
            &mut bytes,
            2,
            1,
            &EngineConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(bytes, [255, 155, 0, 7, 245, 235, 225, 40]);
    }

    #[test]
    fn apply_raw_rejects_malformed_buffer() {
        let mut bytes = vec![0; 15];
        let err = apply_raw(
            &Effect::Invert,
            &mut bytes,
            2,
            2,
            &EngineConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EffectsError::MalformedBuffer {
                expected: 16,
                actual: 15
            }
        );
    }
}
