//! pixelfx-engine: stateless pixel effects over in-memory RGBA buffers.
//!
//! The engine never decodes, encodes, or displays anything. A host hands
//! it an [`RgbaImage`] (or raw RGBA bytes with their dimensions), picks an
//! [`Effect`], and gets the transformed buffer back:
//!
//! ```
//! use pixelfx_engine::{Effect, Engine, EngineConfig, RgbaImage};
//!
//! let mut image = RgbaImage::from_pixel(8, 8, image::Rgba([200, 120, 40, 255]));
//! let mut engine = Engine::seeded(EngineConfig::default(), 7)?;
//! engine.apply_chain(
//!     &["sepia".parse()?, "vignette=6".parse()?, Effect::Glitch],
//!     &mut image,
//! )?;
//! let histogram = engine.histogram(&image);
//! assert_eq!(histogram.channel(pixelfx_engine::Channel::Red).iter().sum::<u32>(), 64);
//! # Ok::<(), pixelfx_engine::EffectsError>(())
//! ```
//!
//! Randomized effects (film grain, glitch, tile shuffle) draw from a
//! caller-supplied rng, so a fixed seed gives reproducible output.

pub mod color;
pub mod config;
pub mod convolve;
pub mod effect;
pub mod engine;
pub mod histogram;
pub mod kernel;
pub mod overlay;
pub mod point;
pub mod radial;
pub mod tiles;
pub mod types;

pub use color::{Cmyk, Hsl, Rgb};
pub use config::EngineConfig;
pub use convolve::BoundaryPolicy;
pub use effect::{Effect, PixelEffect, apply, apply_chain, apply_raw};
pub use engine::Engine;
pub use histogram::{Channel, ChannelSelector, Histogram};
pub use kernel::Kernel;
pub use radial::LightLeakSide;
pub use types::{Dimensions, EffectsError, PixelBuffer, RgbaImage};
