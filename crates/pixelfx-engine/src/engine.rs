//! [`Engine`]: an [`EngineConfig`] and a random source bundled together.
//!
//! The engine holds no image state. Each call borrows the caller's
//! buffer, transforms it, and lets go; the only thing carried between
//! calls is the rng, so a seeded engine replays the same output for the
//! same sequence of calls.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::EngineConfig;
use crate::effect::{self, Effect};
use crate::histogram::{self, ChannelSelector, Histogram};
use crate::types::{EffectsError, RgbaImage};

/// Applies effects and builds histograms under one configuration.
#[derive(Debug, Clone)]
pub struct Engine<R = StdRng> {
    config: EngineConfig,
    rng: R,
}

impl Engine<StdRng> {
    /// Engine seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidParameter`] if `config` fails
    /// [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self, EffectsError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Engine with a fixed seed, for reproducible output.
    ///
    /// # Errors
    ///
    /// See [`Engine::new`].
    pub fn seeded(config: EngineConfig, seed: u64) -> Result<Self, EffectsError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> Engine<R> {
    /// Engine with a caller-supplied random source.
    ///
    /// # Errors
    ///
    /// See [`Engine::new`].
    pub fn with_rng(config: EngineConfig, rng: R) -> Result<Self, EffectsError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply one effect in place.
    ///
    /// # Errors
    ///
    /// Returns the effect's parameter error; `image` is unchanged.
    pub fn apply(&mut self, effect: &Effect, image: &mut RgbaImage) -> Result<(), EffectsError> {
        effect::apply(effect, image, &self.config, &mut self.rng)
    }

    /// Apply effects in order, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failing effect's error; `image` is unchanged.
    pub fn apply_chain(
        &mut self,
        effects: &[Effect],
        image: &mut RgbaImage,
    ) -> Result<(), EffectsError> {
        effect::apply_chain(effects, image, &self.config, &mut self.rng)
    }

    /// Apply one effect to raw RGBA bytes in place.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::MalformedBuffer`] if `bytes.len()` is not
    /// `width * height * 4`, plus any error from the effect.
    pub fn apply_raw(
        &mut self,
        effect: &Effect,
        bytes: &mut [u8],
        width: u32,
        height: u32,
    ) -> Result<(), EffectsError> {
        effect::apply_raw(effect, bytes, width, height, &self.config, &mut self.rng)
    }

    /// Fresh histogram of `image`.
    #[must_use]
    pub fn histogram(&self, image: &RgbaImage) -> Histogram {
        let histogram = Histogram::compute(image);
        log::trace!("histogram of {}x{}: max {}", image.width(), image.height(), histogram.max());
        histogram
    }

    /// Render `histogram` at the configured chart size.
    #[must_use = "returns the rendered histogram"]
    pub fn render_histogram(&self, histogram: &Histogram, selector: ChannelSelector) -> RgbaImage {
        histogram::render(histogram, self.config.histogram_size(), selector)
    }
}
