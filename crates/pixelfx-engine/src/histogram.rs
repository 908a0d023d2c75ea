//! Per-channel intensity histograms and their bar-chart rendering.
//!
//! [`Histogram::compute`] counts R, G and B values (alpha excluded) in a
//! single pass. All three channels share one normalization denominator,
//! the largest bucket across every channel, so their bar heights are
//! directly comparable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, EffectsError, RgbaImage};

/// Number of buckets per channel.
pub const BUCKETS: usize = 256;

/// Largest chart width or height [`render`] will allocate.
pub const MAX_CHART_SIDE: u32 = 4096;

/// A color channel of the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
}

impl Channel {
    /// All channels in drawing order.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }

    /// Bar color: CSS `red`, `green` (`#008000`), and `blue`.
    const fn bar_color(self) -> image::Rgba<u8> {
        match self {
            Self::Red => image::Rgba([255, 0, 0, 255]),
            Self::Green => image::Rgba([0, 128, 0, 255]),
            Self::Blue => image::Rgba([0, 0, 255, 255]),
        }
    }
}

/// Which channels [`render`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSelector {
    /// Red only.
    Red,
    /// Green only.
    Green,
    /// Blue only.
    Blue,
    /// Red, then green, then blue, overlaid.
    #[default]
    All,
}

impl ChannelSelector {
    /// Channels to draw, in drawing order.
    #[must_use]
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Self::Red => &Channel::ALL[0..1],
            Self::Green => &Channel::ALL[1..2],
            Self::Blue => &Channel::ALL[2..3],
            Self::All => &Channel::ALL,
        }
    }
}

impl FromStr for ChannelSelector {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "all" => Ok(Self::All),
            other => Err(EffectsError::InvalidParameter(format!(
                "channel must be red, green, blue, or all; got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::All => "all",
        })
    }
}

/// Bucket counts for R, G and B plus the shared maximum.
///
/// Serializes through a proxy of `Vec<u32>` per channel because serde
/// does not support 256-element arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [[u32; BUCKETS]; 3],
    max: u32,
}

impl Histogram {
    /// Count channel values across `image`.
    #[must_use]
    pub fn compute(image: &RgbaImage) -> Self {
        let mut counts = [[0_u32; BUCKETS]; 3];
        for pixel in image.pixels() {
            for (channel, &value) in counts.iter_mut().zip(&pixel.0[..3]) {
                channel[usize::from(value)] += 1;
            }
        }
        let max = counts.iter().flatten().copied().max().unwrap_or(0);
        Self { counts, max }
    }

    /// Counts for one channel.
    #[must_use]
    pub const fn channel(&self, channel: Channel) -> &[u32; BUCKETS] {
        &self.counts[channel.index()]
    }

    /// Largest bucket across all three channels.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// `count / max` for one bucket, in `[0, 1]`. Zero for an empty image.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn normalized(&self, channel: Channel, bucket: u8) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.channel(channel)[usize::from(bucket)] as f32 / self.max as f32
    }
}

/// Serde-compatible proxy for `Histogram`.
#[derive(Serialize, Deserialize)]
struct HistogramProxy {
    red: Vec<u32>,
    green: Vec<u32>,
    blue: Vec<u32>,
    max: u32,
}

impl Serialize for Histogram {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [red, green, blue] = self.counts.map(|c| c.to_vec());
        HistogramProxy {
            red,
            green,
            blue,
            max: self.max,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Histogram {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = HistogramProxy::deserialize(deserializer)?;
        let to_array = |v: Vec<u32>| -> Result<[u32; BUCKETS], D::Error> {
            <[u32; BUCKETS]>::try_from(v).map_err(|v| {
                serde::de::Error::custom(format!(
                    "histogram channel must have {BUCKETS} buckets, got {}",
                    v.len()
                ))
            })
        };
        Ok(Self {
            counts: [
                to_array(proxy.red)?,
                to_array(proxy.green)?,
                to_array(proxy.blue)?,
            ],
            max: proxy.max,
        })
    }
}

/// Draw the histogram as bottom-aligned bars on a transparent canvas.
///
/// Each bucket is `max(1, width / 256)` columns wide; a bar's height is
/// `normalized * height`, rounded. With [`ChannelSelector::All`] the
/// channels are drawn red, green, blue in turn, so where bars overlap the
/// later channel covers the earlier one.
///
/// Each side of `size` is clamped to [`MAX_CHART_SIDE`].
#[must_use = "returns the rendered histogram"]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn render(histogram: &Histogram, size: Dimensions, selector: ChannelSelector) -> RgbaImage {
    if size.width > MAX_CHART_SIDE || size.height > MAX_CHART_SIDE {
        log::warn!("histogram chart {size} clamped to at most {MAX_CHART_SIDE} per side");
    }
    let size = Dimensions::new(
        size.width.min(MAX_CHART_SIDE),
        size.height.min(MAX_CHART_SIDE),
    );
    let mut canvas = RgbaImage::new(size.width, size.height);
    if histogram.max() == 0 || size.width == 0 || size.height == 0 {
        return canvas;
    }

    let bar_width = (size.width / BUCKETS as u32).max(1);
    for &channel in selector.channels() {
        let color = channel.bar_color();
        for bucket in 0..=u8::MAX {
            let x0 = u32::from(bucket) * bar_width;
            if x0 >= size.width {
                break;
            }
            let bar = (histogram.normalized(channel, bucket) * size.height as f32).round() as u32;
            let bar = bar.min(size.height);
            for y in size.height - bar..size.height {
                for x in x0..(x0 + bar_width).min(size.width) {
                    canvas.put_pixel(x, y, color);
                }
            }
        }
    }
    canvas
}
