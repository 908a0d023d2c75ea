//! pixelfx: apply a chain of pixel effects to an image file.
//!
//! Decodes the input, runs every effect in order through the engine, and
//! writes the result. Optionally renders the result's histogram and
//! reports the color of a single pixel.
//!
//! # Usage
//!
//! ```text
//! pixelfx photo.jpg -o out.png --effect sepia --effect vignette=300 --seed 7
//! pixelfx photo.jpg -o out.png --effects-json '[{"kind":"blur","radius":3}]'
//! pixelfx photo.jpg --histogram hist.png --channel red --info 10,20
//! ```
//!
//! Set `RUST_LOG=debug` to see per-effect timings.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pixelfx_engine::color::{rgb_to_cmyk, rgb_to_hex, rgb_to_hsl};
use pixelfx_engine::{ChannelSelector, Effect, EffectsError, Engine, EngineConfig, Rgb, RgbaImage};

/// Apply pixel effects to an image.
///
/// Effects run in the order given: first every `--effect`, then the
/// contents of `--effects-json`.
#[derive(Parser)]
#[command(name = "pixelfx", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Where to write the processed image; format follows the extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Effect as `name` or `name=value`, e.g. `blur=3`, `fragment=4,norotate`.
    /// Repeatable.
    #[arg(short, long = "effect", value_name = "SPEC")]
    effects: Vec<Effect>,

    /// Effects as a JSON array of `{"kind": ...}` objects.
    #[arg(long)]
    effects_json: Option<String>,

    /// Engine configuration as a JSON object; missing fields take defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Seed for the random effects (noise, glitch, fragment).
    #[arg(long)]
    seed: Option<u64>,

    /// Write a histogram chart of the processed image to this PNG.
    #[arg(long)]
    histogram: Option<PathBuf>,

    /// Channels drawn in the histogram chart.
    #[arg(long, default_value_t = ChannelSelector::All)]
    channel: ChannelSelector,

    /// Print the processed color of the pixel at `X,Y` as hex, HSL and CMYK.
    #[arg(long, value_name = "X,Y", value_parser = parse_point)]
    info: Option<(u32, u32)>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Effects(#[from] EffectsError),

    #[error("invalid JSON in {flag}: {source}")]
    Json {
        flag: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("pixel {x},{y} is outside the {width}x{height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

fn parse_point(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("bad coordinate '{v}': {e}"))
    };
    Ok((coord(x)?, coord(y)?))
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(buf, "[{style}{}{style:#}] {}", record.level(), record.args())
        })
        .init();
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config: EngineConfig = match &cli.config_json {
        Some(json) => parse_json(json, "--config-json")?,
        None => EngineConfig::default(),
    };

    let mut effects = cli.effects.clone();
    if let Some(json) = &cli.effects_json {
        effects.extend(parse_json::<Vec<Effect>>(json, "--effects-json")?);
    }

    let mut engine = match cli.seed {
        Some(seed) => Engine::seeded(config, seed)?,
        None => Engine::new(config)?,
    };

    let mut image = load(&cli.input)?;
    log::info!(
        "{}: {}x{}, {} effect(s)",
        cli.input.display(),
        image.width(),
        image.height(),
        effects.len()
    );

    engine.apply_chain(&effects, &mut image)?;

    if let Some(path) = &cli.output {
        save(&image, path)?;
        log::info!("wrote {}", path.display());
    } else if !effects.is_empty() {
        log::warn!("no --output given; processed image discarded");
    }

    if let Some(path) = &cli.histogram {
        let histogram = engine.histogram(&image);
        let chart = engine.render_histogram(&histogram, cli.channel);
        save(&chart, path)?;
        log::info!("wrote {} histogram to {}", cli.channel, path.display());
    }

    if let Some((x, y)) = cli.info {
        print_pixel_info(&image, x, y)?;
    }
    Ok(())
}

fn parse_json<T: serde::de::DeserializeOwned>(json: &str, flag: &'static str) -> Result<T, CliError> {
    serde_json::from_str(json).map_err(|source| CliError::Json { flag, source })
}

fn load(path: &Path) -> Result<RgbaImage, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| CliError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.into_rgba8())
}

fn save(image: &RgbaImage, path: &Path) -> Result<(), CliError> {
    image.save(path).map_err(|source| CliError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn print_pixel_info(image: &RgbaImage, x: u32, y: u32) -> Result<(), CliError> {
    let pixel = image
        .get_pixel_checked(x, y)
        .ok_or(CliError::OutOfBounds {
            x,
            y,
            width: image.width(),
            height: image.height(),
        })?;
    let rgb = Rgb::from_pixel(*pixel);
    let hsl = rgb_to_hsl(rgb);
    let cmyk = rgb_to_cmyk(rgb);

    println!("pixel  {x},{y}");
    println!("rgba   {} {} {} {}", rgb.r, rgb.g, rgb.b, pixel.0[3]);
    println!("hex    {}", rgb_to_hex(rgb));
    println!(
        "hsl    {:.0}° {:.1}% {:.1}%",
        hsl.h * 360.0,
        hsl.s * 100.0,
        hsl.l * 100.0
    );
    println!(
        "cmyk   {:.1}% {:.1}% {:.1}% {:.1}%",
        cmyk.c * 100.0,
        cmyk.m * 100.0,
        cmyk.y * 100.0,
        cmyk.k * 100.0
    );
    Ok(())
}
