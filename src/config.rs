use std::{ffi::OsString, path::PathBuf};

use clap::Parser;

pub const DEFAULT_MODEL_PATH: &str = "assets/models/spinning_cube.glb";

/// Seconds the animation mixer advances per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationClock {
    /// Fixed step regardless of the actual frame time.
    Fixed(f32),
    Measured,
}

impl AnimationClock {
    pub const NOMINAL_FRAME_TIME: f32 = 0.016;

    pub fn step(&self, measured: f32) -> f32 {
        match *self {
            AnimationClock::Fixed(step) => step,
            AnimationClock::Measured => measured,
        }
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        AnimationClock::Fixed(Self::NOMINAL_FRAME_TIME)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub width: u32,
    pub height: u32,
    pub model_path: PathBuf,
    pub animation_clock: AnimationClock,
    pub hot_reload_shaders: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            animation_clock: AnimationClock::default(),
            hot_reload_shaders: false,
        }
    }
}

impl AppConfig {
    /// Parses the process arguments, exiting with usage on malformed input.
    pub fn from_env() -> Self {
        Self::try_from_args(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map(AppConfig::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

fn parse_window_size(value: &str) -> Result<WindowSize, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;

    let parse = |dimension: &str| match dimension.parse::<u32>() {
        Ok(0) => Err(format!("window dimensions must be positive, got '{}'", value)),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid dimension '{}': {}", dimension, e)),
    };

    Ok(WindowSize {
        width: parse(width)?,
        height: parse(height)?,
    })
}

#[derive(Parser, Debug)]
#[command(about = "Render a 3D demo scene in a window")]
pub struct Cli {
    /// Window size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_window_size)]
    size: Option<WindowSize>,

    /// Window width, overrides --size
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Window height, overrides --size
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    /// GLB file shown by the viewer
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Advance animations by the measured frame time instead of a fixed step
    #[arg(long)]
    measured_time: bool,

    /// Recompile shaders when their source files change
    #[arg(long)]
    hot_reload: bool,
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        let defaults = AppConfig::default();
        let size = cli.size.unwrap_or(WindowSize {
            width: defaults.width,
            height: defaults.height,
        });

        AppConfig {
            width: cli.width.unwrap_or(size.width),
            height: cli.height.unwrap_or(size.height),
            model_path: cli.model,
            animation_clock: if cli.measured_time {
                AnimationClock::Measured
            } else {
                defaults.animation_clock
            },
            hot_reload_shaders: cli.hot_reload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<AppConfig, clap::Error> {
        AppConfig::try_from_args(std::iter::once("demo").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_without_arguments() {
        let config = parse(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.animation_clock.step(0.5), 0.016);
    }

    #[test]
    fn parses_all_flags() {
        let config = parse(&[
            "--size=640x480",
            "--model=models/chair.glb",
            "--measured-time",
            "--hot-reload",
        ])
        .unwrap();

        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.model_path, PathBuf::from("models/chair.glb"));
        assert_eq!(config.animation_clock, AnimationClock::Measured);
        assert_eq!(config.animation_clock.step(0.033), 0.033);
        assert!(config.hot_reload_shaders);
    }

    #[test]
    fn width_and_height_override_size() {
        let config = parse(&["--size", "640x480", "--height", "200"]).unwrap();
        assert_eq!((config.width, config.height), (640, 200));
    }

    #[test]
    fn rejects_malformed_and_unknown_arguments() {
        assert!(parse(&["--size=big"]).is_err());
        assert!(parse(&["--size=0x480"]).is_err());
        assert!(parse(&["--height=0"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
    }

    #[test]
    fn window_size_accepts_either_separator() {
        assert_eq!(
            parse_window_size("800X600"),
            Ok(WindowSize {
                width: 800,
                height: 600
            })
        );
    }
}
