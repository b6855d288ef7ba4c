// Configuration - Window, pacing, input policy and palette
// Values come from `ORRERY_*` environment variables (optionally via `.env`).

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kinematics::{Rgb, Vector2};

/// Largest accepted fixed simulation step, in seconds
pub const MAX_FIXED_STEP: f64 = 60.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// How pointer input picks the inspected body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Resolve on every pointer move; nothing under the pointer clears it
    #[default]
    Hover,
    /// Resolve on pointer-down only and keep it until the next click
    Click,
}

/// Where the per-tick simulation delta comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeStep {
    /// Measured wall-clock time since the previous tick
    #[default]
    Measured,
    /// Constant seconds per tick, for reproducible runs
    Fixed(f64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Terminal,
    Headless,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Palette {
    pub background: Rgb,
    pub text: Rgb,
    pub orbit: Rgb,
    pub sun: Rgb,
    pub mercury: Rgb,
    pub venus: Rgb,
    pub earth: Rgb,
    pub mars: Rgb,
    pub jupiter: Rgb,
    pub saturn: Rgb,
    pub uranus: Rgb,
    pub neptune: Rgb,
    pub moon: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::new(0, 0, 0),
            text: Rgb::new(255, 255, 255),
            orbit: Rgb::new(100, 100, 100),
            sun: Rgb::new(255, 255, 0),
            mercury: Rgb::new(200, 200, 200),
            venus: Rgb::new(255, 165, 0),
            earth: Rgb::new(0, 0, 255),
            mars: Rgb::new(255, 0, 0),
            jupiter: Rgb::new(216, 169, 118),
            saturn: Rgb::new(226, 205, 140),
            uranus: Rgb::new(155, 220, 230),
            neptune: Rgb::new(70, 100, 230),
            moon: Rgb::new(200, 200, 200),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    /// Virtual window size in pixels
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    /// Upper bound on the wall delta fed to the simulation (seconds)
    pub max_frame_delta: f64,
    pub time_step: TimeStep,
    pub speed_step: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub selection: SelectionMode,
    pub backend: BackendKind,
    /// Frames rendered by the headless backend before it signals quit
    pub headless_frames: usize,
    pub log_file: PathBuf,
    pub palette: Palette,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 1650,
            height: 1000,
            target_fps: 60,
            max_frame_delta: 0.1,
            time_step: TimeStep::Measured,
            speed_step: 0.1,
            min_speed: 0.0,
            max_speed: 20.0,
            zoom_step: 0.1,
            min_zoom: 0.1,
            max_zoom: 10.0,
            selection: SelectionMode::Hover,
            backend: BackendKind::Terminal,
            headless_frames: 600,
            log_file: PathBuf::from("orrery.log"),
            palette: Palette::default(),
        }
    }
}

impl SimConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("ORRERY_WIDTH") {
            config.width = parse_positive("ORRERY_WIDTH", &v)?;
        }
        if let Some(v) = lookup("ORRERY_HEIGHT") {
            config.height = parse_positive("ORRERY_HEIGHT", &v)?;
        }
        if let Some(v) = lookup("ORRERY_FPS") {
            config.target_fps = parse_positive("ORRERY_FPS", &v)?;
        }
        if let Some(v) = lookup("ORRERY_MAX_FRAME_DELTA") {
            config.max_frame_delta = parse_positive_f64("ORRERY_MAX_FRAME_DELTA", &v)?;
        }
        if let Some(v) = lookup("ORRERY_TIME_STEP") {
            config.time_step = match v.trim().to_ascii_lowercase().as_str() {
                "measured" => TimeStep::Measured,
                other => {
                    let seconds = parse_positive_f64("ORRERY_TIME_STEP", other)?;
                    if seconds > MAX_FIXED_STEP {
                        return Err(ConfigError::invalid(
                            "ORRERY_TIME_STEP",
                            &v,
                            format!("must not exceed {MAX_FIXED_STEP} seconds"),
                        ));
                    }
                    TimeStep::Fixed(seconds)
                }
            };
        }
        if let Some(v) = lookup("ORRERY_SPEED_STEP") {
            config.speed_step = parse_positive_f64("ORRERY_SPEED_STEP", &v)?;
        }
        if let Some(v) = lookup("ORRERY_MAX_SPEED") {
            config.max_speed = parse_positive_f64("ORRERY_MAX_SPEED", &v)?;
        }
        if let Some(v) = lookup("ORRERY_ZOOM_STEP") {
            config.zoom_step = parse_positive_f64("ORRERY_ZOOM_STEP", &v)?;
        }
        if let Some(v) = lookup("ORRERY_MIN_ZOOM") {
            config.min_zoom = parse_positive_f64("ORRERY_MIN_ZOOM", &v)?;
        }
        if let Some(v) = lookup("ORRERY_MAX_ZOOM") {
            config.max_zoom = parse_positive_f64("ORRERY_MAX_ZOOM", &v)?;
        }
        if let Some(v) = lookup("ORRERY_SELECTION") {
            config.selection = match v.trim().to_ascii_lowercase().as_str() {
                "hover" => SelectionMode::Hover,
                "click" => SelectionMode::Click,
                _ => return Err(ConfigError::invalid("ORRERY_SELECTION", &v, "expected hover or click")),
            };
        }
        if let Some(v) = lookup("ORRERY_BACKEND") {
            config.backend = match v.trim().to_ascii_lowercase().as_str() {
                "terminal" => BackendKind::Terminal,
                "headless" => BackendKind::Headless,
                _ => return Err(ConfigError::invalid("ORRERY_BACKEND", &v, "expected terminal or headless")),
            };
        }
        if let Some(v) = lookup("ORRERY_HEADLESS_FRAMES") {
            config.headless_frames = parse_positive("ORRERY_HEADLESS_FRAMES", &v)?;
        }
        if let Some(v) = lookup("ORRERY_LOG_FILE") {
            config.log_file = PathBuf::from(v);
        }

        if config.min_zoom > config.max_zoom {
            return Err(ConfigError::invalid(
                "ORRERY_MIN_ZOOM",
                &config.min_zoom.to_string(),
                format!("exceeds maximum zoom {}", config.max_zoom),
            ));
        }

        Ok(config)
    }

    /// Centre of the virtual window
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let parsed = value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::invalid(key, value, e.to_string()))?;
    if parsed <= T::default() {
        return Err(ConfigError::invalid(key, value, "must be greater than zero"));
    }
    Ok(parsed)
}

fn parse_positive_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    let parsed: f64 = parse_positive(key, value)?;
    if !parsed.is_finite() {
        return Err(ConfigError::invalid(key, value, "must be finite"));
    }
    Ok(parsed)
}
