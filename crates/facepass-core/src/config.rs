use crate::capability::DetectorOptions;
use crate::overlay::OverlayStyle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL_SOURCE: &str = "https://cdn.jsdelivr.net/npm/@vladmandic/face-api/model/";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Session configuration, loaded from an optional TOML file and `FACEPASS_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory or base URI the three face models are loaded from.
    pub model_source: String,
    /// Frames discarded after the camera opens, while exposure settles.
    pub warmup_frames: usize,
    /// Detection loop period in milliseconds.
    pub poll_interval_ms: u64,
    /// Pause between arming verification and comparing, in milliseconds.
    pub verify_delay_ms: u64,
    /// Delay between a successful match and closing the view, in milliseconds.
    pub close_delay_ms: u64,
    /// Descriptor distance below which a verification succeeds.
    pub match_threshold: f32,
    /// Detector input size in pixels.
    pub detector_input_size: u32,
    /// Minimum detector score.
    pub detector_score_threshold: f32,
    /// Overlay oval stroke width.
    pub overlay_stroke_width: f32,
    /// Overlay oval colour as RGB.
    pub overlay_color: [u8; 3],
}

impl Default for Config {
    fn default() -> Self {
        let detector = DetectorOptions::default();
        let style = OverlayStyle::default();
        Self {
            camera_device: "/dev/video0".to_string(),
            model_source: DEFAULT_MODEL_SOURCE.to_string(),
            warmup_frames: 4,
            poll_interval_ms: 100,
            verify_delay_ms: 5_000,
            close_delay_ms: 2_000,
            match_threshold: 0.5,
            detector_input_size: detector.input_size,
            detector_score_threshold: detector.score_threshold,
            overlay_stroke_width: style.stroke_width,
            overlay_color: style.color,
        }
    }
}

impl Config {
    /// Load the file named by `FACEPASS_CONFIG` (if set), then apply
    /// `FACEPASS_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("FACEPASS_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.display().to_string(),
            error,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `FACEPASS_*` environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Self {
        Self {
            camera_device: std::env::var("FACEPASS_CAMERA_DEVICE").unwrap_or(self.camera_device),
            model_source: std::env::var("FACEPASS_MODEL_SOURCE").unwrap_or(self.model_source),
            warmup_frames: env_usize("FACEPASS_WARMUP_FRAMES", self.warmup_frames),
            poll_interval_ms: env_u64("FACEPASS_POLL_INTERVAL_MS", self.poll_interval_ms),
            verify_delay_ms: env_u64("FACEPASS_VERIFY_DELAY_MS", self.verify_delay_ms),
            close_delay_ms: env_u64("FACEPASS_CLOSE_DELAY_MS", self.close_delay_ms),
            match_threshold: env_f32("FACEPASS_MATCH_THRESHOLD", self.match_threshold),
            detector_input_size: env_u32("FACEPASS_DETECTOR_INPUT_SIZE", self.detector_input_size),
            detector_score_threshold: env_f32(
                "FACEPASS_DETECTOR_SCORE_THRESHOLD",
                self.detector_score_threshold,
            ),
            overlay_stroke_width: env_f32("FACEPASS_OVERLAY_STROKE_WIDTH", self.overlay_stroke_width),
            overlay_color: self.overlay_color,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero period would make `tokio::time::interval` panic.
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            input_size: self.detector_input_size,
            score_threshold: self.detector_score_threshold,
        }
    }

    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            stroke_width: self.overlay_stroke_width,
            color: self.overlay_color,
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
