use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::camera::types::{Dimensions, ImageFormat};
use crate::preview::encode::DEFAULT_JPEG_QUALITY;
use crate::preview::sampler::RunSettings;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_width() -> u32 {
    320
}

fn default_height() -> u32 {
    180
}

fn default_frames() -> u32 {
    10
}

fn default_interval() -> u64 {
    200
}

fn default_quality() -> f32 {
    DEFAULT_JPEG_QUALITY
}

fn default_settle_delay() -> u64 {
    1200
}

/// Capture configuration. Every field is optional in JSON.
///
/// ```json
/// { "width": 320, "height": 180, "frames": 10, "interval": 200,
///   "type": "image/jpeg", "quality": 0.4, "settleDelay": 1200 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Frames per capture run.
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// Delay between frames in milliseconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default, rename = "type")]
    pub format: ImageFormat,
    /// Encoder quality in `0.0..=1.0`, used by JPEG only.
    #[serde(default = "default_quality")]
    pub quality: f32,
    /// Stabilisation window after the stream starts, in milliseconds.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            frames: default_frames(),
            interval: default_interval(),
            format: ImageFormat::default(),
            quality: default_quality(),
            settle_delay: default_settle_delay(),
        }
    }
}

impl CaptureConfig {
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.as_millis() as u64;
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay.as_millis() as u64;
        self
    }

    /// Reject values no capture run can honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(ConfigError::Invalid(format!(
                "quality must be within 0..=1, got {}",
                self.quality
            )));
        }
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay)
    }

    /// Quality passed to the encoder; `None` for formats that ignore it.
    pub fn effective_quality(&self) -> Option<f32> {
        self.format.uses_quality().then_some(self.quality)
    }

    /// Parameters for one capture run.
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            frames: self.frames,
            interval: self.interval(),
            format: self.format,
            quality: self.effective_quality(),
        }
    }
}
