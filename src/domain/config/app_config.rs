//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::proximity::ThresholdMode;
use crate::domain::recording::Duration;

/// Default maximum range reported by the virtual proximity sensor (cm)
pub const DEFAULT_SENSOR_MAX_RANGE: f32 = 5.0;

/// Proximity sensor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProximityConfig {
    pub threshold: Option<String>,
    pub max_range: Option<f32>,
}

/// Output device names per route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub speaker_device: Option<String>,
    pub earpiece_device: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub recordings_dir: Option<String>,
    pub max_duration: Option<String>,
    pub notify: Option<bool>,
    pub auto_theme: Option<bool>,
    pub proximity: Option<ProximityConfig>,
    pub output: Option<OutputConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            recordings_dir: None,
            max_duration: Some("10m".to_string()),
            notify: Some(false),
            auto_theme: Some(true),
            proximity: Some(ProximityConfig {
                threshold: Some(ThresholdMode::default().to_string()),
                max_range: Some(DEFAULT_SENSOR_MAX_RANGE),
            }),
            output: Some(OutputConfig::default()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            max_duration: other.max_duration.or(self.max_duration),
            notify: other.notify.or(self.notify),
            auto_theme: other.auto_theme.or(self.auto_theme),
            proximity: match (self.proximity, other.proximity) {
                (Some(b), Some(o)) => Some(ProximityConfig {
                    threshold: o.threshold.or(b.threshold),
                    max_range: o.max_range.or(b.max_range),
                }),
                (b, o) => o.or(b),
            },
            output: match (self.output, other.output) {
                (Some(b), Some(o)) => Some(OutputConfig {
                    speaker_device: o.speaker_device.or(b.speaker_device),
                    earpiece_device: o.earpiece_device.or(b.earpiece_device),
                }),
                (b, o) => o.or(b),
            },
        }
    }

    /// Recordings directory, or `<data dir>/voice-memo/recordings`
    pub fn recordings_dir_or_default(&self) -> PathBuf {
        match self.recordings_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("voice-memo")
                .join("recordings"),
        }
    }

    /// Recording time limit, or the default if not set/invalid
    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_recording)
    }

    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    pub fn auto_theme_or_default(&self) -> bool {
        self.auto_theme.unwrap_or(true)
    }

    /// Proximity threshold mode, or full range if not set/invalid
    pub fn threshold_or_default(&self) -> ThresholdMode {
        self.proximity
            .as_ref()
            .and_then(|p| p.threshold.as_ref())
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    /// Virtual sensor max range; zero or negative means "no sensor"
    pub fn sensor_max_range_or_default(&self) -> f32 {
        self.proximity
            .as_ref()
            .and_then(|p| p.max_range)
            .unwrap_or(DEFAULT_SENSOR_MAX_RANGE)
    }

    pub fn speaker_device(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.speaker_device.as_deref())
    }

    pub fn earpiece_device(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.earpiece_device.as_deref())
    }
}
