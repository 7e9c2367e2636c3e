//! Application configuration
//!
//! One TOML file configures every part of the pilot. Every table is optional
//! and falls back to its defaults:
//!
//! ```toml
//! [flight]
//! cooldown_s = 1.5
//! movement_frame = "body"
//!
//! [frame_source]
//! min_interval_ms = 33
//!
//! [control]
//! training_log = "model/keypoint.csv"
//!
//! [backend]
//! kind = "udp"
//! drone_addr = "192.168.10.1:8889"
//!
//! [[gestures]]
//! class_id = 0
//! gesture = "open"
//! name = "Open"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use gesture_pilot_core::{FlightConfig, GestureTable};
use gesture_pilot_sitl::BackendConfig;
use serde::Deserialize;

use crate::error::PilotError;

/// Frame acquisition settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameSourceConfig {
    /// Name of the acquisition thread.
    pub thread_name: String,
    /// Minimum time between two captures in milliseconds. 0 captures as
    /// fast as the device delivers.
    pub min_interval_ms: u64,
}

impl Default for FrameSourceConfig {
    fn default() -> Self {
        Self {
            thread_name: "frame-source".to_string(),
            min_interval_ms: 33,
        }
    }
}

impl FrameSourceConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Control loop settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Minimum time between two processed frames in milliseconds.
    pub sampling_interval_ms: u64,
    /// Sleep between loop iterations in milliseconds.
    pub poll_interval_ms: u64,
    /// Landmark count every processed hand must have. None accepts any.
    pub landmark_count: Option<usize>,
    /// Where training rows are appended.
    pub training_log: PathBuf,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: 10,
            poll_interval_ms: 10,
            landmark_count: Some(21),
            training_log: PathBuf::from("model/keypoint.csv"),
        }
    }
}

impl ControlConfig {
    pub fn sampling_interval_us(&self) -> u64 {
        self.sampling_interval_ms.saturating_mul(1000)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub flight: FlightConfig,
    pub frame_source: FrameSourceConfig,
    pub control: ControlConfig,
    pub gestures: GestureTable,
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Parse and validate configuration text.
    pub fn from_toml(text: &str) -> Result<Self, PilotError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, PilotError> {
        let text = std::fs::read_to_string(path).map_err(|source| PilotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), PilotError> {
        self.flight.validate().map_err(PilotError::InvalidConfig)?;
        self.gestures.validate().map_err(PilotError::InvalidConfig)?;
        if self.control.landmark_count == Some(0) {
            return Err(PilotError::InvalidConfig(
                "landmark_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
