use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::orientation::HORIZONTAL_Y_THRESHOLD;

const SETTINGS_PATH_ENV: &str = "TILTGUN_SETTINGS_PATH";

/// Gravity; a threshold above it would call every pose horizontal.
const MAX_HORIZONTAL_THRESHOLD: f32 = 9.81;
const MAX_SAMPLE_INTERVAL_MS: u64 = 1_000;
const MAX_ROTATION_TWEEN_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub mute_all: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            sfx_volume: 1.0,
            mute_all: false,
        }
    }
}

impl AudioSettings {
    pub fn clamp(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self
    }

    pub fn effective_sfx_gain(self) -> f32 {
        if self.mute_all {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorSettings {
    pub horizontal_threshold: f32,
    pub sample_interval_ms: u64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            horizontal_threshold: HORIZONTAL_Y_THRESHOLD,
            sample_interval_ms: 60,
        }
    }
}

impl SensorSettings {
    pub fn sample_interval(self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PresentationSettings {
    pub rotation_tween_ms: u64,
    pub reduce_motion: bool,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            rotation_tween_ms: 400,
            reduce_motion: false,
        }
    }
}

impl PresentationSettings {
    pub fn rotation_tween(self) -> Duration {
        if self.reduce_motion {
            Duration::ZERO
        } else {
            Duration::from_millis(self.rotation_tween_ms)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub sensor: SensorSettings,
    #[serde(default)]
    pub presentation: PresentationSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            audio: AudioSettings::default(),
            sensor: SensorSettings::default(),
            presentation: PresentationSettings::default(),
        }
    }
}

impl PlayerSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.audio = self.audio.clamp();

        let threshold = self.sensor.horizontal_threshold;
        self.sensor.horizontal_threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold.min(MAX_HORIZONTAL_THRESHOLD)
        } else {
            HORIZONTAL_Y_THRESHOLD
        };
        self.sensor.sample_interval_ms =
            self.sensor.sample_interval_ms.clamp(1, MAX_SAMPLE_INTERVAL_MS);
        self.presentation.rotation_tween_ms =
            self.presentation.rotation_tween_ms.min(MAX_ROTATION_TWEEN_MS);
        self
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os(SETTINGS_PATH_ENV) {
            return Self::at(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".config");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("tiltgun");
        path.push("settings.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files yield defaults; this never fails.
    pub fn load(&self) -> PlayerSettings {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(
                    path = %self.path.display(),
                    error = %err,
                    "no settings file, using defaults"
                );
                return PlayerSettings::default();
            }
        };
        match serde_json::from_slice::<PlayerSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring invalid settings file");
                PlayerSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &PlayerSettings) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, text).map_err(io_err)
    }
}
