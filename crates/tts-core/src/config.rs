//! Process-wide service configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{TtsError, TtsResult};
use crate::types::Lang;

/// Default location of the add-on options document.
pub const DEFAULT_OPTIONS_PATH: &str = "/data/options.json";

/// Synthesis defaults, loaded once at startup and read-only afterwards.
///
/// The options document is flat JSON and may carry keys for other
/// subsystems; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Language used when a caller does not name one.
    #[serde(default)]
    pub default_language: Lang,
    /// Voice id used when a caller does not name one.
    #[serde(default = "default_voice")]
    pub default_voice: String,
    /// Default speech speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Default linear gain.
    #[serde(default = "default_volume_boost")]
    pub volume_boost: f32,
    /// Default engine step count.
    #[serde(default = "default_quality")]
    pub quality: u32,
}

fn default_voice() -> String {
    "M4".to_string()
}

fn default_speed() -> f32 {
    1.5
}

fn default_volume_boost() -> f32 {
    2.0
}

fn default_quality() -> u32 {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_language: Lang::default(),
            default_voice: default_voice(),
            speed: default_speed(),
            volume_boost: default_volume_boost(),
            quality: default_quality(),
        }
    }
}

impl ServiceConfig {
    /// Load the options document, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> TtsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No options file found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| TtsError::config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_json(&raw)
            .map_err(|e| TtsError::config(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse an options document.
    pub fn from_json(raw: &str) -> TtsResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        if config.quality == 0 {
            return Err(TtsError::config("quality must be at least 1"));
        }
        Ok(config)
    }
}
