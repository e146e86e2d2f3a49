use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::*;
use crate::player::EngineSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub controls: ControlsConfig,

    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_play_confirm_timeout_ms")]
    pub play_confirm_timeout_ms: u64,

    #[serde(default = "default_unmute_volume_floor")]
    pub unmute_volume_floor: f64,

    #[serde(default = "default_initial_volume")]
    pub initial_volume: f64,

    #[serde(default = "default_skip_step_seconds")]
    pub skip_step_seconds: f64,

    #[serde(default = "default_volume_step")]
    pub volume_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,
}

impl Config {
    /// Load the user config, writing the defaults on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.controls.inactivity_timeout_ms == 0 {
            anyhow::bail!("controls.inactivity_timeout_ms must be greater than 0");
        }
        if self.playback.play_confirm_timeout_ms == 0 {
            anyhow::bail!("playback.play_confirm_timeout_ms must be greater than 0");
        }
        if !(self.playback.unmute_volume_floor > 0.0 && self.playback.unmute_volume_floor <= 1.0)
        {
            anyhow::bail!("playback.unmute_volume_floor must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.playback.initial_volume) {
            anyhow::bail!("playback.initial_volume must be between 0 and 1");
        }
        if !(self.playback.volume_step > 0.0 && self.playback.volume_step <= 1.0) {
            anyhow::bail!("playback.volume_step must be in (0, 1]");
        }
        if !(self.playback.skip_step_seconds.is_finite() && self.playback.skip_step_seconds > 0.0) {
            anyhow::bail!("playback.skip_step_seconds must be a positive number");
        }
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

impl PlaybackConfig {
    pub fn play_confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.play_confirm_timeout_ms)
    }
}

impl ControlsConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            controls: ControlsConfig::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            play_confirm_timeout_ms: default_play_confirm_timeout_ms(),
            unmute_volume_floor: default_unmute_volume_floor(),
            initial_volume: default_initial_volume(),
            skip_step_seconds: default_skip_step_seconds(),
            volume_step: default_volume_step(),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
        }
    }
}

// Default value functions
fn default_play_confirm_timeout_ms() -> u64 { DEFAULT_PLAY_CONFIRM_TIMEOUT_MS }
fn default_unmute_volume_floor() -> f64 { DEFAULT_UNMUTE_VOLUME_FLOOR }
fn default_initial_volume() -> f64 { DEFAULT_INITIAL_VOLUME }
fn default_skip_step_seconds() -> f64 { DEFAULT_SKIP_STEP_SECONDS }
fn default_volume_step() -> f64 { DEFAULT_VOLUME_STEP }
fn default_inactivity_timeout_ms() -> u64 { DEFAULT_INACTIVITY_TIMEOUT_MS }
