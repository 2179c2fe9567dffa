//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`<config_dir>/config.toml`, or `--config PATH`)
//! 3. `CODEALARM_*` environment variables, `__` between nested keys
//!    (e.g. `CODEALARM_SERVICE__BASE_URL`)
//! 4. CLI flags, applied by the caller after loading
//!
//! # Example
//!
//! ```toml
//! theme = "dark"
//!
//! [service]
//! base_url = "http://localhost:3000"
//! timeout_secs = 10
//!
//! [audio]
//! sound_file = "/usr/share/sounds/alarm.wav"
//! player = "paplay"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::challenge::GateTiming;
use crate::cli::ThemeArg;
use crate::service::DEFAULT_BASE_URL;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CODEALARM_";

/// A setting with an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for '{key}': {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

/// Where the progress service lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Timer periods and acknowledgment windows, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_ms: u64,
    pub flicker_ms: u64,
    pub success_display_ms: u64,
    pub rejection_display_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            flicker_ms: 500,
            success_display_ms: 1_500,
            rejection_display_ms: 3_000,
        }
    }
}

/// Alarm sound settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Terminal bell period when no sound file is configured.
    pub bell_interval_ms: u64,
    /// Sound file looped through `player`.
    pub sound_file: Option<PathBuf>,
    pub player: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell_interval_ms: 1_000,
            sound_file: None,
            player: "paplay".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preferred TUI theme.
    pub theme: ThemeArg,
    /// Where the identity store and log file live. Defaults to the
    /// platform data directory.
    pub storage_dir: Option<PathBuf>,
    /// Label pre-filled in the add-alarm form.
    pub default_label: String,
    pub service: ServiceConfig,
    pub timing: TimingConfig,
    pub audio: AudioConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemeArg::Auto,
            storage_dir: None,
            default_label: "Morning Challenge".to_string(),
            service: ServiceConfig::default(),
            timing: TimingConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Config {
    /// Load from `explicit_path`, or the default location when `None`.
    pub fn load(explicit_path: Option<&Path>) -> Self {
        match explicit_path {
            Some(path) => Self::load_from_path(path),
            None => match Self::config_path() {
                Ok(path) => Self::load_from_path(path),
                Err(e) => {
                    log::debug!("No config directory ({}), using defaults", e);
                    Self::load_from_figment(Self::figment(None))
                }
            },
        }
    }

    /// Load with the TOML file at `path` layered over the defaults.
    ///
    /// A missing file is fine. An unreadable or invalid one is logged and
    /// the defaults are used instead.
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        Self::load_from_figment(Self::figment(Some(path.as_ref())))
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn load_from_figment(figment: Figment) -> Self {
        let config: Config = match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {}", e);
                return Self::default();
            }
        };
        if let Err(e) = config.validate() {
            log::warn!("Ignoring config: {}", e);
            return Self::default();
        }
        config
    }

    /// Reject values the app cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("service.timeout_secs", self.service.timeout_secs),
            ("timing.tick_ms", self.timing.tick_ms),
            ("timing.flicker_ms", self.timing.flicker_ms),
            ("audio.bell_interval_ms", self.audio.bell_interval_ms),
        ];
        for (key, value) in nonzero {
            if value == 0 {
                return Err(ConfigError {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.service.base_url.trim().is_empty() {
            return Err(ConfigError {
                key: "service.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.audio.sound_file.is_some() && self.audio.player.trim().is_empty() {
            return Err(ConfigError {
                key: "audio.player",
                reason: "required when audio.sound_file is set".to_string(),
            });
        }
        Ok(())
    }

    /// Save as TOML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Default platform-specific configuration path.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "codealarm", "codealarm")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Directory holding the identity store and log file.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::storage::data_dir().map_err(Into::into),
        }
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.timing.tick_ms)
    }

    #[must_use]
    pub fn flicker_period(&self) -> Duration {
        Duration::from_millis(self.timing.flicker_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }

    #[must_use]
    pub fn gate_timing(&self) -> GateTiming {
        GateTiming {
            success_display: Duration::from_millis(self.timing.success_display_ms),
            rejection_display: Duration::from_millis(self.timing.rejection_display_ms),
        }
    }
}
