//! Configuration management for Zophar.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Application name used for config directory.
const APP_NAME: &str = "Zophar";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site access settings.
    pub browser: BrowserConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Site access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// URL of the `/music/` namespace, with a trailing slash.
    pub base_url: String,

    /// Minimum delay between the starts of two web requests, in seconds.
    pub delay_between_requests_sec: f64,

    /// Maximum number of pages fetched at the same time.
    pub max_concurrent_requests: usize,

    /// Request timeout in seconds.
    pub timeout_sec: u64,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.zophar.net/music/".to_string(),
            delay_between_requests_sec: 1.0,
            max_concurrent_requests: 4,
            timeout_sec: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.browser.base_url()?;

        if self.browser.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                key: "browser.max_concurrent_requests".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.browser.timeout_sec == 0 {
            return Err(ConfigError::InvalidValue {
                key: "browser.timeout_sec".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        self.browser.delay()?;

        Ok(())
    }
}

impl BrowserConfig {
    /// Minimum time between the starts of two requests.
    pub fn delay(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.delay_between_requests_sec).map_err(|_| {
            ConfigError::InvalidValue {
                key: "browser.delay_between_requests_sec".to_string(),
                message: "must be a finite number of seconds, not negative".to_string(),
            }
        })
    }

    /// Parses `base_url`, which must end with `/` so paths join below it.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "browser.base_url".to_string(),
            message,
        };

        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !url.path().ends_with('/') {
            return Err(invalid("must end with '/'".to_string()));
        }

        Ok(url)
    }
}
