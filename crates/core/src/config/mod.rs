//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WEBSTASH_*)
//! 2. TOML config file (if WEBSTASH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Behavior for requests whose storage path does not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Cache misses fall through to the network and are captured for reuse.
    #[default]
    Proxy,

    /// Cache misses are aborted; nothing leaves the machine.
    Offline,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WEBSTASH_*)
/// 2. TOML config file (if WEBSTASH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// What to do with uncached requests.
    ///
    /// Set via WEBSTASH_MODE environment variable (`proxy` or `offline`).
    #[serde(default)]
    pub mode: CaptureMode,

    /// Root directory for stored responses.
    ///
    /// Set via WEBSTASH_FILES_DIR environment variable.
    #[serde(default = "default_files_dir")]
    pub files_dir: PathBuf,

    /// Navigation timeout in milliseconds.
    ///
    /// Set via WEBSTASH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long a page is left to settle after load before the session
    /// moves on, in milliseconds.
    ///
    /// Set via WEBSTASH_SETTLE_MS environment variable.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Whether the browser runs headless.
    ///
    /// Set via WEBSTASH_HEADLESS environment variable.
    #[serde(default = "default_true")]
    pub headless: bool,
}

fn default_files_dir() -> PathBuf {
    PathBuf::from("./files")
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_settle_ms() -> u64 {
    2_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Proxy,
            files_dir: default_files_dir(),
            timeout_ms: default_timeout_ms(),
            settle_ms: default_settle_ms(),
            headless: true,
        }
    }
}

impl AppConfig {
    /// Navigation timeout as Duration for use with tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Settle delay as Duration for use with tokio.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WEBSTASH_`
    /// 2. TOML file from `WEBSTASH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WEBSTASH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WEBSTASH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.mode, CaptureMode::Proxy);
        assert_eq!(config.files_dir, PathBuf::from("./files"));
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.settle_ms, 2_000);
        assert!(config.headless);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(30_000));
        assert_eq!(config.settle(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(("mode", "offline"))
            .extract()
            .unwrap();
        assert_eq!(config.mode, CaptureMode::Offline);
    }

    #[test]
    fn test_mode_rejects_unknown_value() {
        let result: Result<AppConfig, _> = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(("mode", "record"))
            .extract();
        assert!(result.is_err());
    }
}
