//! Configuration file support for maskpair.
//!
//! Settings are read from a versioned JSON file; service URLs can be
//! overridden from the environment (`BACKEND_URL`, `SEGMENTATION_URL`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compositor::OverlayStyle;
use crate::constants::{
    DEFAULT_MAX_IMAGE_EDGE, DEFAULT_MODEL_INPUT_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS,
    SUPPORTED_MODEL_INPUT_SIZES,
};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding the submission backend URL.
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Environment variable overriding the segmentation service URL.
pub const SEGMENTATION_URL_ENV: &str = "SEGMENTATION_URL";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Where finished annotations are POSTed
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Point-prompt segmentation endpoint
    #[serde(default)]
    pub segmentation_url: Option<String>,

    /// Side of the square model-input space (256 or 512)
    #[serde(default = "default_model_input_size")]
    pub model_input_size: u32,

    /// Longest edge of display images
    #[serde(default = "default_max_image_edge")]
    pub max_image_edge: u32,

    /// Timeout applied to every outgoing request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Mask overlay appearance
    #[serde(default)]
    pub overlay: OverlayStyle,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_model_input_size() -> u32 {
    DEFAULT_MODEL_INPUT_SIZE
}

fn default_max_image_edge() -> u32 {
    DEFAULT_MAX_IMAGE_EDGE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend_url: None,
            segmentation_url: None,
            model_input_size: default_model_input_size(),
            max_image_edge: default_max_image_edge(),
            request_timeout_secs: default_request_timeout_secs(),
            overlay: OverlayStyle::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check version compatibility and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: self.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if !SUPPORTED_MODEL_INPUT_SIZES.contains(&self.model_input_size) {
            return Err(ConfigError::Invalid(format!(
                "model_input_size must be one of {:?}, got {}",
                SUPPORTED_MODEL_INPUT_SIZES, self.model_input_size
            )));
        }
        if self.max_image_edge == 0 {
            return Err(ConfigError::Invalid(
                "max_image_edge must be positive".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace service URLs with values from the environment, when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
            log::debug!("Backend URL taken from {}", BACKEND_URL_ENV);
            self.backend_url = Some(url);
        }
        if let Some(url) = lookup(SEGMENTATION_URL_ENV).filter(|u| !u.trim().is_empty()) {
            log::debug!("Segmentation URL taken from {}", SEGMENTATION_URL_ENV);
            self.segmentation_url = Some(url);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "maskpair-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("maskpair").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("maskpair")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from `path` when given, else from the default path if a file
    /// exists there, else defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load(&default)?,
                _ => {
                    log::debug!("No config file, using defaults");
                    Self::new()
                }
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.model_input_size, 512);
        assert_eq!(config.max_image_edge, 512);
        assert_eq!(config.overlay.color, [255, 0, 0]);
        assert_eq!(config.overlay.opacity, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_json_fills_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(config, AppConfig::new());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AppConfig::new();
        config.backend_url = Some("https://backend.example/submit".to_string());
        config.model_input_size = 256;
        config.log_level = LogLevel::Debug;

        let json = config.to_json().unwrap();
        assert!(json.contains("\"log_level\": \"debug\""));
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = AppConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                supported_version: 1
            }
        ));
    }

    #[test]
    fn test_rejects_unsupported_model_size() {
        let err = AppConfig::from_json(r#"{"version": 1, "model_input_size": 1024}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::new();
        config.backend_url = Some("from-file".to_string());
        config.apply_overrides(|key| match key {
            BACKEND_URL_ENV => Some("from-env".to_string()),
            SEGMENTATION_URL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.backend_url.as_deref(), Some("from-env"));
        assert_eq!(config.segmentation_url, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::new();
        config.request_timeout_secs = 5;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.request_timeout(), Duration::from_secs(5));
    }
}
