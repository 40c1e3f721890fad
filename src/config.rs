//! Host configuration.
//!
//! Defaults for the card field host live in
//! `~/.config/payfield/config.toml` (or the platform equivalent via
//! `dirs::config_dir()`). A missing file means defaults; a present file must
//! parse and validate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sdk::FocusTarget;

/// Errors that can occur when loading host configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Defaults applied to the card field host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// DOM id of the mount container used when props carry none.
    pub default_mount_id: String,
    /// Sub-field focused after attach; `None` disables forced focus.
    pub default_focus: Option<FocusTarget>,
    /// Whether the field renders input labels by default.
    pub include_input_labels: bool,
    /// Label of the default submit button.
    pub button_label: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_mount_id: "payfield-card".to_string(),
            default_focus: Some(FocusTarget::PRIMARY),
            include_input_labels: false,
            button_label: "Pay".to_string(),
        }
    }
}

impl HostConfig {
    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("payfield").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// - If the file doesn't exist, returns `HostConfig::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: HostConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// The mount id must be usable as both a DOM id and a CSS selector
    /// fragment: non-empty, no whitespace, no `#`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_mount_id.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "default_mount_id must not be empty".to_string(),
            });
        }

        if self
            .default_mount_id
            .chars()
            .any(|c| c.is_whitespace() || c == '#')
        {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "default_mount_id '{}' must not contain whitespace or '#'",
                    self.default_mount_id
                ),
            });
        }

        if self.button_label.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "button_label must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
