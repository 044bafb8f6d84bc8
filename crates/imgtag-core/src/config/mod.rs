//! Configuration management for imgtag.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults; a missing file is not an error.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The classifier ONNX filename inside a model directory.
pub const MODEL_FILENAME: &str = "model.onnx";

/// The label taxonomy filename inside a model directory.
pub const TAGS_FILENAME: &str = "selected_tags.csv";

/// Root configuration structure for imgtag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Classifier model settings
    pub model: ModelConfig,

    /// Threshold and formatting settings
    pub tagging: TaggingConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories (e.g. `~/.config/imgtag` on
    /// Linux), falling back to `~/.imgtag/config.toml` if directory
    /// detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "imgtag", "imgtag")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".imgtag").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Path to the configured classifier's ONNX file.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join(&self.model.name).join(MODEL_FILENAME)
    }

    /// Path to the configured classifier's label taxonomy CSV.
    pub fn tags_path(&self) -> PathBuf {
        self.model_dir().join(&self.model.name).join(TAGS_FILENAME)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
