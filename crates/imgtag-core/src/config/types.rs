//! Sub-configuration structs with defaults matching the reference tagger.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.imgtag/models"),
        }
    }
}

/// Classifier model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name: the subdirectory of `model_dir` holding `model.onnx`
    /// and `selected_tags.csv`
    pub name: String,

    /// Square input resolution the classifier expects
    pub target_size: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "wd-v1-4-swinv2-tagger-v2".to_string(),
            target_size: 448,
        }
    }
}

/// Threshold and formatting settings for tag selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Fixed threshold for general tags
    pub general_threshold: f32,

    /// Use adaptive (MCut) thresholding for general tags
    pub general_mcut: bool,

    /// Fixed threshold for character tags
    pub character_threshold: f32,

    /// Use adaptive (MCut) thresholding for character tags
    pub character_mcut: bool,

    /// Lower bound on the adaptive character threshold
    pub character_floor: f32,

    /// Tags prepended verbatim to every image's tag line
    pub prepend_tags: Vec<String>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            general_threshold: 0.35,
            general_mcut: false,
            character_threshold: 0.85,
            character_mcut: false,
            character_floor: 0.15,
            prepend_tags: Vec::new(),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
                "gif".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Inference timeout in milliseconds
    pub inference_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            inference_timeout_ms: 30000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Record format for full tagging records ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "jsonl".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
