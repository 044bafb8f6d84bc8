//! Error types for the imgtag tagging pipeline.
//!
//! Errors are grouped by area. Taxonomy and selection errors are fatal for a
//! batch (the label/index mapping cannot be trusted); decode and inference
//! errors affect a single image and are reported with the file path so the
//! batch driver can log and move on.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imgtag operations.
#[derive(Error, Debug)]
pub enum ImgtagError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Label taxonomy loading errors
    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors loading the label taxonomy that accompanies a classifier.
///
/// All of these are fatal for a batch: without a trustworthy taxonomy the
/// prediction vector cannot be interpreted.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// Failed to read the label file from disk
    #[error("Failed to read label file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The label file has no header row
    #[error("Label file {path} is empty")]
    Empty { path: PathBuf },

    /// A required column is missing from the header
    #[error("Label file {path} is missing the '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// A data row is too short to contain the required columns
    #[error("Label file {path} line {line}: missing field")]
    MissingField { path: PathBuf, line: usize },

    /// The category column holds a non-integer value
    #[error("Label file {path} line {line}: category '{value}' is not an integer")]
    InvalidCategory {
        path: PathBuf,
        line: usize,
        value: String,
    },

    /// Two rows normalize to the same label name
    #[error("Duplicate label '{name}' in taxonomy")]
    DuplicateLabel { name: String },
}

/// Errors from the classifier backend.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Failed to construct a session from the model file
    #[error("Failed to load model {path}: {message}")]
    Session { path: PathBuf, message: String },

    /// Inference call failed
    #[error("Inference failed: {message}")]
    Run { message: String },

    /// Model output could not be interpreted as a score vector
    #[error("Bad model output: {message}")]
    Output { message: String },
}

/// Errors turning a score vector into per-category tag sets.
#[derive(Error, Debug)]
pub enum SelectionError {
    /// Score vector length does not match the taxonomy
    #[error("Score vector has {actual} entries, taxonomy has {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The same label name appeared twice in one category result
    #[error("Duplicate label '{name}' in category result")]
    DuplicateLabel { name: String },
}

/// Per-image pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Classifier backend failure for one image
    #[error("Inference failed for {path}: {source}")]
    Inference {
        path: PathBuf,
        #[source]
        source: InferenceError,
    },

    /// Tag selection failure for one image
    #[error("Selection failed for {path}: {source}")]
    Selection {
        path: PathBuf,
        #[source]
        source: SelectionError,
    },

    /// Failed to write the companion tag file
    #[error("Failed to write tag file {path}: {source}")]
    SidecarWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for imgtag results.
pub type Result<T> = std::result::Result<T, ImgtagError>;
