//! imgtag Core - Multi-label image tagging library.
//!
//! imgtag runs images through a pretrained multi-label classifier (ONNX) and
//! turns the raw per-tag probabilities into a clean, reproducible set of
//! textual tags suitable for storage alongside each image.
//!
//! # Architecture
//!
//! ```text
//! Image → Decode → Letterbox + BGR tensor → Classifier → Select (MCut/fixed) → "tag, tag"
//! ```
//!
//! The classifier is a black box behind [`InferenceBackend`]; the taxonomy
//! that interprets its output vector is a caller-owned immutable handle,
//! loaded once per model and shared across the batch.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use imgtag_core::{Config, ImageTagger, OnnxClassifier, Taxonomy};
//!
//! let config = Config::load()?;
//! let taxonomy = Arc::new(Taxonomy::load(&config.tags_path())?);
//! let backend = Arc::new(OnnxClassifier::load(&config.model_path())?);
//! let tagger = ImageTagger::new(&config, backend, taxonomy);
//!
//! let result = tagger.tag_image("./image.jpg".as_ref()).await?;
//! println!("{}", result.tag_string);
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod format;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod selector;
pub mod taxonomy;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, ImgtagError, InferenceError, PipelineError, Result, SelectionError,
    TaxonomyError,
};
pub use format::format_tags;
pub use inference::{InferenceBackend, OnnxClassifier};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{sidecar_path, write_sidecar, DiscoveredFile, ImageTagger};
pub use selector::{mcut_threshold, select, TagSelection, ThresholdPolicy};
pub use taxonomy::{LabelEntry, Taxonomy};
pub use types::{CategoryScores, ProcessingStats, ScoredTag, TaggedImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
