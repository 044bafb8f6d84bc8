//! Classifier inference backends.
//!
//! The pipeline only needs one capability from a backend: accept a
//! fixed-shape image tensor and return one probability per taxonomy entry,
//! in taxonomy order. Anything satisfying [`InferenceBackend`] is
//! substitutable; the shipped implementation runs ONNX models via ort.

mod onnx;

pub use onnx::OnnxClassifier;

use ndarray::Array4;

use crate::error::InferenceError;

/// A multi-label classifier backend.
///
/// Implementations must be safe to share across threads; `run` takes `&self`
/// so a backend with non-reentrant internals serializes calls itself.
pub trait InferenceBackend: Send + Sync {
    /// Run inference on a preprocessed NHWC tensor.
    ///
    /// Returns one raw probability per taxonomy label, index-aligned with
    /// the taxonomy's ordered label list. No retries; errors propagate.
    fn run(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}
