//! ONNX Runtime session wrapper for the pretrained tagger models.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::InferenceError;

use super::InferenceBackend;

/// Wraps an ONNX Runtime session for a multi-label image classifier.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`; callers can
/// therefore share one classifier across threads and calls serialize.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl OnnxClassifier {
    /// Load a classifier from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        let session = Session::builder()
            .map_err(|e| InferenceError::Session {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::Session {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input_1".to_string());

        tracing::debug!(
            "Loaded classifier from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl InferenceBackend for OnnxClassifier {
    fn run(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        // Convert ndarray to (shape, flat_data) for ort.
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = input.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| InferenceError::Run {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| InferenceError::Run {
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| InferenceError::Run {
            message: format!("ONNX inference failed: {e}"),
        })?;

        // The tagger models emit a single [1, N] probability tensor.
        let (output_name, output_value) =
            outputs.iter().next().ok_or_else(|| InferenceError::Output {
                message: "Model produced no outputs".to_string(),
            })?;

        let (shape, data) =
            output_value
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Output {
                    message: format!("Failed to extract {output_name} tensor: {e}"),
                })?;

        let scores = match shape.len() {
            1 => data.to_vec(),
            2 => {
                let n = shape[1] as usize;
                data[..n].to_vec()
            }
            _ => {
                return Err(InferenceError::Output {
                    message: format!("Unexpected output shape: {:?}", shape),
                });
            }
        };

        Ok(scores)
    }
}
