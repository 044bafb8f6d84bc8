//! Per-image orchestration: decode → preprocess → infer → select → format.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::Config;
use crate::error::{InferenceError, PipelineError};
use crate::format::format_tags;
use crate::inference::InferenceBackend;
use crate::preprocess::preprocess;
use crate::selector::{select, ThresholdPolicy};
use crate::taxonomy::Taxonomy;
use crate::types::TaggedImage;

use super::decode::{format_to_string, ImageDecoder};
use super::discovery::{DiscoveredFile, ImageDiscovery};

/// Tags images against one classifier + taxonomy pair.
///
/// The taxonomy and backend are caller-owned handles, loaded once and shared
/// immutably across the batch.
pub struct ImageTagger {
    decoder: ImageDecoder,
    discovery: ImageDiscovery,
    backend: Arc<dyn InferenceBackend>,
    taxonomy: Arc<Taxonomy>,
    target_size: u32,
    general: ThresholdPolicy,
    character: ThresholdPolicy,
    prepend_tags: Vec<String>,
    inference_timeout_ms: u64,
}

impl ImageTagger {
    /// Build a tagger from config plus loaded backend and taxonomy handles.
    pub fn new(
        config: &Config,
        backend: Arc<dyn InferenceBackend>,
        taxonomy: Arc<Taxonomy>,
    ) -> Self {
        let tagging = &config.tagging;
        let general = if tagging.general_mcut {
            ThresholdPolicy::adaptive(tagging.general_threshold, 0.0)
        } else {
            ThresholdPolicy::fixed(tagging.general_threshold)
        };
        let character = if tagging.character_mcut {
            ThresholdPolicy::adaptive(tagging.character_threshold, tagging.character_floor)
        } else {
            ThresholdPolicy::fixed(tagging.character_threshold)
        };

        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            discovery: ImageDiscovery::new(config.processing.clone()),
            backend,
            taxonomy,
            target_size: config.model.target_size,
            general,
            character,
            prepend_tags: tagging.prepend_tags.clone(),
            inference_timeout_ms: config.limits.inference_timeout_ms,
        }
    }

    /// Discover taggable images at a path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// The shared taxonomy handle.
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Tag a single image.
    ///
    /// Produces all three category results plus the formatted general-tag
    /// line; writing the sidecar is left to the caller so per-image errors
    /// here never leave a stale tag file behind.
    pub async fn tag_image(&self, path: &Path) -> Result<TaggedImage, PipelineError> {
        let decoded = self.decoder.decode(path).await?;
        let (width, height) = (decoded.width, decoded.height);
        let format = format_to_string(decoded.format);
        let file_size = decoded.file_size;

        // Preprocess and inference are CPU-bound; run both off the async
        // thread under the inference timeout.
        let backend = Arc::clone(&self.backend);
        let target_size = self.target_size;
        let image = decoded.image;
        let infer_task = tokio::task::spawn_blocking(move || {
            let tensor = preprocess(&image, target_size);
            backend.run(&tensor)
        });

        let timeout_duration = Duration::from_millis(self.inference_timeout_ms);
        let scores = match timeout(timeout_duration, infer_task).await {
            Ok(Ok(Ok(scores))) => scores,
            Ok(Ok(Err(e))) => {
                return Err(PipelineError::Inference {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            Ok(Err(e)) => {
                return Err(PipelineError::Inference {
                    path: path.to_path_buf(),
                    source: InferenceError::Run {
                        message: format!("Task join error: {e}"),
                    },
                })
            }
            Err(_) => {
                return Err(PipelineError::Timeout {
                    path: path.to_path_buf(),
                    stage: "inference".to_string(),
                    timeout_ms: self.inference_timeout_ms,
                })
            }
        };

        let selection = select(&scores, &self.taxonomy, self.general, self.character)
            .map_err(|e| PipelineError::Selection {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::debug!(
            "Tagged {:?}: {} general (threshold {:.3}), {} character (threshold {:.3})",
            path,
            selection.general.len(),
            selection.general_threshold,
            selection.character.len(),
            selection.character_threshold,
        );

        let tag_string = format_tags(&selection.general, &self.prepend_tags);

        Ok(TaggedImage {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            width,
            height,
            format,
            file_size,
            rating: selection.rating,
            character: selection.character,
            general: selection.general,
            tag_string,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use ndarray::Array4;

    /// Backend returning a canned score vector; records nothing.
    struct StubBackend {
        scores: Vec<f32>,
    }

    impl InferenceBackend for StubBackend {
        fn run(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            assert_eq!(input.shape()[0], 1);
            assert_eq!(input.shape()[3], 3);
            Ok(self.scores.clone())
        }
    }

    /// Backend that always fails, for skip-and-continue coverage.
    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn run(&self, _input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            Err(InferenceError::Run {
                message: "backend unavailable".to_string(),
            })
        }
    }

    fn sample_taxonomy() -> Arc<Taxonomy> {
        Arc::new(
            Taxonomy::from_rows(vec![
                ("general".to_string(), 9),
                ("1girl".to_string(), 0),
                ("blue_sky".to_string(), 0),
                ("cloud".to_string(), 0),
                ("hatsune_miku".to_string(), 4),
            ])
            .unwrap(),
        )
    }

    fn write_test_png(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("scene.png");
        RgbImage::new(32, 24).save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_tag_image_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(&dir);

        let backend = Arc::new(StubBackend {
            scores: vec![0.97, 0.9, 0.6, 0.2, 0.05],
        });
        let tagger = ImageTagger::new(&Config::default(), backend, sample_taxonomy());

        let result = tagger.tag_image(&path).await.unwrap();
        assert_eq!(result.file_name, "scene.png");
        assert_eq!((result.width, result.height), (32, 24));
        assert_eq!(result.format, "png");

        // Default thresholds: general 0.35, character 0.85.
        assert_eq!(result.rating.get("general"), Some(0.97));
        assert_eq!(result.general.get("1girl"), Some(0.9));
        assert_eq!(result.general.get("blue sky"), Some(0.6));
        assert!(result.general.get("cloud").is_none());
        assert!(result.character.is_empty());
        assert_eq!(result.tag_string, "1girl, blue sky");
    }

    #[tokio::test]
    async fn test_tag_image_with_prepend() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(&dir);

        let mut config = Config::default();
        config.tagging.prepend_tags = vec!["photo".to_string()];
        let backend = Arc::new(StubBackend {
            scores: vec![0.9, 0.8, 0.1, 0.1, 0.0],
        });
        let tagger = ImageTagger::new(&config, backend, sample_taxonomy());

        let result = tagger.tag_image(&path).await.unwrap();
        assert_eq!(result.tag_string, "photo, 1girl");
    }

    #[tokio::test]
    async fn test_backend_error_maps_to_inference_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(&dir);

        let tagger = ImageTagger::new(
            &Config::default(),
            Arc::new(FailingBackend),
            sample_taxonomy(),
        );

        let err = tagger.tag_image(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
    }

    #[tokio::test]
    async fn test_score_length_mismatch_is_selection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(&dir);

        let backend = Arc::new(StubBackend {
            scores: vec![0.1, 0.2],
        });
        let tagger = ImageTagger::new(&Config::default(), backend, sample_taxonomy());

        let err = tagger.tag_image(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Selection { .. }));
    }

    #[tokio::test]
    async fn test_adaptive_config_flows_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(&dir);

        let mut config = Config::default();
        config.tagging.general_mcut = true;
        // General scores [0.9, 0.85, 0.1]: gap after 0.85, threshold 0.475.
        let backend = Arc::new(StubBackend {
            scores: vec![0.5, 0.9, 0.85, 0.1, 0.0],
        });
        let tagger = ImageTagger::new(&config, backend, sample_taxonomy());

        let result = tagger.tag_image(&path).await.unwrap();
        assert_eq!(result.general.len(), 2);
        assert_eq!(result.tag_string, "1girl, blue sky");
    }
}
