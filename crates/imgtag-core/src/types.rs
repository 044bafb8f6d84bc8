//! Core data types for the imgtag tagging pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SelectionError;

/// A label paired with its predicted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTag {
    /// Normalized label name (e.g., "blue sky")
    pub name: String,

    /// Predicted probability from 0.0 to 1.0
    pub score: f32,
}

/// An ordered label→score mapping restricted to one taxonomy category.
///
/// Entries keep the taxonomy's index order (which is the classifier's output
/// order), not score or alphabetical order. Label names are unique; a second
/// insertion of the same name is rejected rather than silently overwritten,
/// since it would mean the taxonomy's index sets overlap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryScores {
    entries: Vec<ScoredTag>,
}

impl CategoryScores {
    /// Append a label with its score.
    pub fn push(&mut self, name: String, score: f32) -> Result<(), SelectionError> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(SelectionError::DuplicateLabel { name });
        }
        self.entries.push(ScoredTag { name, score });
        Ok(())
    }

    /// Build from pre-collected entries, checking name uniqueness in one pass.
    pub(crate) fn from_entries(entries: Vec<ScoredTag>) -> Result<Self, SelectionError> {
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(SelectionError::DuplicateLabel {
                    name: entry.name.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Look up a score by label name.
    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.score)
    }

    /// Iterate label names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ScoredTag> {
        self.entries.iter()
    }

    /// Number of labels in this category result.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the category result is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The complete output for one tagged image.
///
/// All three category results are exposed; the formatted `tag_string` covers
/// the general tags only, matching what lands in the companion text file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedImage {
    /// Absolute path to the source file
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Detected format ("jpeg", "png", "webp", etc.)
    pub format: String,

    /// File size in bytes
    pub file_size: u64,

    /// All rating-category scores, unfiltered
    pub rating: CategoryScores,

    /// Character tags above the character threshold
    pub character: CategoryScores,

    /// General tags above the general threshold
    pub general: CategoryScores,

    /// Sorted, comma-separated general tags (with any prepended tags)
    pub tag_string: String,
}

/// Processing statistics for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessingStats {
    /// Total images tagged successfully
    pub succeeded: usize,

    /// Total images that failed
    pub failed: usize,

    /// Total images skipped (tag file already present)
    pub skipped: usize,

    /// Processing rate in images per second
    pub images_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut scores = CategoryScores::default();
        scores.push("long hair".to_string(), 0.9).unwrap();
        scores.push("1girl".to_string(), 0.8).unwrap();

        let names: Vec<&str> = scores.names().collect();
        assert_eq!(names, vec!["long hair", "1girl"]);
    }

    #[test]
    fn test_push_rejects_duplicate() {
        let mut scores = CategoryScores::default();
        scores.push("smile".to_string(), 0.7).unwrap();
        let err = scores.push("smile".to_string(), 0.6).unwrap_err();
        assert!(err.to_string().contains("smile"));
        assert_eq!(scores.len(), 1);
        assert_eq!(scores.get("smile"), Some(0.7));
    }

    #[test]
    fn test_get_missing_label() {
        let scores = CategoryScores::default();
        assert!(scores.is_empty());
        assert!(scores.get("anything").is_none());
    }

    #[test]
    fn test_category_scores_serialize_as_array() {
        let mut scores = CategoryScores::default();
        scores.push("sky".to_string(), 0.5).unwrap();
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"[{"name":"sky","score":0.5}]"#);

        let parsed: CategoryScores = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get("sky"), Some(0.5));
    }

    #[test]
    fn test_tagged_image_roundtrip() {
        let mut general = CategoryScores::default();
        general.push("outdoors".to_string(), 0.61).unwrap();

        let record = TaggedImage {
            file_path: PathBuf::from("/photos/field.jpg"),
            file_name: "field.jpg".to_string(),
            width: 1280,
            height: 720,
            format: "jpeg".to_string(),
            file_size: 4096,
            rating: CategoryScores::default(),
            character: CategoryScores::default(),
            general,
            tag_string: "outdoors".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let parsed: TaggedImage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.file_name, "field.jpg");
        assert_eq!(parsed.general.get("outdoors"), Some(0.61));
        assert_eq!(parsed.tag_string, "outdoors");
    }
}
