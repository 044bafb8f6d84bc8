//! Threshold resolution and per-category tag selection.
//!
//! Projects a raw score vector through the taxonomy's category index sets and
//! keeps the labels whose score clears a threshold. The threshold is either a
//! fixed value or computed per image with maximum-cut thresholding.

use crate::error::SelectionError;
use crate::taxonomy::Taxonomy;
use crate::types::{CategoryScores, ScoredTag};

/// Maximum-cut threshold over a score distribution.
///
/// Sorts the scores descending, finds the largest gap between adjacent
/// scores (first occurrence wins ties), and returns the midpoint of that gap.
/// The result separates the confidently-predicted labels above the gap from
/// the rest without a fixed magic number.
///
/// Degenerate for fewer than two scores; callers must guard.
pub fn mcut_threshold(scores: &[f32]) -> f32 {
    debug_assert!(scores.len() >= 2, "mcut needs at least two scores");

    let mut sorted = scores.to_vec();
    sorted.sort_unstable_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let mut gap_index = 0;
    let mut largest_gap = f32::NEG_INFINITY;
    for i in 0..sorted.len() - 1 {
        let gap = sorted[i] - sorted[i + 1];
        if gap > largest_gap {
            largest_gap = gap;
            gap_index = i;
        }
    }

    (sorted[gap_index] + sorted[gap_index + 1]) / 2.0
}

/// How the selection threshold for one category is decided.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    /// Fixed threshold, also the fallback when adaptive selection is not
    /// possible (fewer than two scores in the category).
    pub threshold: f32,

    /// Compute the threshold per image with [`mcut_threshold`].
    pub adaptive: bool,

    /// Lower bound applied to the adaptive threshold. Zero for general tags;
    /// the character category uses a floor to avoid drowning in false
    /// positives when the score distribution is flat.
    pub floor: f32,
}

impl ThresholdPolicy {
    /// A fixed-threshold policy.
    pub fn fixed(threshold: f32) -> Self {
        Self {
            threshold,
            adaptive: false,
            floor: 0.0,
        }
    }

    /// An adaptive policy with the given fallback threshold and floor.
    pub fn adaptive(fallback: f32, floor: f32) -> Self {
        Self {
            threshold: fallback,
            adaptive: true,
            floor,
        }
    }

    /// Resolve the effective threshold for one category's score list.
    fn resolve(&self, scores: &[f32]) -> f32 {
        if self.adaptive && scores.len() >= 2 {
            mcut_threshold(scores).max(self.floor)
        } else {
            self.threshold
        }
    }
}

/// The three category results for one image.
#[derive(Debug, Clone)]
pub struct TagSelection {
    /// All rating scores, unfiltered
    pub rating: CategoryScores,

    /// Character tags above the character threshold
    pub character: CategoryScores,

    /// General tags above the general threshold
    pub general: CategoryScores,

    /// Threshold actually applied to the general category
    pub general_threshold: f32,

    /// Threshold actually applied to the character category
    pub character_threshold: f32,
}

/// Select per-category tags from a raw classifier score vector.
///
/// `scores` must be index-aligned with `taxonomy`. Rating scores are kept
/// unfiltered; general and character tags are kept when their score is
/// strictly greater than the resolved threshold.
pub fn select(
    scores: &[f32],
    taxonomy: &Taxonomy,
    general: ThresholdPolicy,
    character: ThresholdPolicy,
) -> Result<TagSelection, SelectionError> {
    if scores.len() != taxonomy.len() {
        return Err(SelectionError::LengthMismatch {
            expected: taxonomy.len(),
            actual: scores.len(),
        });
    }

    let rating = project(scores, taxonomy, taxonomy.rating_indexes(), None)?;

    let general_scores: Vec<f32> = taxonomy
        .general_indexes()
        .iter()
        .map(|&i| scores[i])
        .collect();
    let general_threshold = general.resolve(&general_scores);
    let general = project(
        scores,
        taxonomy,
        taxonomy.general_indexes(),
        Some(general_threshold),
    )?;

    let character_scores: Vec<f32> = taxonomy
        .character_indexes()
        .iter()
        .map(|&i| scores[i])
        .collect();
    let character_threshold = character.resolve(&character_scores);
    let character = project(
        scores,
        taxonomy,
        taxonomy.character_indexes(),
        Some(character_threshold),
    )?;

    Ok(TagSelection {
        rating,
        character,
        general,
        general_threshold,
        character_threshold,
    })
}

/// Collect `(label, score)` pairs for one index set, optionally filtered.
///
/// Strict inequality: a score exactly equal to the threshold is excluded.
fn project(
    scores: &[f32],
    taxonomy: &Taxonomy,
    indexes: &[usize],
    threshold: Option<f32>,
) -> Result<CategoryScores, SelectionError> {
    let mut entries = Vec::new();
    for &i in indexes {
        let score = scores[i];
        if threshold.is_none_or(|t| score > t) {
            entries.push(ScoredTag {
                name: taxonomy.label_name(i).to_string(),
                score,
            });
        }
    }
    CategoryScores::from_entries(entries)
}
