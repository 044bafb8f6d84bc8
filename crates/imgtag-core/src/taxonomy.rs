//! Label taxonomy loading for the multi-label classifier.
//!
//! The classifier ships with a CSV of label rows whose order matches its
//! output vector. This module loads those rows, normalizes label names, and
//! partitions the indexes into rating / general / character groups.

use std::collections::HashSet;
use std::path::Path;

use crate::error::TaxonomyError;

/// Category code for rating labels.
pub const RATING_CATEGORY: i64 = 9;

/// Category code for general descriptor labels.
pub const GENERAL_CATEGORY: i64 = 0;

/// Category code for character identity labels.
pub const CHARACTER_CATEGORY: i64 = 4;

/// Emoticon-style label names that keep their underscores.
///
/// Compared case-sensitively against the raw name before normalization.
const KAOMOJIS: &[&str] = &[
    "0_0", "(o)_(o)", "+_+", "+_-", "._.", "<o>_<o>", "<|>_<|>", "=_=", ">_<",
    "3_3", "6_9", ">_o", "@_@", "^_^", "o_o", "u_u", "x_x", "|_|", "||_||",
];

/// A single taxonomy entry. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct LabelEntry {
    /// Normalized label name (underscores replaced by spaces, kaomojis kept)
    pub name: String,
    /// Raw category code from the label file
    pub category: i64,
}

/// The ordered label list for one classifier, with per-category index sets.
///
/// The label order is the classifier's output order and is never re-sorted.
/// The three index sets are disjoint; labels with other category codes keep
/// their slot in the ordered list but belong to no group.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    labels: Vec<LabelEntry>,
    rating_indexes: Vec<usize>,
    general_indexes: Vec<usize>,
    character_indexes: Vec<usize>,
}

impl Taxonomy {
    /// Load a taxonomy from the classifier's label CSV.
    ///
    /// The first line is a header; the `name` and `category` column positions
    /// are discovered from it and other columns are ignored.
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let content = std::fs::read_to_string(path).map_err(|e| TaxonomyError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut lines = content.lines();
        let header = lines.next().ok_or_else(|| TaxonomyError::Empty {
            path: path.to_path_buf(),
        })?;

        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let name_col = columns.iter().position(|c| *c == "name").ok_or_else(|| {
            TaxonomyError::MissingColumn {
                path: path.to_path_buf(),
                column: "name",
            }
        })?;
        let category_col =
            columns
                .iter()
                .position(|c| *c == "category")
                .ok_or_else(|| TaxonomyError::MissingColumn {
                    path: path.to_path_buf(),
                    column: "category",
                })?;

        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // Header is line 1, so data line numbers start at 2.
            let lineno = i + 2;
            let fields: Vec<&str> = line.split(',').collect();

            let name = fields
                .get(name_col)
                .ok_or_else(|| TaxonomyError::MissingField {
                    path: path.to_path_buf(),
                    line: lineno,
                })?;
            let raw_category =
                fields
                    .get(category_col)
                    .ok_or_else(|| TaxonomyError::MissingField {
                        path: path.to_path_buf(),
                        line: lineno,
                    })?;
            let category: i64 =
                raw_category
                    .trim()
                    .parse()
                    .map_err(|_| TaxonomyError::InvalidCategory {
                        path: path.to_path_buf(),
                        line: lineno,
                        value: raw_category.to_string(),
                    })?;

            rows.push((name.to_string(), category));
        }

        Self::from_rows(rows)
    }

    /// Build a taxonomy from `(name, category)` rows in classifier order.
    pub fn from_rows(rows: Vec<(String, i64)>) -> Result<Self, TaxonomyError> {
        let mut labels = Vec::with_capacity(rows.len());
        let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
        let mut rating_indexes = Vec::new();
        let mut general_indexes = Vec::new();
        let mut character_indexes = Vec::new();

        for (i, (raw_name, category)) in rows.into_iter().enumerate() {
            let name = normalize_name(&raw_name);
            if !seen.insert(name.clone()) {
                return Err(TaxonomyError::DuplicateLabel { name });
            }

            match category {
                RATING_CATEGORY => rating_indexes.push(i),
                GENERAL_CATEGORY => general_indexes.push(i),
                CHARACTER_CATEGORY => character_indexes.push(i),
                _ => {}
            }

            labels.push(LabelEntry { name, category });
        }

        tracing::info!(
            "Loaded taxonomy: {} labels ({} rating, {} general, {} character)",
            labels.len(),
            rating_indexes.len(),
            general_indexes.len(),
            character_indexes.len(),
        );

        Ok(Self {
            labels,
            rating_indexes,
            general_indexes,
            character_indexes,
        })
    }

    /// All labels in classifier output order.
    pub fn labels(&self) -> &[LabelEntry] {
        &self.labels
    }

    /// Normalized label name at the given classifier output index.
    pub fn label_name(&self, index: usize) -> &str {
        &self.labels[index].name
    }

    /// Number of labels (equals the classifier's output vector length).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the taxonomy has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Indexes of rating labels (category 9).
    pub fn rating_indexes(&self) -> &[usize] {
        &self.rating_indexes
    }

    /// Indexes of general labels (category 0).
    pub fn general_indexes(&self) -> &[usize] {
        &self.general_indexes
    }

    /// Indexes of character labels (category 4).
    pub fn character_indexes(&self) -> &[usize] {
        &self.character_indexes
    }
}

/// Replace underscores with spaces, leaving kaomoji names untouched.
fn normalize_name(raw: &str) -> String {
    if KAOMOJIS.contains(&raw) {
        raw.to_string()
    } else {
        raw.replace('_', " ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    fn write_csv(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selected_tags.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{}", content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_underscores_become_spaces() {
        let tax = Taxonomy::from_rows(vec![("blue_sky".to_string(), 0)]).unwrap();
        assert_eq!(tax.label_name(0), "blue sky");
    }

    #[test]
    fn test_kaomoji_names_are_preserved() {
        let tax = Taxonomy::from_rows(vec![
            ("0_0".to_string(), 0),
            (">_<".to_string(), 0),
            ("^_^".to_string(), 0),
        ])
        .unwrap();
        assert_eq!(tax.label_name(0), "0_0");
        assert_eq!(tax.label_name(1), ">_<");
        assert_eq!(tax.label_name(2), "^_^");
    }

    #[test]
    fn test_partition_by_category() {
        let tax = Taxonomy::from_rows(vec![
            ("general".to_string(), 9),
            ("sensitive".to_string(), 9),
            ("1girl".to_string(), 0),
            ("hatsune_miku".to_string(), 4),
            ("long_hair".to_string(), 0),
        ])
        .unwrap();

        assert_eq!(tax.rating_indexes(), &[0, 1]);
        assert_eq!(tax.general_indexes(), &[2, 4]);
        assert_eq!(tax.character_indexes(), &[3]);
    }

    #[test]
    fn test_unknown_category_keeps_index_alignment() {
        // Category 2 (e.g. copyright) belongs to no group but keeps its slot.
        let tax = Taxonomy::from_rows(vec![
            ("1girl".to_string(), 0),
            ("vocaloid".to_string(), 2),
            ("hatsune_miku".to_string(), 4),
        ])
        .unwrap();

        assert_eq!(tax.len(), 3);
        assert_eq!(tax.general_indexes(), &[0]);
        assert_eq!(tax.character_indexes(), &[2]);
        assert_eq!(tax.label_name(1), "vocaloid");
    }

    #[test]
    fn test_category_index_sets_are_disjoint() {
        let tax = Taxonomy::from_rows(vec![
            ("general".to_string(), 9),
            ("1girl".to_string(), 0),
            ("hatsune_miku".to_string(), 4),
            ("vocaloid".to_string(), 2),
        ])
        .unwrap();

        let rating: HashSet<usize> = tax.rating_indexes().iter().copied().collect();
        let general: HashSet<usize> = tax.general_indexes().iter().copied().collect();
        let character: HashSet<usize> = tax.character_indexes().iter().copied().collect();

        assert!(rating.is_disjoint(&general));
        assert!(rating.is_disjoint(&character));
        assert!(general.is_disjoint(&character));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let err = Taxonomy::from_rows(vec![
            ("long_hair".to_string(), 0),
            ("long hair".to_string(), 0),
        ])
        .unwrap_err();
        assert!(matches!(err, TaxonomyError::DuplicateLabel { .. }));
    }

    #[test]
    fn test_load_csv_with_extra_columns() {
        let (_dir, path) = write_csv(
            "tag_id,name,category,count\n\
             9999,general,9,100\n\
             1,blue_sky,0,5000\n\
             2,0_0,0,300\n\
             3,hatsune_miku,4,9000\n",
        );

        let tax = Taxonomy::load(&path).unwrap();
        assert_eq!(tax.len(), 4);
        assert_eq!(tax.label_name(1), "blue sky");
        assert_eq!(tax.label_name(2), "0_0");
        assert_eq!(tax.rating_indexes(), &[0]);
        assert_eq!(tax.character_indexes(), &[3]);
    }

    #[test]
    fn test_load_missing_category_column() {
        let (_dir, path) = write_csv("tag_id,name,count\n1,blue_sky,5000\n");
        let err = Taxonomy::load(&path).unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::MissingColumn { column: "category", .. }
        ));
    }

    #[test]
    fn test_load_non_integer_category() {
        let (_dir, path) = write_csv("name,category\nblue_sky,zero\n");
        let err = Taxonomy::load(&path).unwrap_err();
        match err {
            TaxonomyError::InvalidCategory { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "zero");
            }
            other => panic!("Expected InvalidCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_load_short_row() {
        let (_dir, path) = write_csv("tag_id,name,category\n1,blue_sky\n");
        let err = Taxonomy::load(&path).unwrap_err();
        assert!(matches!(err, TaxonomyError::MissingField { line: 2, .. }));
    }

    #[test]
    fn test_load_empty_file() {
        let (_dir, path) = write_csv("");
        let err = Taxonomy::load(&path).unwrap_err();
        assert!(matches!(err, TaxonomyError::Empty { .. }));
    }
}
