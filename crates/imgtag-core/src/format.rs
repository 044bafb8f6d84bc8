//! Serialization of a selected tag set into the companion-file string.

use crate::types::CategoryScores;

/// Format a category result as a comma-separated tag line.
///
/// Tag names are sorted lexicographically. `prepend` entries go first,
/// verbatim and in the given order; they are neither sorted nor deduplicated
/// against the classifier-derived tags.
pub fn format_tags(scores: &CategoryScores, prepend: &[String]) -> String {
    let mut names: Vec<&str> = scores.names().collect();
    names.sort_unstable();

    let mut parts: Vec<&str> = prepend.iter().map(String::as_str).collect();
    parts.extend(names);
    parts.join(", ")
}
