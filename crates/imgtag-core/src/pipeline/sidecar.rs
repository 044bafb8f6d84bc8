//! Companion tag-file placement and writing.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// The companion tag file for an image: same base name, `.txt` extension.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("txt")
}

/// Write the formatted tag line next to the image.
///
/// The file contains exactly the tag line, UTF-8, no trailing newline.
/// Returns the sidecar path on success.
pub fn write_sidecar(image_path: &Path, tag_line: &str) -> Result<PathBuf, PipelineError> {
    let path = sidecar_path(image_path);
    std::fs::write(&path, tag_line).map_err(|e| PipelineError::SidecarWrite {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}
