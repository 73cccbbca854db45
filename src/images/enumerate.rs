use std::path::{Path, PathBuf};

use crate::foundation::error::{StillreelError, StillreelResult};

/// File name suffixes accepted as frames. Matching is case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Return `true` when `file_name` ends with one of [`IMAGE_EXTENSIONS`].
pub fn has_image_extension(file_name: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
}

/// List the frame candidates of `dir` in plain lexicographic file-name order.
///
/// Only the file name is inspected; content is validated later when frames are decoded.
/// Names are not sorted numerically, so `a10.png` comes before `a2.png`. An empty result is
/// not an error.
#[tracing::instrument]
pub fn list_images(dir: &Path) -> StillreelResult<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| StillreelError::io_at("read directory", dir, e))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StillreelError::io_at("read directory entry in", dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if has_image_extension(&entry.file_name().to_string_lossy()) {
            images.push(path);
        }
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    tracing::debug!(count = images.len(), "enumerated images");
    Ok(images)
}

#[cfg(test)]
#[path = "../../tests/unit/images/enumerate.rs"]
mod tests;
