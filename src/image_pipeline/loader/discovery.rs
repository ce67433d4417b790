use std::path::{Path, PathBuf};

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};

/// File extensions accepted as frames, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];

pub fn is_supported_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Lists the frame files directly inside `dir`, sorted case-insensitively.
///
/// Subdirectories are not descended into. An empty result is not an error
/// here; the assembler reports it once no frames were produced.
pub fn discover_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConversionError::load(dir, e))?;

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConversionError::load(dir, e))?;
        let path = entry.path();
        // Follows symlinks, so linked frame files count as frames
        let metadata = std::fs::metadata(&path).map_err(|e| ConversionError::load(&path, e))?;

        if metadata.is_file() && is_supported_frame(&path) {
            frames.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }

    frames.sort_by_cached_key(|path| crate::image_pipeline::sequence::sort_key(path));
    Ok(frames)
}
