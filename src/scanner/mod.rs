use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::tagging;

/// Lists the audio files under `folder` that a tag encoder exists for.
///
/// Extensions are matched case-insensitively against the classifier table.
/// With `include_subfolders` false only direct children are listed.
/// Results are sorted by path. Unreadable entries below the root are skipped;
/// a root that cannot be read is an error.
pub fn list_audio_files(folder: &Path, include_subfolders: bool) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(Error::not_found(folder));
    }
    // surface permission errors on the root itself
    std::fs::read_dir(folder)?;

    let max_depth = if include_subfolders { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && tagging::is_supported(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!(folder = %folder.display(), count = files.len(), "Listed audio files");
    Ok(files)
}
