//! Candidate artifact discovery

use magic_classifier::ARTIFACT_EXTENSION;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::CatalogError;

/// List regular files directly inside `dir` with the artifact extension
/// (exact case), sorted by file name.
///
/// Subdirectories are not descended into. Entries that cannot be inspected
/// (for example dangling symlinks) are skipped with a warning; failing to
/// read `dir` itself is an error.
pub fn discover_candidates(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(CatalogError::Discovery(e)),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if Path::new(entry.file_name()).extension() == Some(OsStr::new(ARTIFACT_EXTENSION)) {
            candidates.push(entry.into_path());
        }
    }

    Ok(candidates)
}
