// --- FILE: superprompt-lib/src/listing.rs ---

use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::WalkDir;

use crate::errors::{CoreError, CoreResult};

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub(crate) struct ListedEntry {
    /// The final path component, lossily converted for display.
    pub name: String,
    pub path: PathBuf,
    /// True for directories and for symlinks that resolve to one.
    pub is_dir: bool,
}

/// Lists the direct children of `dir`, sorted by file name (ordinal, case
/// sensitive).
///
/// Only one level is read; recursion is left to the tree builder so it can
/// apply depth and ignore rules per level. Symlinks are not followed during
/// the walk, but a link pointing at a directory is reported as a directory.
/// A broken link is reported as a file.
pub(crate) fn list_dir_sorted(dir: &Path) -> CoreResult<Vec<ListedEntry>> {
    debug!("Listing directory: {:?}", dir);
    let mut entries = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry_result in walker {
        let entry = entry_result.map_err(|e| CoreError::WalkError {
            path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            source: e,
        })?;

        let is_dir = if entry.path_is_symlink() {
            entry.path().is_dir()
        } else {
            entry.file_type().is_dir()
        };

        trace!("Listed {:?} (dir: {})", entry.path(), is_dir);
        entries.push(ListedEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path().to_path_buf(),
            is_dir,
        });
    }

    Ok(entries)
}
