//! Local tree enumeration
//!
//! Walks the mirrored root and produces a fully materialized
//! [`LocalSnapshot`]. Entries that cannot be stat-ed or whose path is not
//! valid UTF-8 are logged and skipped; a partial snapshot is not an error.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::PatternMatcher;
use crate::snapshot::{LocalEntry, LocalSnapshot};

/// Enumerates regular files beneath a root directory
pub struct LocalScanner {
    root: PathBuf,
    matcher: PatternMatcher,
    follow_symlinks: bool,
}

impl LocalScanner {
    /// Create a scanner rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, matcher: PatternMatcher, follow_symlinks: bool) -> Self {
        Self {
            root: root.into(),
            matcher,
            follow_symlinks,
        }
    }

    /// Scanner with no ignore patterns that does not follow symlinks
    #[must_use]
    pub fn unfiltered(root: impl Into<PathBuf>) -> Self {
        Self::new(root, PatternMatcher::new(), false)
    }

    /// Root directory being scanned
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root and capture every readable regular file
    #[must_use]
    pub fn scan(&self) -> LocalSnapshot {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.follow_symlinks)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| {
                entry.path().strip_prefix(&self.root).map_or(true, |rel| {
                    self.matcher
                        .should_include(rel, entry.file_type().is_dir())
                })
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable local entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(rel) = relative_key(&self.root, entry.path()) else {
                warn!(path = %entry.path().display(), "Skipping path that is not valid UTF-8");
                continue;
            };

            match entry.metadata() {
                Ok(meta) => match meta.modified() {
                    Ok(modified) => {
                        debug!(path = %rel, size = meta.len(), "Found local file");
                        entries.push((rel, LocalEntry::new(modified, meta.len())));
                    }
                    Err(e) => warn!(path = %rel, error = %e, "Skipping file without modification time"),
                },
                Err(e) => warn!(path = %rel, error = %e, "Skipping file that cannot be stat-ed"),
            }
        }

        entries.into_iter().collect()
    }

}

/// Freshly stat one local file
///
/// Returns `None` if the path is missing, unreadable or not a regular file.
#[must_use]
pub fn stat_file(path: &Path) -> Option<LocalEntry> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    Some(LocalEntry::new(meta.modified().ok()?, meta.len()))
}

/// Join a `/`-separated relative key onto a root directory
#[must_use]
pub fn absolute_path(root: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

/// `/`-joined relative key of `path` beneath `root`
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
