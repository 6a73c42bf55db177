//! Point-in-time views of the local and remote trees
//!
//! Both sides are keyed by a relative POSIX path (`dir/file.txt`) regardless
//! of the source filesystem. Snapshots are ordered maps, so every traversal of
//! a snapshot visits paths in lexicographic order.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Metadata captured for one local regular file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalEntry {
    /// Last modification time
    pub modified: SystemTime,
    /// Size in bytes
    pub size: u64,
}

impl LocalEntry {
    /// Create an entry from its parts
    #[must_use]
    pub const fn new(modified: SystemTime, size: u64) -> Self {
        Self { modified, size }
    }

    /// Modification time truncated to whole seconds since the Unix epoch
    #[must_use]
    pub fn modified_whole_secs(&self) -> i64 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}

/// Kind of a remote entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Folder
    Dir,
}

/// Metadata reported by the remote store for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Path relative to the mirrored remote folder
    pub path: String,
    /// File or folder
    pub kind: EntryKind,
    /// Size in bytes (files only)
    pub size: Option<u64>,
    /// Last modification timestamp (files only)
    pub modified: Option<DateTime<Utc>>,
    /// Hex SHA-256 digest when the store reports one
    pub sha256: Option<String>,
}

impl RemoteEntry {
    /// A file entry without digest
    #[must_use]
    pub fn file(path: impl Into<String>, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size: Some(size),
            modified: Some(modified),
            sha256: None,
        }
    }

    /// A folder entry
    #[must_use]
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Dir,
            size: None,
            modified: None,
            sha256: None,
        }
    }

    /// Whether this entry is a regular file
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Whether this entry is a folder
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// Copy of this entry relocated to another path
    #[must_use]
    pub fn relocated(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

/// Size and modification time view shared by both entry types, used for
/// change signals.
pub trait Observed {
    /// Size in bytes, if known
    fn observed_size(&self) -> Option<u64>;
    /// Modification time, if known
    fn observed_modified(&self) -> Option<SystemTime>;
}

impl Observed for LocalEntry {
    fn observed_size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn observed_modified(&self) -> Option<SystemTime> {
        Some(self.modified)
    }
}

impl Observed for RemoteEntry {
    fn observed_size(&self) -> Option<u64> {
        self.size
    }

    fn observed_modified(&self) -> Option<SystemTime> {
        self.modified.map(SystemTime::from)
    }
}

/// Path-keyed mapping captured at one instant
///
/// A snapshot is built once and then only read; a newer observation replaces
/// it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<E> {
    entries: BTreeMap<String, E>,
}

/// Snapshot of the local tree
pub type LocalSnapshot = Snapshot<LocalEntry>;

/// Snapshot of the remote tree (files and folders)
pub type RemoteSnapshot = Snapshot<RemoteEntry>;

impl<E> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<E> Snapshot<E> {
    /// Empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry at `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&E> {
        self.entries.get(path)
    }

    /// Whether `path` is present
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &E)> {
        self.entries.iter()
    }

    /// Paths in lexicographic order
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Whether both snapshots hold exactly the same set of paths
    #[must_use]
    pub fn same_paths<F>(&self, other: &Snapshot<F>) -> bool {
        self.len() == other.len() && self.paths().eq(other.paths())
    }

    /// Borrow the underlying ordered map
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, E> {
        &self.entries
    }
}

impl RemoteSnapshot {
    /// File entries only, in path order
    pub fn files(&self) -> impl Iterator<Item = (&String, &RemoteEntry)> {
        self.entries.iter().filter(|(_, e)| e.is_file())
    }

    /// Folder paths only, in path order
    pub fn dirs(&self) -> impl Iterator<Item = &String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_dir())
            .map(|(p, _)| p)
    }

    /// File at `path`, ignoring folders
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&RemoteEntry> {
        self.entries.get(path).filter(|e| e.is_file())
    }

    /// Build a snapshot from listed entries, keyed by their path
    pub fn from_entries(entries: impl IntoIterator<Item = RemoteEntry>) -> Self {
        entries.into_iter().map(|e| (e.path.clone(), e)).collect()
    }
}

impl<E> FromIterator<(String, E)> for Snapshot<E> {
    fn from_iter<T: IntoIterator<Item = (String, E)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<E> From<BTreeMap<String, E>> for Snapshot<E> {
    fn from(entries: BTreeMap<String, E>) -> Self {
        Self { entries }
    }
}

/// Every folder implied by a set of file paths
///
/// `a/b/c.txt` implies `a` and `a/b`.
pub fn folder_prefixes<'a>(paths: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
    let mut folders = BTreeSet::new();
    for path in paths {
        let mut end = 0;
        while let Some(pos) = path[end..].find('/') {
            end += pos;
            folders.insert(path[..end].to_string());
            end += 1;
        }
    }
    folders
}

/// Parent folder of a relative path, `None` at the root
#[must_use]
pub fn parent_of(path: &str) -> Option<&str> {
    path.rfind('/').map(|pos| &path[..pos])
}

/// Number of `/` separators, used to order folders by depth
#[must_use]
pub fn depth(path: &str) -> usize {
    path.matches('/').count()
}

/// Whether `path` lies strictly beneath `folder`
#[must_use]
pub fn is_beneath(path: &str, folder: &str) -> bool {
    path.len() > folder.len() + 1
        && path.starts_with(folder)
        && path.as_bytes()[folder.len()] == b'/'
}
