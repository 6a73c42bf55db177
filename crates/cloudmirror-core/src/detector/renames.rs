//! Rename heuristics for files and folders
//!
//! Candidates are visited in lexicographic order and the first match wins,
//! so a given pair of snapshots always yields the same pairing. Matching is
//! greedy, not globally optimal.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::identity::{FileIdentity, Identity};
use crate::scanner::absolute_path;
use crate::snapshot::{LocalSnapshot, RemoteSnapshot, depth, folder_prefixes, is_beneath};

/// A path that moved from `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    /// Path before the rename
    pub from: String,
    /// Path after the rename
    pub to: String,
}

impl Rename {
    /// Create a rename pair
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Pair files that disappeared locally with files that appeared
///
/// A disappeared path qualifies only while the remote still stores it as a
/// file. The pair matches when both identities exist and are equal.
pub fn find_renamed_files(
    previous: &LocalSnapshot,
    current: &LocalSnapshot,
    remote: &RemoteSnapshot,
    identity: &dyn FileIdentity,
    local_root: &Path,
) -> Vec<Rename> {
    let disappeared: Vec<&String> = previous.paths().filter(|p| !current.contains(p)).collect();
    let appeared: Vec<&String> = current.paths().filter(|p| !previous.contains(p)).collect();
    if disappeared.is_empty() || appeared.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<(&String, Option<Identity>)> = Vec::new();
    let mut hashed = false;
    let mut renames = Vec::new();

    for old in disappeared {
        let (Some(baseline), Some(remote_entry)) = (previous.get(old), remote.file(old)) else {
            continue;
        };
        let Some(old_identity) = identity.previous(baseline, remote_entry) else {
            continue;
        };

        if !hashed {
            candidates = appeared
                .iter()
                .map(|p| (*p, identity.current(&absolute_path(local_root, p))))
                .collect();
            hashed = true;
        }

        if let Some(pos) = candidates
            .iter()
            .position(|(_, id)| id.as_ref() == Some(&old_identity))
        {
            let (new, _) = candidates.remove(pos);
            debug!(from = %old, to = %new, "Detected file rename");
            renames.push(Rename::new(old.clone(), new.clone()));
        }
    }

    renames
}

/// Pair folders that disappeared locally with folders that appeared
///
/// Folders match when the remote files beneath the old folder and the local
/// files beneath the new one have the same relative sub-paths and sizes.
///
/// A parent whose subfolder was renamed as well no longer has the same
/// structure, so only the subfolder is paired. The parent's remaining files
/// are left to file rename detection.
pub fn find_renamed_folders(
    previous: &LocalSnapshot,
    current: &LocalSnapshot,
    remote: &RemoteSnapshot,
) -> Vec<Rename> {
    let before = folder_prefixes(previous.paths());
    let after = folder_prefixes(current.paths());

    let mut appeared: Vec<&String> = after.difference(&before).collect();
    let mut renames = Vec::new();

    for old in before.difference(&after) {
        if let Some(pos) = appeared
            .iter()
            .position(|new| same_structure(old, new, current, remote))
        {
            let new = appeared.remove(pos);
            debug!(from = %old, to = %new, "Detected folder rename");
            renames.push(Rename::new(old.clone(), new.clone()));
        }
    }

    renames
}

fn same_structure(old: &str, new: &str, current: &LocalSnapshot, remote: &RemoteSnapshot) -> bool {
    let old_files: BTreeMap<&str, Option<u64>> = remote
        .files()
        .filter(|(p, _)| is_beneath(p, old))
        .map(|(p, e)| (&p[old.len() + 1..], e.size))
        .collect();
    let new_files: BTreeMap<&str, u64> = current
        .iter()
        .filter(|(p, _)| is_beneath(p, new))
        .map(|(p, e)| (&p[new.len() + 1..], e.size))
        .collect();

    !new_files.is_empty()
        && old_files.len() == new_files.len()
        && new_files
            .iter()
            .all(|(rel, size)| old_files.get(rel) == Some(&Some(*size)))
}

/// Order folder renames for execution
///
/// Deepest source first. A rename nested in another detected rename is
/// rewritten to act inside the ancestor's old location, so the ancestor's
/// move carries it to its final place; when that leaves nothing to do it is
/// dropped.
#[must_use]
pub fn plan_folder_renames(mut renames: Vec<Rename>) -> Vec<Rename> {
    renames.sort_by(|a, b| {
        depth(&b.from)
            .cmp(&depth(&a.from))
            .then_with(|| a.from.cmp(&b.from))
    });

    let mut plan = Vec::with_capacity(renames.len());
    for rename in &renames {
        let ancestor = renames
            .iter()
            .filter(|a| is_beneath(&rename.from, &a.from) && is_beneath(&rename.to, &a.to))
            .max_by_key(|a| a.from.len());

        let planned = match ancestor {
            Some(a) => Rename::new(
                rename.from.clone(),
                format!("{}{}", a.from, &rename.to[a.to.len()..]),
            ),
            None => rename.clone(),
        };

        if planned.from == planned.to {
            debug!(from = %rename.from, to = %rename.to, "Folder rename carried by ancestor");
        } else {
            plan.push(planned);
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::identity::MetadataIdentity;
    use crate::snapshot::{LocalEntry, RemoteEntry};
    use chrono::Utc;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    fn write_with_mtime(root: &Path, rel: &str, content: &str, mtime: SystemTime) -> LocalEntry {
        let path = absolute_path(root, rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        LocalEntry::new(mtime, content.len() as u64)
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn local(entries: &[(&str, LocalEntry)]) -> LocalSnapshot {
        entries.iter().map(|(p, e)| ((*p).to_string(), *e)).collect()
    }

    fn remote_files(entries: &[(&str, u64)]) -> RemoteSnapshot {
        RemoteSnapshot::from_entries(
            entries
                .iter()
                .map(|(p, size)| RemoteEntry::file(*p, *size, Utc::now())),
        )
    }

    #[test]
    fn test_file_rename_detected() {
        let tmp = TempDir::new().unwrap();
        let entry = write_with_mtime(tmp.path(), "b.txt", "0123456789", at(1_000));

        let previous = local(&[("a.txt", entry)]);
        let current = local(&[("b.txt", entry)]);
        let remote = remote_files(&[("a.txt", 10)]);

        let renames =
            find_renamed_files(&previous, &current, &remote, &MetadataIdentity, tmp.path());
        assert_eq!(renames, vec![Rename::new("a.txt", "b.txt")]);
    }

    #[test]
    fn test_same_size_different_mtime_is_not_rename() {
        let tmp = TempDir::new().unwrap();
        let old = LocalEntry::new(at(1_000), 10);
        let new = write_with_mtime(tmp.path(), "b.txt", "0123456789", at(2_000));

        let previous = local(&[("a.txt", old)]);
        let current = local(&[("b.txt", new)]);
        let remote = remote_files(&[("a.txt", 10)]);

        assert!(
            find_renamed_files(&previous, &current, &remote, &MetadataIdentity, tmp.path())
                .is_empty()
        );
    }

    #[test]
    fn test_rename_requires_remote_copy() {
        let tmp = TempDir::new().unwrap();
        let entry = write_with_mtime(tmp.path(), "b.txt", "x", at(1_000));

        let previous = local(&[("a.txt", entry)]);
        let current = local(&[("b.txt", entry)]);
        let remote = RemoteSnapshot::new();

        assert!(
            find_renamed_files(&previous, &current, &remote, &MetadataIdentity, tmp.path())
                .is_empty()
        );
    }

    #[test]
    fn test_identical_candidates_pair_in_path_order() {
        let tmp = TempDir::new().unwrap();
        let entry = write_with_mtime(tmp.path(), "new1.txt", "same", at(5_000));
        write_with_mtime(tmp.path(), "new2.txt", "same", at(5_000));

        let previous = local(&[("old1.txt", entry), ("old2.txt", entry)]);
        let current = local(&[("new2.txt", entry), ("new1.txt", entry)]);
        let remote = remote_files(&[("old2.txt", 4), ("old1.txt", 4)]);

        for _ in 0..5 {
            let renames =
                find_renamed_files(&previous, &current, &remote, &MetadataIdentity, tmp.path());
            assert_eq!(
                renames,
                vec![
                    Rename::new("old1.txt", "new1.txt"),
                    Rename::new("old2.txt", "new2.txt"),
                ]
            );
        }
    }

    #[test]
    fn test_folder_rename_structural_match() {
        let e = |size| LocalEntry::new(at(1), size);
        let previous = local(&[("photos/a.jpg", e(10)), ("photos/sub/b.jpg", e(20))]);
        let current = local(&[("pictures/a.jpg", e(10)), ("pictures/sub/b.jpg", e(20))]);
        let remote = remote_files(&[("photos/a.jpg", 10), ("photos/sub/b.jpg", 20)]);

        let renames = find_renamed_folders(&previous, &current, &remote);
        assert!(renames.contains(&Rename::new("photos", "pictures")));
        assert!(renames.contains(&Rename::new("photos/sub", "pictures/sub")));
    }

    #[test]
    fn test_folder_rename_size_mismatch() {
        let e = |size| LocalEntry::new(at(1), size);
        let previous = local(&[("photos/a.jpg", e(10))]);
        let current = local(&[("pictures/a.jpg", e(11))]);
        let remote = remote_files(&[("photos/a.jpg", 10)]);

        assert!(find_renamed_folders(&previous, &current, &remote).is_empty());
    }

    #[test]
    fn test_parent_with_renamed_child_is_not_paired() {
        let e = |size| LocalEntry::new(at(1), size);
        let previous = local(&[("p/a.txt", e(1)), ("p/q/f.txt", e(4))]);
        let current = local(&[("r/a.txt", e(1)), ("r/s/f.txt", e(4))]);
        let remote = remote_files(&[("p/a.txt", 1), ("p/q/f.txt", 4)]);

        let renames = find_renamed_folders(&previous, &current, &remote);
        assert_eq!(renames, vec![Rename::new("p/q", "r/s")]);
    }

    #[test]
    fn test_plan_orders_deepest_first() {
        let plan = plan_folder_renames(vec![
            Rename::new("m", "n"),
            Rename::new("x/y", "x/z"),
        ]);
        assert_eq!(plan, vec![Rename::new("x/y", "x/z"), Rename::new("m", "n")]);
    }

    #[test]
    fn test_plan_nested_child_applied_before_parent() {
        let plan = plan_folder_renames(vec![
            Rename::new("p", "r"),
            Rename::new("p/q", "r/s"),
        ]);
        assert_eq!(plan, vec![Rename::new("p/q", "p/s"), Rename::new("p", "r")]);
    }

    #[test]
    fn test_plan_drops_renames_carried_by_ancestor() {
        let plan = plan_folder_renames(vec![
            Rename::new("photos/sub", "pictures/sub"),
            Rename::new("photos", "pictures"),
        ]);
        assert_eq!(plan, vec![Rename::new("photos", "pictures")]);
    }
}
