//! Read-only comparison of the local tree with the remote

use crate::snapshot::{LocalSnapshot, RemoteSnapshot};

/// Differences between the local tree and the remote, path lists sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Local files with no remote counterpart
    pub missing_remote: Vec<String>,
    /// Remote files with no local counterpart
    pub extra_remote: Vec<String>,
    /// Files whose local copy is newer than the remote one (whole seconds)
    pub newer_local: Vec<String>,
    /// Local files examined
    pub local_files: usize,
    /// Remote files examined
    pub remote_files: usize,
}

impl SyncStatus {
    /// Compare two snapshots
    #[must_use]
    pub fn compare(local: &LocalSnapshot, remote: &RemoteSnapshot) -> Self {
        let mut status = Self {
            local_files: local.len(),
            remote_files: remote.files().count(),
            ..Self::default()
        };

        for (path, entry) in local.iter() {
            match remote.file(path) {
                None => status.missing_remote.push(path.clone()),
                Some(remote_entry) => {
                    if remote_entry
                        .modified
                        .is_some_and(|m| entry.modified_whole_secs() > m.timestamp())
                    {
                        status.newer_local.push(path.clone());
                    }
                }
            }
        }

        status.extra_remote = remote
            .files()
            .filter(|(path, _)| !local.contains(path))
            .map(|(path, _)| path.clone())
            .collect();

        status
    }

    /// Whether the remote already mirrors the local tree
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.missing_remote.is_empty() && self.extra_remote.is_empty() && self.newer_local.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{LocalEntry, RemoteEntry};
    use chrono::{TimeZone, Utc};
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_compare_classifies_paths() {
        let local: LocalSnapshot = [
            ("same.txt", 100),
            ("newer.txt", 500),
            ("only_local.txt", 100),
        ]
        .into_iter()
        .map(|(p, secs)| {
            (
                p.to_string(),
                LocalEntry::new(UNIX_EPOCH + Duration::from_secs(secs), 1),
            )
        })
        .collect();

        let t = Utc.timestamp_opt(200, 0).unwrap();
        let remote = RemoteSnapshot::from_entries([
            RemoteEntry::file("same.txt", 1, t),
            RemoteEntry::file("newer.txt", 1, t),
            RemoteEntry::file("only_remote.txt", 1, t),
            RemoteEntry::dir("folder"),
        ]);

        let status = SyncStatus::compare(&local, &remote);
        assert_eq!(status.missing_remote, vec!["only_local.txt"]);
        assert_eq!(status.extra_remote, vec!["only_remote.txt"]);
        assert_eq!(status.newer_local, vec!["newer.txt"]);
        assert_eq!(status.remote_files, 3);
        assert!(!status.is_in_sync());
    }

    #[test]
    fn test_empty_trees_are_in_sync() {
        let status = SyncStatus::compare(&LocalSnapshot::new(), &RemoteSnapshot::new());
        assert!(status.is_in_sync());
    }
}
