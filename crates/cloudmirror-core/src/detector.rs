//! Change detection and reconciliation
//!
//! This module handles:
//! - Change signals between a snapshot and its baseline
//! - File and folder rename heuristics
//! - The ordered mutation sequence that brings the remote in line

mod identity;
mod reconcile;
mod renames;

use std::path::PathBuf;

pub use identity::{ContentIdentity, FileIdentity, Identity, MetadataIdentity};
pub use renames::{Rename, plan_folder_renames};

use reconcile::Reconciler;
use tracing::{debug, info};

use crate::remote::{RemoteOperations, RemoteStore};
use crate::snapshot::{LocalSnapshot, Observed, RemoteSnapshot, Snapshot};
use crate::sync::SyncResult;

/// Compares snapshots and drives reconciliation
pub struct ChangeDetector {
    local_root: PathBuf,
    identity: Box<dyn FileIdentity>,
}

impl ChangeDetector {
    /// Create a detector that pairs renames with `identity`
    #[must_use]
    pub fn new(local_root: impl Into<PathBuf>, identity: Box<dyn FileIdentity>) -> Self {
        Self {
            local_root: local_root.into(),
            identity,
        }
    }

    /// Whether `current` differs from `baseline`
    ///
    /// True when there is no baseline, when the path sets differ, or when a
    /// shared path changed size or has a strictly newer modification time.
    #[must_use]
    pub fn has_changed<E: Observed>(current: &Snapshot<E>, baseline: Option<&Snapshot<E>>) -> bool {
        let Some(baseline) = baseline else {
            debug!("No baseline, treating as changed");
            return true;
        };

        if !current.same_paths(baseline) {
            debug!(
                current = current.len(),
                baseline = baseline.len(),
                "Path set changed"
            );
            return true;
        }

        current.iter().any(|(path, entry)| {
            baseline.get(path).is_some_and(|old| {
                let changed = entry.observed_size() != old.observed_size()
                    || matches!(
                        (entry.observed_modified(), old.observed_modified()),
                        (Some(now), Some(then)) if now > then
                    );
                if changed {
                    debug!(path = %path, "Entry changed");
                }
                changed
            })
        })
    }

    /// File renames between `previous` and `current`
    #[must_use]
    pub fn find_renamed_files(
        &self,
        previous: &LocalSnapshot,
        current: &LocalSnapshot,
        remote: &RemoteSnapshot,
    ) -> Vec<Rename> {
        renames::find_renamed_files(previous, current, remote, self.identity.as_ref(), &self.local_root)
    }

    /// Folder renames between `previous` and `current`
    #[must_use]
    pub fn find_renamed_folders(
        previous: &LocalSnapshot,
        current: &LocalSnapshot,
        remote: &RemoteSnapshot,
    ) -> Vec<Rename> {
        renames::find_renamed_folders(previous, current, remote)
    }

    /// Issue the mutations that make the remote mirror `current`
    ///
    /// `previous` is the local baseline; only the current remote snapshot is
    /// consulted on the remote side. Item failures are collected in the
    /// returned result and never abort the sequence.
    pub fn reconcile<S: RemoteStore>(
        &self,
        ops: &RemoteOperations<S>,
        current: &LocalSnapshot,
        remote: &RemoteSnapshot,
        previous: Option<&LocalSnapshot>,
    ) -> SyncResult {
        let (folder_renames, file_renames) = match previous {
            Some(previous) => (
                Self::find_renamed_folders(previous, current, remote),
                self.find_renamed_files(previous, current, remote),
            ),
            None => (Vec::new(), Vec::new()),
        };

        if !folder_renames.is_empty() || !file_renames.is_empty() {
            info!(
                folders = folder_renames.len(),
                files = file_renames.len(),
                "Rename candidates detected"
            );
        }

        Reconciler::new(ops, remote).run(folder_renames, &file_renames, current, previous)
    }
}
