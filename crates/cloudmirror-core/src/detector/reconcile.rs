//! Ordered reconciliation of one tick
//!
//! Mutations are issued in a fixed order: folder renames, file renames,
//! uploads, deletions, then pruning of folders no local path implies. A
//! working copy of the remote snapshot is updated after every successful
//! mutation so that later steps see where earlier moves put things.
//!
//! A failed item is logged and recorded in the result; it never stops the
//! remaining items.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::renames::{Rename, plan_folder_renames};
use crate::error::{RemoteStoreError, SyncError};
use crate::remote::{RemoteOperations, RemoteStore};
use crate::snapshot::{LocalEntry, LocalSnapshot, RemoteEntry, RemoteSnapshot, depth, folder_prefixes, is_beneath};
use crate::sync::SyncResult;

#[derive(Error, Debug)]
enum ItemError {
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub(super) struct Reconciler<'a, S> {
    ops: &'a RemoteOperations<S>,
    view: BTreeMap<String, RemoteEntry>,
    processed: BTreeSet<String>,
    result: SyncResult,
}

impl<'a, S: RemoteStore> Reconciler<'a, S> {
    pub(super) fn new(ops: &'a RemoteOperations<S>, remote: &RemoteSnapshot) -> Self {
        Self {
            ops,
            view: remote.as_map().clone(),
            processed: BTreeSet::new(),
            result: SyncResult::default(),
        }
    }

    pub(super) fn run(
        mut self,
        folder_renames: Vec<Rename>,
        file_renames: &[Rename],
        current: &LocalSnapshot,
        previous: Option<&LocalSnapshot>,
    ) -> SyncResult {
        self.rename_folders(plan_folder_renames(folder_renames));
        self.rename_files(file_renames, current);
        self.upload_changes(current, previous);
        self.ops.pause_step();
        self.delete_removed(current);
        self.prune_folders(current);
        self.result
    }

    fn fail(&mut self, what: String, err: &dyn std::fmt::Display) {
        error!(item = %what, error = %err, "Reconciliation item failed");
        self.result.errors.push(format!("{what}: {err}"));
    }

    fn rename_folders(&mut self, plan: Vec<Rename>) {
        if plan.is_empty() {
            return;
        }
        info!(count = plan.len(), "Applying folder renames");

        for rename in &plan {
            self.ops.pause_item();
            if let Err(e) = self.rename_folder(rename) {
                self.fail(format!("rename folder {} -> {}", rename.from, rename.to), &e);
            }
        }
        self.ops.pause_step();
    }

    fn rename_folder(&mut self, rename: &Rename) -> Result<(), ItemError> {
        if !self.ops.supports_move() {
            return Err(RemoteStoreError::Unsupported("move").into());
        }
        self.ensure_parents(&rename.to)?;
        self.ops.move_item(&rename.from, &rename.to)?;
        self.relocate(&rename.from, &rename.to);
        self.result.renamed += 1;
        Ok(())
    }

    fn rename_files(&mut self, renames: &[Rename], current: &LocalSnapshot) {
        if renames.is_empty() {
            return;
        }
        info!(count = renames.len(), "Applying file renames");

        for rename in renames {
            self.processed.insert(rename.from.clone());
            self.processed.insert(rename.to.clone());

            if !self.has_file(&rename.from) && self.has_file(&rename.to) {
                debug!(from = %rename.from, to = %rename.to, "File already moved with its folder");
                continue;
            }

            self.ops.pause_item();
            if let Err(e) = self.rename_file(rename, current) {
                self.fail(format!("rename {} -> {}", rename.from, rename.to), &e);
            }
        }
        self.ops.pause_step();
    }

    fn rename_file(&mut self, rename: &Rename, current: &LocalSnapshot) -> Result<(), ItemError> {
        self.ensure_parents(&rename.to)?;

        if self.ops.supports_move() {
            match self.ops.move_item(&rename.from, &rename.to) {
                Ok(()) => {
                    self.relocate(&rename.from, &rename.to);
                    self.result.renamed += 1;
                    return Ok(());
                }
                Err(e) => warn!(
                    from = %rename.from,
                    to = %rename.to,
                    error = %e,
                    "Move failed, uploading under the new name instead"
                ),
            }
        }

        if !self.upload(&rename.to, false, current)? {
            return Ok(());
        }
        self.result.created += 1;

        if self.has_file(&rename.from) {
            self.ops.delete(&rename.from)?;
            self.view.remove(&rename.from);
            self.result.deleted += 1;
        }
        info!(from = %rename.from, to = %rename.to, "Re-uploaded renamed file");
        Ok(())
    }

    fn upload_changes(&mut self, current: &LocalSnapshot, previous: Option<&LocalSnapshot>) {
        for (rel, entry) in current.iter() {
            if self.processed.contains(rel) {
                continue;
            }
            if let Err(e) = self.upload_if_needed(rel, entry, current, previous) {
                self.fail(format!("upload {rel}"), &e);
            }
        }
    }

    fn upload_if_needed(
        &mut self,
        rel: &str,
        entry: &LocalEntry,
        current: &LocalSnapshot,
        previous: Option<&LocalSnapshot>,
    ) -> Result<(), ItemError> {
        let Some(remote) = self.view.get(rel).filter(|e| e.is_file()) else {
            self.ensure_parents(rel)?;
            if self.upload(rel, false, current)? {
                self.result.created += 1;
            }
            return Ok(());
        };

        let changed_since_baseline = previous
            .and_then(|p| p.get(rel))
            .is_some_and(|old| entry.modified > old.modified || entry.size != old.size);
        let newer_than_remote = remote
            .modified
            .is_some_and(|m| entry.modified_whole_secs() > m.timestamp());

        if (changed_since_baseline || newer_than_remote) && self.upload(rel, true, current)? {
            self.result.updated += 1;
        }
        Ok(())
    }

    fn delete_removed(&mut self, current: &LocalSnapshot) {
        let removed: Vec<String> = self
            .view
            .values()
            .filter(|e| e.is_file())
            .map(|e| e.path.clone())
            .filter(|p| !current.contains(p) && !self.processed.contains(p))
            .collect();

        for path in removed {
            match self.ops.delete(&path) {
                Ok(()) => {
                    self.view.remove(&path);
                    self.result.deleted += 1;
                }
                Err(e) => self.fail(format!("delete {path}"), &e),
            }
        }
    }

    fn prune_folders(&mut self, current: &LocalSnapshot) {
        let live = folder_prefixes(current.paths());
        let mut stale: Vec<String> = self
            .view
            .values()
            .filter(|e| e.is_dir() && !live.contains(&e.path))
            .map(|e| e.path.clone())
            .collect();
        stale.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

        let mut pruned: Vec<String> = Vec::new();
        for folder in stale {
            if pruned.iter().any(|p| is_beneath(&folder, p)) {
                continue;
            }
            match self.ops.delete(&folder) {
                Ok(()) => {
                    self.view
                        .retain(|path, _| *path != folder && !is_beneath(path, &folder));
                    self.result.folders_pruned += 1;
                    pruned.push(folder);
                }
                Err(e) => self.fail(format!("prune folder {folder}"), &e),
            }
        }
    }

    fn upload(&mut self, rel: &str, is_update: bool, current: &LocalSnapshot) -> Result<bool, ItemError> {
        if !self.ops.upload(rel, is_update)? {
            return Ok(false);
        }
        let size = current.get(rel).map_or(0, |e| e.size);
        self.view
            .insert(rel.to_string(), RemoteEntry::file(rel, size, Utc::now()));
        Ok(true)
    }

    /// Create the missing ancestors of `path`, shallowest first
    fn ensure_parents(&mut self, path: &str) -> Result<(), RemoteStoreError> {
        for (end, _) in path.match_indices('/') {
            let folder = &path[..end];
            if self.view.get(folder).is_some_and(RemoteEntry::is_dir) {
                continue;
            }
            if self.ops.create_folder(folder)? {
                self.result.folders_created += 1;
            }
            self.view
                .insert(folder.to_string(), RemoteEntry::dir(folder));
        }
        Ok(())
    }

    fn has_file(&self, path: &str) -> bool {
        self.view.get(path).is_some_and(RemoteEntry::is_file)
    }

    /// Apply a successful move to the working view
    fn relocate(&mut self, from: &str, to: &str) {
        self.view.retain(|path, _| path != to && !is_beneath(path, to));
        let moved: Vec<String> = self
            .view
            .keys()
            .filter(|path| *path == from || is_beneath(path, from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = self.view.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                self.view.insert(new.clone(), entry.relocated(new));
            }
        }
    }
}
