//! Retrying, paced operations against a [`RemoteStore`]

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use super::{FolderStatus, Pacing, RemoteStore, RetryPolicies, RetryPolicy};
use crate::error::{RemoteResult, Result, SyncError};
use crate::scanner::absolute_path;
use crate::snapshot::{LocalSnapshot, RemoteSnapshot, depth, folder_prefixes};

/// Remote enumeration and mutation on behalf of the synchronizer
pub struct RemoteOperations<S> {
    store: S,
    local_root: PathBuf,
    retry: RetryPolicies,
    pacing: Pacing,
}

impl<S: RemoteStore> RemoteOperations<S> {
    /// Wrap `store`, resolving uploads against `local_root`
    #[must_use]
    pub fn new(store: S, local_root: impl Into<PathBuf>, retry: RetryPolicies, pacing: Pacing) -> Self {
        Self {
            store,
            local_root: local_root.into(),
            retry,
            pacing,
        }
    }

    /// Enumerate the remote tree using the incremental listing policy
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Listing`] once retries are exhausted.
    pub fn list_recursive(&self) -> Result<RemoteSnapshot> {
        self.list_with(self.retry.listing)
    }

    /// Enumerate the remote tree using the more patient initial-sync policy
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Listing`] once retries are exhausted.
    pub fn list_recursive_initial(&self) -> Result<RemoteSnapshot> {
        self.list_with(self.retry.initial_listing)
    }

    fn list_with(&self, policy: RetryPolicy) -> Result<RemoteSnapshot> {
        let entries = policy
            .run("list_recursive", || self.store.list_recursive(""))
            .map_err(|e| {
                error!(attempts = e.attempts, error = %e.source, "Remote listing failed");
                SyncError::Listing {
                    attempts: e.attempts,
                    source: e.source,
                }
            })?;

        let snapshot = RemoteSnapshot::from_entries(entries);
        debug!(entries = snapshot.len(), "Listed remote tree");
        Ok(snapshot)
    }

    /// Upload one local file, retrying transient failures
    ///
    /// A file that vanished locally is skipped with a warning and `Ok(false)`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LocalRead`] if the file cannot be stat-ed and
    /// [`SyncError::Upload`] once retries are exhausted.
    pub fn upload(&self, rel: &str, is_update: bool) -> Result<bool> {
        self.upload_with_progress(rel, is_update, None)
    }

    fn upload_with_progress(
        &self,
        rel: &str,
        is_update: bool,
        progress: Option<(usize, usize)>,
    ) -> Result<bool> {
        let path = absolute_path(&self.local_root, rel);
        match path.try_exists() {
            Ok(true) => {}
            Ok(false) => {
                warn!(path = rel, "Local file no longer exists, skipping upload");
                return Ok(false);
            }
            Err(source) => {
                error!(path = rel, error = %source, "Cannot read local file metadata");
                return Err(SyncError::LocalRead { path, source });
            }
        }

        let action = if is_update { "Updating" } else { "Uploading" };
        match progress {
            Some((i, n)) => info!("[{i}/{n}] {action} {rel}"),
            None => info!(path = rel, "{action} file"),
        }

        self.retry
            .upload
            .run("upload", || {
                if is_update {
                    self.store.reupload(&path, rel)
                } else {
                    self.store.upload(&path, rel)
                }
            })
            .map(|()| true)
            .map_err(|e| {
                error!(path = rel, attempts = e.attempts, error = %e.source, "Upload failed");
                SyncError::Upload {
                    path: rel.to_string(),
                    attempts: e.attempts,
                    source: e.source,
                }
            })
    }

    /// Permanently delete a remote file or folder
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged.
    pub fn delete(&self, rel: &str) -> RemoteResult<()> {
        self.store.delete(rel)?;
        info!(path = rel, "Deleted from remote");
        Ok(())
    }

    /// Create a remote folder, treating "already exists" as success
    ///
    /// Returns whether the folder was newly created.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged.
    pub fn create_folder(&self, rel: &str) -> RemoteResult<bool> {
        match self.store.create_folder(rel)? {
            FolderStatus::Created => {
                info!(path = rel, "Created remote folder");
                Ok(true)
            }
            FolderStatus::AlreadyExists => {
                debug!(path = rel, "Remote folder already exists");
                Ok(false)
            }
        }
    }

    /// Whether the store can move entries
    #[must_use]
    pub fn supports_move(&self) -> bool {
        self.store.supports_move()
    }

    /// Move a remote file or folder
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged, including `Unsupported`.
    pub fn move_item(&self, from: &str, to: &str) -> RemoteResult<()> {
        self.store.move_item(from, to)?;
        info!(from, to, "Moved on remote");
        Ok(())
    }

    /// Delete every top-level remote entry
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Wipe`] on the first entry that cannot be deleted.
    pub fn wipe(&self, remote: &RemoteSnapshot) -> Result<usize> {
        let top_level: Vec<&String> = remote.paths().filter(|p| !p.contains('/')).collect();
        let total = top_level.len();
        info!(entries = total, "Wiping remote folder");

        for (i, path) in top_level.into_iter().enumerate() {
            self.store.delete(path).map_err(|source| {
                error!(path = %path, error = %source, "Wipe failed");
                SyncError::Wipe {
                    path: path.clone(),
                    source,
                }
            })?;
            info!("[{}/{total}] Deleted {path}", i + 1);
        }

        Pacing::pause(self.pacing.after_wipe);
        info!("Remote wipe complete");
        Ok(total)
    }

    /// Create every folder implied by `paths`, shallowest first
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CreateFolder`] on the first folder that cannot be
    /// created.
    pub fn create_folder_structure<'a>(
        &self,
        paths: impl IntoIterator<Item = &'a String>,
    ) -> Result<usize> {
        let mut folders: Vec<String> = folder_prefixes(paths).into_iter().collect();
        folders.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

        let mut created = 0;
        for folder in &folders {
            if self.create_folder(folder).map_err(|source| {
                error!(path = %folder, error = %source, "Folder creation failed");
                SyncError::CreateFolder {
                    path: folder.clone(),
                    source,
                }
            })? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Upload every file of `local` with `[i/n]` progress
    ///
    /// # Errors
    ///
    /// Returns the first upload failure.
    pub fn upload_all(&self, local: &LocalSnapshot) -> Result<usize> {
        let total = local.len();
        info!(files = total, "Uploading all files");

        let mut uploaded = 0;
        for (i, rel) in local.paths().enumerate() {
            if self.upload_with_progress(rel, false, Some((i + 1, total)))? {
                uploaded += 1;
            }
        }

        Pacing::pause(self.pacing.after_bulk_upload);
        Ok(uploaded)
    }

    /// Re-list the remote and check that every local path arrived
    ///
    /// Returns the validation listing.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Incomplete`] naming the missing paths, or a
    /// listing error.
    pub fn validate(&self, local: &LocalSnapshot) -> Result<RemoteSnapshot> {
        info!("Validating remote contents");
        let remote = self.list_recursive_initial()?;

        let missing: Vec<String> = local
            .paths()
            .filter(|p| remote.file(p).is_none())
            .cloned()
            .collect();

        if !missing.is_empty() {
            for path in &missing {
                error!(path = %path, "File missing from remote");
            }
            return Err(SyncError::Incomplete { missing });
        }

        info!(files = local.len(), "All files present on remote");
        Ok(remote)
    }

    /// Pause before one rename
    pub fn pause_item(&self) {
        Pacing::pause(self.pacing.item);
    }

    /// Pause between reconciliation steps
    pub fn pause_step(&self) {
        Pacing::pause(self.pacing.step);
    }
}
