//! Remote store contract and the operations layered on top of it
//!
//! [`RemoteStore`] is the seam to a concrete backend. Paths passed across it
//! are relative to the mirrored remote folder and use `/` separators; the
//! backend is responsible for anchoring them to its own namespace.
//!
//! [`RemoteOperations`] wraps a store with bounded retry, rate-limit pacing
//! and the batch operations used by the initial synchronization.

mod operations;
mod pacing;
mod retry;

#[cfg(test)]
pub(crate) mod memory;

use std::path::Path;

pub use operations::RemoteOperations;
pub use pacing::Pacing;
pub use retry::{Exhausted, RetryPolicies, RetryPolicy};

use crate::error::{RemoteResult, RemoteStoreError};
use crate::snapshot::RemoteEntry;

/// Outcome of a folder creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    /// The folder was created by this call
    Created,
    /// The folder was already present
    AlreadyExists,
}

/// Capability set required from a remote file store
///
/// All calls block until the store has answered. A failed call leaves no
/// partial state that the caller must clean up.
pub trait RemoteStore {
    /// Push a local file to `remote`
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the upload or the file cannot be read.
    fn upload(&self, local: &Path, remote: &str) -> RemoteResult<()>;

    /// Push a local file over an existing remote file
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the upload or the file cannot be read.
    fn reupload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        self.upload(local, remote)
    }

    /// Permanently delete a file or folder
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the deletion.
    fn delete(&self, remote: &str) -> RemoteResult<()>;

    /// Direct children of a folder (`""` is the mirrored root)
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be listed.
    fn list_children(&self, remote: &str) -> RemoteResult<Vec<RemoteEntry>>;

    /// Every entry beneath `root`, flattened
    ///
    /// The default walks folders depth-first through [`Self::list_children`].
    ///
    /// # Errors
    ///
    /// Returns the first listing error encountered.
    fn list_recursive(&self, root: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let mut all = Vec::new();
        let mut stack = vec![root.to_string()];

        while let Some(folder) = stack.pop() {
            for entry in self.list_children(&folder)? {
                if entry.is_dir() {
                    stack.push(entry.path.clone());
                }
                all.push(entry);
            }
        }

        Ok(all)
    }

    /// Create a folder whose parent already exists
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request for any reason other
    /// than the folder already existing.
    fn create_folder(&self, remote: &str) -> RemoteResult<FolderStatus>;

    /// Whether [`Self::move_item`] is available
    fn supports_move(&self) -> bool {
        false
    }

    /// Move a file or folder, overwriting the destination
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Unsupported`] unless the store overrides it.
    fn move_item(&self, _from: &str, _to: &str) -> RemoteResult<()> {
        Err(RemoteStoreError::Unsupported("move"))
    }
}

impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn upload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        (**self).upload(local, remote)
    }

    fn reupload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        (**self).reupload(local, remote)
    }

    fn delete(&self, remote: &str) -> RemoteResult<()> {
        (**self).delete(remote)
    }

    fn list_children(&self, remote: &str) -> RemoteResult<Vec<RemoteEntry>> {
        (**self).list_children(remote)
    }

    fn list_recursive(&self, root: &str) -> RemoteResult<Vec<RemoteEntry>> {
        (**self).list_recursive(root)
    }

    fn create_folder(&self, remote: &str) -> RemoteResult<FolderStatus> {
        (**self).create_folder(remote)
    }

    fn supports_move(&self) -> bool {
        (**self).supports_move()
    }

    fn move_item(&self, from: &str, to: &str) -> RemoteResult<()> {
        (**self).move_item(from, to)
    }
}

impl<T: RemoteStore + ?Sized> RemoteStore for Box<T> {
    fn upload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        (**self).upload(local, remote)
    }

    fn reupload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        (**self).reupload(local, remote)
    }

    fn delete(&self, remote: &str) -> RemoteResult<()> {
        (**self).delete(remote)
    }

    fn list_children(&self, remote: &str) -> RemoteResult<Vec<RemoteEntry>> {
        (**self).list_children(remote)
    }

    fn list_recursive(&self, root: &str) -> RemoteResult<Vec<RemoteEntry>> {
        (**self).list_recursive(root)
    }

    fn create_folder(&self, remote: &str) -> RemoteResult<FolderStatus> {
        (**self).create_folder(remote)
    }

    fn supports_move(&self) -> bool {
        (**self).supports_move()
    }

    fn move_item(&self, from: &str, to: &str) -> RemoteResult<()> {
        (**self).move_item(from, to)
    }
}
