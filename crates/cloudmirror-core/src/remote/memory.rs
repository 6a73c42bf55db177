//! In-memory remote store for tests
//!
//! Behaves like a real hierarchical store: uploads and folder creation
//! require the parent folder to exist, deleting a folder removes everything
//! beneath it, and `move` relocates a whole subtree. Every call is recorded,
//! transient failures can be injected per operation and `move` can be
//! switched off.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};

use super::{FolderStatus, RemoteStore};
use crate::error::{RemoteResult, RemoteStoreError};
use crate::snapshot::{RemoteEntry, is_beneath, parent_of};

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload(String),
    Reupload(String),
    Delete(String),
    CreateFolder(String),
    Move(String, String),
    List(String),
}

impl Call {
    /// Whether the call mutates the store
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::List(_))
    }
}

/// Operation class targeted by injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Op {
    Upload,
    Delete,
    CreateFolder,
    Move,
    List,
}

#[derive(Default)]
struct State {
    entries: BTreeMap<String, RemoteEntry>,
    calls: Vec<Call>,
    move_disabled: bool,
    failures: BTreeMap<Op, u32>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store without `move`
    pub fn without_move() -> Self {
        let store = Self::new();
        store.state.borrow_mut().move_disabled = true;
        store
    }

    /// Fail the next `count` calls of `op` with a transient error
    pub fn fail_next(&self, op: Op, count: u32) {
        self.state.borrow_mut().failures.insert(op, count);
    }

    /// Place a file directly, creating its folders, without recording a call
    pub fn seed_file(&self, path: &str, content: &[u8]) {
        let mut state = self.state.borrow_mut();
        let mut end = 0;
        while let Some(pos) = path[end..].find('/') {
            end += pos;
            let folder = &path[..end];
            state
                .entries
                .entry(folder.to_string())
                .or_insert_with(|| RemoteEntry::dir(folder));
            end += 1;
        }
        state
            .entries
            .insert(path.to_string(), file_entry(path, content));
    }

    /// Every recorded call, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Recorded mutations only
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Paths of every stored file, sorted
    pub fn file_paths(&self) -> Vec<String> {
        self.state
            .borrow()
            .entries
            .values()
            .filter(|e| e.is_file())
            .map(|e| e.path.clone())
            .collect()
    }

    /// Paths of every stored folder, sorted
    pub fn dir_paths(&self) -> Vec<String> {
        self.state
            .borrow()
            .entries
            .values()
            .filter(|e| e.is_dir())
            .map(|e| e.path.clone())
            .collect()
    }

    pub fn entry(&self, path: &str) -> Option<RemoteEntry> {
        self.state.borrow().entries.get(path).cloned()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn injected_failure(&self, op: Op) -> RemoteResult<()> {
        let mut state = self.state.borrow_mut();
        match state.failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(RemoteStoreError::Transport(format!("injected {op:?} failure")))
            }
            _ => Ok(()),
        }
    }

    fn require_parent(&self, path: &str) -> RemoteResult<()> {
        let Some(parent) = parent_of(path) else {
            return Ok(());
        };
        match self.state.borrow().entries.get(parent) {
            Some(entry) if entry.is_dir() => Ok(()),
            _ => Err(RemoteStoreError::Conflict {
                path: path.to_string(),
                message: format!("parent folder {parent} does not exist"),
            }),
        }
    }

    fn put_file(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        self.injected_failure(Op::Upload)?;
        self.require_parent(remote)?;
        let content = fs::read(local)?;
        self.state
            .borrow_mut()
            .entries
            .insert(remote.to_string(), file_entry(remote, &content));
        Ok(())
    }
}

fn file_entry(path: &str, content: &[u8]) -> RemoteEntry {
    let mut entry = RemoteEntry::file(path, content.len() as u64, Utc::now());
    entry.sha256 = Some(format!("{:x}", Sha256::digest(content)));
    entry
}

impl RemoteStore for MemoryStore {
    fn upload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        self.record(Call::Upload(remote.to_string()));
        self.put_file(local, remote)
    }

    fn reupload(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        self.record(Call::Reupload(remote.to_string()));
        self.put_file(local, remote)
    }

    fn delete(&self, remote: &str) -> RemoteResult<()> {
        self.record(Call::Delete(remote.to_string()));
        self.injected_failure(Op::Delete)?;
        let mut state = self.state.borrow_mut();
        if state.entries.remove(remote).is_none() {
            return Err(RemoteStoreError::NotFound(remote.to_string()));
        }
        state.entries.retain(|path, _| !is_beneath(path, remote));
        Ok(())
    }

    fn list_children(&self, remote: &str) -> RemoteResult<Vec<RemoteEntry>> {
        self.record(Call::List(remote.to_string()));
        self.injected_failure(Op::List)?;
        let state = self.state.borrow();
        if !remote.is_empty() && !state.entries.get(remote).is_some_and(RemoteEntry::is_dir) {
            return Err(RemoteStoreError::NotFound(remote.to_string()));
        }
        Ok(state
            .entries
            .values()
            .filter(|e| parent_of(&e.path).unwrap_or("") == remote)
            .cloned()
            .collect())
    }

    fn create_folder(&self, remote: &str) -> RemoteResult<FolderStatus> {
        self.record(Call::CreateFolder(remote.to_string()));
        self.injected_failure(Op::CreateFolder)?;
        if self.state.borrow().entries.contains_key(remote) {
            return Ok(FolderStatus::AlreadyExists);
        }
        self.require_parent(remote)?;
        self.state
            .borrow_mut()
            .entries
            .insert(remote.to_string(), RemoteEntry::dir(remote));
        Ok(FolderStatus::Created)
    }

    fn supports_move(&self) -> bool {
        !self.state.borrow().move_disabled
    }

    fn move_item(&self, from: &str, to: &str) -> RemoteResult<()> {
        if !self.supports_move() {
            return Err(RemoteStoreError::Unsupported("move"));
        }
        self.record(Call::Move(from.to_string(), to.to_string()));
        self.injected_failure(Op::Move)?;
        if !self.state.borrow().entries.contains_key(from) {
            return Err(RemoteStoreError::NotFound(from.to_string()));
        }
        self.require_parent(to)?;

        let mut state = self.state.borrow_mut();
        state
            .entries
            .retain(|path, _| path != to && !is_beneath(path, to));
        let moved: Vec<String> = state
            .entries
            .keys()
            .filter(|path| *path == from || is_beneath(path, from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = state.entries.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                state.entries.insert(new.clone(), entry.relocated(new));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_upload_requires_parent() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f.txt");
        fs::write(&file, "x").unwrap();

        let store = MemoryStore::new();
        assert!(matches!(
            store.upload(&file, "missing/f.txt"),
            Err(RemoteStoreError::Conflict { .. })
        ));
        store.create_folder("missing").unwrap();
        store.upload(&file, "missing/f.txt").unwrap();
        assert_eq!(store.file_paths(), vec!["missing/f.txt"]);
    }

    #[test]
    fn test_move_relocates_subtree() {
        let store = MemoryStore::new();
        store.seed_file("old/a.txt", b"a");
        store.seed_file("old/sub/b.txt", b"b");

        store.move_item("old", "new").unwrap();

        assert_eq!(store.file_paths(), vec!["new/a.txt", "new/sub/b.txt"]);
        assert_eq!(store.dir_paths(), vec!["new", "new/sub"]);
    }

    #[test]
    fn test_delete_folder_is_recursive() {
        let store = MemoryStore::new();
        store.seed_file("d/a.txt", b"a");
        store.seed_file("d/e/b.txt", b"b");
        store.seed_file("keep.txt", b"k");

        store.delete("d").unwrap();
        assert_eq!(store.file_paths(), vec!["keep.txt"]);
        assert!(store.dir_paths().is_empty());
    }

    #[test]
    fn test_injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next(Op::List, 1);
        assert!(store.list_children("").is_err());
        assert!(store.list_children("").is_ok());
    }
}
