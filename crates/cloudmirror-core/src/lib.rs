//! # cloudmirror-core
//!
//! Reconciliation engine that keeps a remote file store mirroring a local
//! directory tree.
//!
//! The crate is organised leaves first:
//! - [`scanner`]: enumerates the local tree into a [`LocalSnapshot`]
//! - [`remote`]: the remote-store contract plus [`RemoteOperations`], which
//!   wraps it with retry, pacing and batch operations
//! - [`detector`]: change signals, rename heuristics and the ordered
//!   reconciliation sequence
//! - [`sync`]: the [`SyncOrchestrator`] that owns the baseline and drives ticks
//! - [`config`]: layered TOML configuration resolved into [`Settings`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod detector;
pub mod error;
pub mod remote;
pub mod scanner;
pub mod snapshot;
pub mod sync;

pub use config::{ConfigManager, Settings};
pub use detector::{ChangeDetector, ContentIdentity, FileIdentity, Identity, MetadataIdentity};
pub use error::{ConfigError, RemoteStoreError, SyncError};
pub use remote::{FolderStatus, Pacing, RemoteOperations, RemoteStore, RetryPolicy};
pub use scanner::LocalScanner;
pub use snapshot::{EntryKind, LocalEntry, LocalSnapshot, RemoteEntry, RemoteSnapshot, Snapshot};
pub use sync::{Baseline, SyncOrchestrator, SyncReporter, SyncResult, SyncStatus, TickOutcome};
