//! Tick state machine
//!
//! `Uninitialized` until an initial synchronization succeeds, then
//! incremental ticks against the committed baseline.

use tracing::{info, warn};

use super::{SyncResult, SyncStatus};
use crate::detector::ChangeDetector;
use crate::error::Result;
use crate::remote::{RemoteOperations, RemoteStore};
use crate::scanner::LocalScanner;
use crate::snapshot::{LocalSnapshot, RemoteSnapshot};

/// Last committed local and remote snapshots
///
/// Replaced wholesale at the end of a successful tick, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    /// Local tree as of the last tick
    pub local: LocalSnapshot,
    /// Remote tree as of the last tick
    pub remote: RemoteSnapshot,
}

/// What a tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Local tree is empty; nothing was touched and no baseline was set
    EmptyLocal,
    /// Initial synchronization completed and a baseline was committed
    Initialized(SyncResult),
    /// Neither side changed since the baseline
    Unchanged,
    /// Changes were reconciled and the baseline replaced
    Reconciled(SyncResult),
}

/// Owns the baseline and drives synchronization
pub struct SyncOrchestrator<S> {
    scanner: LocalScanner,
    remote: RemoteOperations<S>,
    detector: ChangeDetector,
    baseline: Option<Baseline>,
}

impl<S: RemoteStore> SyncOrchestrator<S> {
    /// Create an uninitialized orchestrator
    #[must_use]
    pub const fn new(scanner: LocalScanner, remote: RemoteOperations<S>, detector: ChangeDetector) -> Self {
        Self {
            scanner,
            remote,
            detector,
            baseline: None,
        }
    }

    /// Whether a baseline has been committed
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.baseline.is_some()
    }

    /// The committed baseline, if any
    #[must_use]
    pub const fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    /// Run one tick: initial synchronization until a baseline exists,
    /// incremental synchronization afterwards
    ///
    /// # Errors
    ///
    /// Returns the error of whichever phase failed. The baseline is left
    /// untouched on error.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.baseline.is_some() {
            self.sync()
        } else {
            self.initial_sync()
        }
    }

    /// Destructive full synchronization
    ///
    /// Wipes the remote, recreates the folder hierarchy, uploads every local
    /// file and validates the result. An empty local tree is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if listing, wiping, folder creation, any upload or
    /// the final validation fails.
    pub fn initial_sync(&mut self) -> Result<TickOutcome> {
        info!("Starting initial synchronization");

        info!("Phase 1: scanning local files");
        let local = self.scanner.scan();
        if local.is_empty() {
            warn!(root = %self.scanner.root().display(), "Local folder is empty, nothing to synchronize");
            return Ok(TickOutcome::EmptyLocal);
        }

        info!("Phase 2: listing remote files");
        let remote = self.remote.list_recursive_initial()?;

        let mut result = SyncResult::default();
        if !remote.is_empty() {
            info!("Phase 3: clearing remote folder");
            result.deleted = self.remote.wipe(&remote)?;
        }

        info!("Phase 4: creating folder structure");
        result.folders_created = self.remote.create_folder_structure(local.paths())?;

        info!("Phase 5: uploading files");
        result.created = self.remote.upload_all(&local)?;

        info!("Phase 6: validating");
        let validated = self.remote.validate(&local)?;

        self.baseline = Some(Baseline {
            local,
            remote: validated,
        });
        info!(
            files = result.created,
            folders = result.folders_created,
            "Initial synchronization complete"
        );
        Ok(TickOutcome::Initialized(result))
    }

    /// One incremental tick
    ///
    /// Reconciles when either side changed since the baseline, then replaces
    /// the baseline with the snapshots observed at the start of the tick,
    /// even if individual items failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cannot be listed.
    pub fn sync(&mut self) -> Result<TickOutcome> {
        let local = self.scanner.scan();
        let remote = self.remote.list_recursive()?;

        let previous = self.baseline.as_ref();
        let local_changed = ChangeDetector::has_changed(&local, previous.map(|b| &b.local));
        let remote_changed = ChangeDetector::has_changed(&remote, previous.map(|b| &b.remote));

        if !local_changed && !remote_changed {
            info!("No changes detected");
            return Ok(TickOutcome::Unchanged);
        }

        info!(local_changed, remote_changed, "Changes detected, reconciling");
        let result = self
            .detector
            .reconcile(&self.remote, &local, &remote, previous.map(|b| &b.local));

        self.baseline = Some(Baseline { local, remote });
        info!(
            operations = result.total_operations(),
            errors = result.errors.len(),
            "Reconciliation finished"
        );
        Ok(TickOutcome::Reconciled(result))
    }

    /// Compare the local tree with the remote without mutating anything
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cannot be listed.
    pub fn status(&self) -> Result<SyncStatus> {
        let local = self.scanner.scan();
        let remote = self.remote.list_recursive()?;
        Ok(SyncStatus::compare(&local, &remote))
    }
}
