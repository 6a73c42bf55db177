//! Synchronization engine
//!
//! [`SyncOrchestrator`] owns the baseline and runs ticks: a full initial
//! synchronization until a baseline exists, incremental reconciliation after.

mod orchestrator;
mod reporting;
mod status;


pub use orchestrator::{Baseline, SyncOrchestrator, TickOutcome};
pub use reporting::SyncReporter;
pub use status::SyncStatus;

/// Synchronization result with statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Files uploaded under a new remote path
    pub created: usize,
    /// Files re-uploaded over an existing remote path
    pub updated: usize,
    /// Remote files deleted
    pub deleted: usize,
    /// Files and folders moved on the remote
    pub renamed: usize,
    /// Remote folders created
    pub folders_created: usize,
    /// Remote folders removed because no local path implies them
    pub folders_pruned: usize,
    /// Item failures, one line each
    pub errors: Vec<String>,
}

impl SyncResult {
    /// Total operations performed
    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.created
            + self.updated
            + self.deleted
            + self.renamed
            + self.folders_created
            + self.folders_pruned
    }

    /// Whether every item succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
