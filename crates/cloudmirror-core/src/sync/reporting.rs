//! Human-readable summaries of ticks and status checks

use std::fmt::Write;

use super::{SyncResult, SyncStatus, TickOutcome};

/// Sync operation reporter
pub struct SyncReporter;

impl SyncReporter {
    /// Generate a summary report
    #[must_use]
    pub fn generate_summary(result: &SyncResult) -> String {
        let mut output = String::new();

        output.push_str("\n=== Sync Summary ===\n");
        let _ = writeln!(output, "Created:  {}", result.created);
        let _ = writeln!(output, "Updated:  {}", result.updated);
        let _ = writeln!(output, "Deleted:  {}", result.deleted);
        let _ = writeln!(output, "Renamed:  {}", result.renamed);
        let _ = writeln!(
            output,
            "Folders:  {} created, {} pruned",
            result.folders_created, result.folders_pruned
        );

        if !result.errors.is_empty() {
            let _ = writeln!(output, "\nErrors ({}):", result.errors.len());
            for error in &result.errors {
                let _ = writeln!(output, "  - {error}");
            }
        }

        let _ = writeln!(output, "\nTotal operations: {}", result.total_operations());

        if result.is_success() {
            output.push_str("Status: ✓ Success\n");
        } else {
            output.push_str("Status: ✗ Completed with errors\n");
        }

        output
    }

    /// One-line description of a tick, for logs
    #[must_use]
    pub fn describe(outcome: &TickOutcome) -> String {
        match outcome {
            TickOutcome::EmptyLocal => "local folder is empty, waiting for files".to_string(),
            TickOutcome::Unchanged => "no changes".to_string(),
            TickOutcome::Initialized(result) => format!(
                "initial sync: {} uploaded, {} removed, {} folders created",
                result.created, result.deleted, result.folders_created
            ),
            TickOutcome::Reconciled(result) => format!(
                "{} created, {} updated, {} deleted, {} renamed, {} error(s)",
                result.created,
                result.updated,
                result.deleted,
                result.renamed,
                result.errors.len()
            ),
        }
    }

    /// Generate a status report
    #[must_use]
    pub fn generate_status(status: &SyncStatus) -> String {
        let mut output = String::new();

        output.push_str("\n=== Mirror Status ===\n");
        let _ = writeln!(output, "Local files:  {}", status.local_files);
        let _ = writeln!(output, "Remote files: {}", status.remote_files);

        let sections = [
            ("Missing on remote", &status.missing_remote),
            ("Only on remote", &status.extra_remote),
            ("Newer locally", &status.newer_local),
        ];
        for (title, paths) in sections {
            if paths.is_empty() {
                continue;
            }
            let _ = writeln!(output, "\n{title} ({}):", paths.len());
            for path in paths {
                let _ = writeln!(output, "  {path}");
            }
        }

        if status.is_in_sync() {
            output.push_str("\nStatus: ✓ In sync\n");
        } else {
            output.push_str("\nStatus: ✗ Out of sync\n");
        }

        output
    }
}
