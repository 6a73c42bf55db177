use std::thread;

use anyhow::Context;
use cloudmirror_core::sync::{SyncReporter, TickOutcome};
use tracing::{error, info};

use crate::commands::common::{self, CommandOptions};

pub struct Run;

impl Run {
    pub fn execute(once: bool, options: &CommandOptions) -> anyhow::Result<()> {
        let settings = options.load_settings_with_logging()?;
        let client = common::connect(&settings)?;
        let mut orchestrator = common::orchestrator(&settings, client)?;

        if once {
            let outcome = orchestrator.tick().context("Synchronization failed")?;
            info!("{}", SyncReporter::describe(&outcome));
            if let TickOutcome::Initialized(result) | TickOutcome::Reconciled(result) = &outcome {
                println!("{}", SyncReporter::generate_summary(result));
                if !result.is_success() {
                    anyhow::bail!("{} item(s) failed to synchronize", result.errors.len());
                }
            }
            return Ok(());
        }

        info!(
            local = %settings.local_path.display(),
            remote = %settings.remote_folder,
            interval_secs = settings.sync_interval.as_secs(),
            "Starting synchronization loop"
        );

        loop {
            match orchestrator.tick() {
                Ok(outcome) => info!("{}", SyncReporter::describe(&outcome)),
                Err(e) => error!(error = %e, "Synchronization tick failed"),
            }
            thread::sleep(settings.sync_interval);
        }
    }
}
