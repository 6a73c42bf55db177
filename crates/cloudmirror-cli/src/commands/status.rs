use anyhow::Context;
use cloudmirror_core::sync::SyncReporter;

use crate::commands::common::{self, CommandOptions};

pub struct Status;

impl Status {
    pub fn execute(options: &CommandOptions) -> anyhow::Result<()> {
        let settings = options.load_settings_with_logging()?;
        let client = common::connect(&settings)?;
        let orchestrator = common::orchestrator(&settings, client)?;

        let status = orchestrator.status().context("Failed to compare with remote")?;
        println!("{}", SyncReporter::generate_status(&status));
        Ok(())
    }
}
