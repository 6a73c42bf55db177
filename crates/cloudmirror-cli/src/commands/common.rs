//! Common types and utilities for command execution

use std::path::Path;

use anyhow::Context;
use cloudmirror_core::config::{CliOverrides, ConfigManager, Settings};
use cloudmirror_core::remote::RemoteOperations;
use cloudmirror_core::sync::SyncOrchestrator;
use cloudmirror_yandex::YandexDiskClient;
use tracing::info;

use crate::logging;

/// Execution options shared by every command
pub struct CommandOptions<'a> {
    /// Enable verbose output
    pub verbose: bool,
    /// Path to custom config file
    pub config_path: Option<&'a Path>,
    /// Values given on the command line
    pub overrides: CliOverrides,
}

impl<'a> CommandOptions<'a> {
    /// Create new command options
    #[must_use]
    pub const fn new(verbose: bool, config_path: Option<&'a Path>, overrides: CliOverrides) -> Self {
        Self {
            verbose,
            config_path,
            overrides,
        }
    }

    /// Load and validate settings from every source
    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        ConfigManager::load(self.config_path, &self.overrides).context("Failed to load configuration")
    }

    /// Load settings and install logging according to them
    pub fn load_settings_with_logging(&self) -> anyhow::Result<Settings> {
        let settings = self.load_settings()?;
        logging::init(self.verbose, settings.log_file.as_deref())?;
        Ok(settings)
    }
}

/// Connect to the remote store and verify access
pub fn connect(settings: &Settings) -> anyhow::Result<YandexDiskClient> {
    let client = YandexDiskClient::new(
        settings.token.clone(),
        settings.remote_folder.clone(),
        settings.api_url.as_deref(),
    )
    .context("Failed to create Yandex Disk client")?;

    client
        .check_connection()
        .context("Failed to connect to Yandex Disk")?;
    info!(folder = %settings.remote_folder, "Connected to Yandex Disk");

    Ok(client)
}

/// Orchestrator wired from settings and a connected store
pub fn orchestrator(
    settings: &Settings,
    client: YandexDiskClient,
) -> anyhow::Result<SyncOrchestrator<YandexDiskClient>> {
    let scanner = settings.scanner().context("Invalid ignore or include patterns")?;
    let remote = RemoteOperations::new(client, &settings.local_path, settings.retry, settings.pacing);
    Ok(SyncOrchestrator::new(scanner, remote, settings.detector()))
}
