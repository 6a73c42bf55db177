//! Configuration merging with precedence rules
//!
//! # Merging Semantics
//!
//! - **Scalars** (paths, folder, token, interval, tables' fields): the
//!   highest-precedence layer that sets a value wins
//! - **Arrays** (ignore, include): additive, all layers are combined
//! - **Booleans**: OR semantics, a layer can enable but not disable

use std::fs;
use std::path::Path;

use tracing::debug;

use super::discovery::ConfigFiles;
use super::types::{CliOverrides, FileConfig, PacingConfig, RetryConfig};
use crate::error::{ConfigError, ConfigResult};

/// Configuration merger
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge discovered config files
    ///
    /// Precedence order (highest to lowest):
    /// 1. `--config`
    /// 2. `cloudmirror.toml`
    /// 3. Global config
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read or parsed.
    pub fn merge(files: &ConfigFiles) -> ConfigResult<FileConfig> {
        let mut merged = FileConfig::default();

        for path in [&files.global, &files.project, &files.cli].into_iter().flatten() {
            let layer = Self::load(path)?;
            debug!(path = %path.display(), "Merging config file");
            Self::merge_layer(&mut merged, layer);
        }

        Ok(merged)
    }

    /// Read and parse one config file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> ConfigResult<FileConfig> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge `layer` over `base`
    pub fn merge_layer(base: &mut FileConfig, layer: FileConfig) {
        overlay(&mut base.local_path, layer.local_path);
        overlay(&mut base.remote_folder, layer.remote_folder);
        overlay(&mut base.token, layer.token);
        overlay(&mut base.sync_interval, layer.sync_interval);
        overlay(&mut base.log_file, layer.log_file);
        overlay(&mut base.api_url, layer.api_url);
        overlay(&mut base.identity, layer.identity);

        base.ignore.extend(layer.ignore);
        base.include.extend(layer.include);
        base.follow_symlinks |= layer.follow_symlinks;

        merge_retry(&mut base.retry, layer.retry);
        merge_pacing(&mut base.pacing, layer.pacing);
    }

    /// Apply command-line values over the merged files
    pub fn apply_overrides(base: &mut FileConfig, overrides: &CliOverrides) {
        overlay(&mut base.local_path, overrides.local_path.clone());
        overlay(&mut base.remote_folder, overrides.remote_folder.clone());
        overlay(&mut base.sync_interval, overrides.sync_interval);
        overlay(&mut base.log_file, overrides.log_file.clone());
        overlay(&mut base.token, overrides.token.clone());
    }
}

fn overlay<T>(base: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *base = value;
    }
}

fn merge_retry(base: &mut RetryConfig, layer: RetryConfig) {
    overlay(&mut base.listing_attempts, layer.listing_attempts);
    overlay(&mut base.initial_listing_attempts, layer.initial_listing_attempts);
    overlay(&mut base.upload_attempts, layer.upload_attempts);
    overlay(&mut base.listing_backoff_secs, layer.listing_backoff_secs);
    overlay(&mut base.upload_backoff_secs, layer.upload_backoff_secs);
}

fn merge_pacing(base: &mut PacingConfig, layer: PacingConfig) {
    overlay(&mut base.item_pause_ms, layer.item_pause_ms);
    overlay(&mut base.step_pause_ms, layer.step_pause_ms);
    overlay(&mut base.after_wipe_ms, layer.after_wipe_ms);
    overlay(&mut base.after_bulk_upload_ms, layer.after_bulk_upload_ms);
}
