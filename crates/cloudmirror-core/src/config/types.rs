//! Configuration types and structures

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::remote::{Pacing, RetryPolicies};

/// How a disappeared file is recognised under a new name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Size and modification time
    #[default]
    Metadata,
    /// SHA-256 of the content
    Sha256,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("metadata"),
            Self::Sha256 => f.write_str("sha256"),
        }
    }
}

/// `[retry]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts for listings during incremental ticks
    pub listing_attempts: Option<u32>,
    /// Attempts for listings during initial synchronization
    pub initial_listing_attempts: Option<u32>,
    /// Attempts per file upload
    pub upload_attempts: Option<u32>,
    /// Backoff step for listings, in seconds
    pub listing_backoff_secs: Option<u64>,
    /// Backoff step for uploads, in seconds
    pub upload_backoff_secs: Option<u64>,
}

/// `[pacing]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacingConfig {
    /// Pause before each rename, in milliseconds
    pub item_pause_ms: Option<u64>,
    /// Pause between reconciliation steps, in milliseconds
    pub step_pause_ms: Option<u64>,
    /// Pause after the initial wipe, in milliseconds
    pub after_wipe_ms: Option<u64>,
    /// Pause after the initial bulk upload, in milliseconds
    pub after_bulk_upload_ms: Option<u64>,
}

/// One configuration layer as written in a TOML file
///
/// Every scalar is optional so that layers can be merged; [`Settings`] is
/// the resolved form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Local directory to mirror
    pub local_path: Option<PathBuf>,
    /// Folder on the remote that receives the mirror
    pub remote_folder: Option<String>,
    /// Access token for the remote store
    pub token: Option<String>,
    /// Seconds between the end of one tick and the start of the next
    pub sync_interval: Option<u64>,
    /// File that receives a copy of the log
    pub log_file: Option<PathBuf>,
    /// Override of the remote API endpoint
    pub api_url: Option<String>,
    /// Rename identity function
    pub identity: Option<IdentityKind>,
    /// Patterns to ignore (exclude from sync)
    pub ignore: Vec<String>,
    /// Patterns to explicitly include (override ignores)
    pub include: Vec<String>,
    /// Follow symlinks while scanning
    pub follow_symlinks: bool,
    /// Retry settings
    pub retry: RetryConfig,
    /// Pacing settings
    pub pacing: PacingConfig,
}

/// Values given on the command line, applied over every file layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--local-path`
    pub local_path: Option<PathBuf>,
    /// `--remote-folder`
    pub remote_folder: Option<String>,
    /// `--interval`
    pub sync_interval: Option<u64>,
    /// `--log-file`
    pub log_file: Option<PathBuf>,
    /// `--token`
    pub token: Option<String>,
}

/// Fully resolved and validated configuration
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Canonical local root
    pub local_path: PathBuf,
    /// Remote folder, without surrounding slashes
    pub remote_folder: String,
    /// Access token
    pub token: String,
    /// Pause between ticks
    pub sync_interval: Duration,
    /// Optional log file
    pub log_file: Option<PathBuf>,
    /// Optional API endpoint override
    pub api_url: Option<String>,
    /// Rename identity function
    pub identity: IdentityKind,
    /// Ignore patterns
    pub ignore: Vec<String>,
    /// Include patterns
    pub include: Vec<String>,
    /// Follow symlinks while scanning
    pub follow_symlinks: bool,
    /// Retry policies for remote calls
    pub retry: RetryPolicies,
    /// Pauses between remote mutations
    pub pacing: Pacing,
}

impl Settings {
    /// Token with everything but its first four characters hidden
    #[must_use]
    pub fn masked_token(&self) -> String {
        mask(&self.token)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("local_path", &self.local_path)
            .field("remote_folder", &self.remote_folder)
            .field("token", &self.masked_token())
            .field("sync_interval", &self.sync_interval)
            .field("log_file", &self.log_file)
            .field("api_url", &self.api_url)
            .field("identity", &self.identity)
            .field("ignore", &self.ignore)
            .field("include", &self.include)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("retry", &self.retry)
            .field("pacing", &self.pacing)
            .finish()
    }
}

fn mask(token: &str) -> String {
    if token.chars().count() <= 8 {
        return "********".to_string();
    }
    let visible: String = token.chars().take(4).collect();
    format!("{visible}********")
}
