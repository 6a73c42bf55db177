use clap::{Parser, Subcommand};
use cloudmirror_core::config::CliOverrides;
use std::path::PathBuf;

/// Cloud Mirror
///
/// Keep a folder on Yandex Disk mirroring a local directory tree. The local
/// side is authoritative: remote changes are overwritten on the next tick.
#[derive(Parser, Debug)]
#[command(name = "cloudmirror")]
#[command(about, long_about = None, version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use specific config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Local directory to mirror
    #[arg(long, global = true, value_name = "PATH")]
    pub local_path: Option<PathBuf>,

    /// Remote folder that receives the mirror
    #[arg(long, global = true, value_name = "FOLDER")]
    pub remote_folder: Option<String>,

    /// Seconds between synchronization ticks
    #[arg(long, global = true, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Also write the log to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Yandex Disk OAuth token
    #[arg(long, global = true, env = "CLOUDMIRROR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Values that override every config file
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            local_path: self.local_path.clone(),
            remote_folder: self.remote_folder.clone(),
            sync_interval: self.interval,
            log_file: self.log_file.clone(),
            token: self.token.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize continuously until interrupted
    Run {
        /// Run a single tick and exit
        #[arg(long)]
        once: bool,
    },

    /// Compare local and remote without making changes
    Status,

    /// Show the resolved configuration
    Config,
}
