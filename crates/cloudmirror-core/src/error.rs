//! Error taxonomy
//!
//! - [`ConfigError`]: fatal at startup, the process does not start
//! - [`RemoteStoreError`]: raised at the remote-store boundary
//! - [`SyncError`]: raised by the orchestrator when a phase cannot complete

use std::path::PathBuf;

use thiserror::Error;

/// Configuration could not be loaded or is invalid
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file named explicitly does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A config file exists but could not be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A config file is not valid TOML for the expected schema
    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },

    /// A required setting is absent from every layer
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    /// The local root does not exist or is not a directory
    #[error("Local folder {} does not exist", .0.display())]
    LocalPathMissing(PathBuf),

    /// An ignore or include pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern {
        /// Offending pattern
        pattern: String,
        /// Reason reported by the matcher
        message: String,
    },

    /// Any other invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure reported by a remote-store collaborator
#[derive(Error, Debug)]
pub enum RemoteStoreError {
    /// Credential rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credential lacks a required permission
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Remote path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote path conflicts with existing state (e.g. missing parent folder)
    #[error("Conflict at {path}: {message}")]
    Conflict {
        /// Remote path
        path: String,
        /// Message returned by the store
        message: String,
    },

    /// Rate limited by the store
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status
    #[error("Remote store returned {status}: {message}")]
    Status {
        /// HTTP-like status code
        status: u16,
        /// Message returned by the store
        message: String,
    },

    /// Network-level failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Local I/O failure while preparing a request
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Optional capability not offered by this store
    #[error("Operation not supported by the remote store: {0}")]
    Unsupported(&'static str),
}

impl RemoteStoreError {
    /// Whether retrying the same call may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited(_) | Self::Malformed(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::NotFound(_)
            | Self::Conflict { .. }
            | Self::Io(_)
            | Self::Unsupported(_) => false,
        }
    }
}

/// A synchronization phase could not complete
#[derive(Error, Debug)]
pub enum SyncError {
    /// Remote enumeration failed on every attempt
    #[error("Failed to list remote files after {attempts} attempt(s): {source}")]
    Listing {
        /// Attempts made
        attempts: u32,
        /// Last error
        source: RemoteStoreError,
    },

    /// Upload failed on every attempt
    #[error("Failed to upload {path} after {attempts} attempt(s): {source}")]
    Upload {
        /// Relative path
        path: String,
        /// Attempts made
        attempts: u32,
        /// Last error
        source: RemoteStoreError,
    },

    /// Destructive wipe of the remote could not delete an entry
    #[error("Failed to clean remote storage: could not delete {path}: {source}")]
    Wipe {
        /// Relative path
        path: String,
        /// Underlying error
        source: RemoteStoreError,
    },

    /// A remote folder could not be created
    #[error("Failed to create remote folder {path}: {source}")]
    CreateFolder {
        /// Relative path
        path: String,
        /// Underlying error
        source: RemoteStoreError,
    },

    /// Local file metadata could not be read
    #[error("Failed to read local file {}: {source}", .path.display())]
    LocalRead {
        /// Absolute path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Post-initial-sync validation found local files absent remotely
    #[error("{} file(s) missing from remote after sync: {}", .missing.len(), .missing.join(", "))]
    Incomplete {
        /// Missing relative paths, sorted
        missing: Vec<String>,
    },
}

/// Result alias for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for remote-store calls
pub type RemoteResult<T> = std::result::Result<T, RemoteStoreError>;

/// Result alias for synchronization phases
pub type Result<T> = std::result::Result<T, SyncError>;
