//! Identity functions used to pair a disappeared path with an appeared one

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::scanner::stat_file;
use crate::snapshot::{LocalEntry, RemoteEntry};

/// Comparable identity of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Size and modification time
    Metadata {
        /// Size in bytes
        size: u64,
        /// Modification time
        modified: SystemTime,
    },
    /// Lowercase hex content digest
    Digest(String),
}

/// Computes identities for rename pairing
///
/// Two paths are considered the same file when both identities are present
/// and equal. Returning `None` on either side classifies the pair as a
/// delete plus an add.
pub trait FileIdentity {
    /// Identity of a path that disappeared locally, from its baseline entry
    /// and the remote entry still stored under that path
    fn previous(&self, baseline: &LocalEntry, remote: &RemoteEntry) -> Option<Identity>;

    /// Identity of a path that appeared locally, read from disk
    fn current(&self, path: &Path) -> Option<Identity>;
}

/// `(size, modification time)` signature
///
/// Cheap, but can pair unrelated files that happen to share both values, and
/// cannot see a rename combined with a content edit.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataIdentity;

impl MetadataIdentity {
    /// Create the metadata identity function
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileIdentity for MetadataIdentity {
    fn previous(&self, baseline: &LocalEntry, _remote: &RemoteEntry) -> Option<Identity> {
        Some(Identity::Metadata {
            size: baseline.size,
            modified: baseline.modified,
        })
    }

    fn current(&self, path: &Path) -> Option<Identity> {
        stat_file(path).map(|entry| Identity::Metadata {
            size: entry.size,
            modified: entry.modified,
        })
    }
}

/// SHA-256 of the appeared file against the digest the remote reports
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentIdentity;

impl ContentIdentity {
    /// Create the content identity function
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Stream a file through SHA-256
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn hash_file(path: &Path) -> std::io::Result<String> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut hasher = Sha256::new();
        let mut buffer = [0; 8192];

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl FileIdentity for ContentIdentity {
    fn previous(&self, _baseline: &LocalEntry, remote: &RemoteEntry) -> Option<Identity> {
        remote
            .sha256
            .as_ref()
            .map(|digest| Identity::Digest(digest.to_ascii_lowercase()))
    }

    fn current(&self, path: &Path) -> Option<Identity> {
        match Self::hash_file(path) {
            Ok(digest) => Some(Identity::Digest(digest)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot hash file");
                None
            }
        }
    }
}
