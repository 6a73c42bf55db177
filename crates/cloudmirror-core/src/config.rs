//! Configuration file parsing, merging, and pattern matching
//!
//! This module handles:
//! - Config file discovery (`--config`, `cloudmirror.toml`, global config)
//! - TOML parsing with serde
//! - Layer merging with precedence rules and command-line overrides
//! - Gitignore-style pattern matching
//! - Validation into a resolved [`Settings`]

mod discovery;
mod merge;
mod patterns;
mod types;
mod validation;


pub use discovery::{ConfigDiscovery, ConfigFiles, PROJECT_FILE};
pub use merge::ConfigMerger;
pub use patterns::PatternMatcher;
pub use types::{CliOverrides, FileConfig, IdentityKind, PacingConfig, RetryConfig, Settings};
pub use validation::{ConfigValidator, DEFAULT_SYNC_INTERVAL};

use std::path::Path;

use tracing::debug;

use crate::detector::{ChangeDetector, ContentIdentity, FileIdentity, MetadataIdentity};
use crate::error::ConfigResult;
use crate::scanner::LocalScanner;

/// Coordinates discovery, parsing, merging, and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load, merge and validate configuration from all sources
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is missing, unreadable or invalid,
    /// or if the merged result fails validation.
    pub fn load(cli_config_path: Option<&Path>, overrides: &CliOverrides) -> ConfigResult<Settings> {
        let files = ConfigDiscovery::discover(cli_config_path)?;
        debug!(?files, "Discovered config files");

        let mut merged = ConfigMerger::merge(&files)?;
        ConfigMerger::apply_overrides(&mut merged, overrides);

        ConfigValidator::validate(merged)
    }
}

impl Settings {
    /// Matcher built from the ignore and include patterns
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern does not compile.
    pub fn pattern_matcher(&self) -> ConfigResult<PatternMatcher> {
        PatternMatcher::with_patterns(&self.ignore, &self.include)
    }

    /// Scanner over the local root with the configured filters
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern does not compile.
    pub fn scanner(&self) -> ConfigResult<LocalScanner> {
        Ok(LocalScanner::new(
            &self.local_path,
            self.pattern_matcher()?,
            self.follow_symlinks,
        ))
    }

    /// Change detector using the configured identity function
    #[must_use]
    pub fn detector(&self) -> ChangeDetector {
        let identity: Box<dyn FileIdentity> = match self.identity {
            IdentityKind::Metadata => Box::new(MetadataIdentity::new()),
            IdentityKind::Sha256 => Box::new(ContentIdentity::new()),
        };
        ChangeDetector::new(&self.local_path, identity)
    }
}
