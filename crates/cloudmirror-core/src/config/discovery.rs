//! Configuration file discovery from multiple locations

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// File name searched for in the working directory and its ancestors
pub const PROJECT_FILE: &str = "cloudmirror.toml";

/// Configuration file locations in order of precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFiles {
    /// Config from `--config` (highest precedence)
    pub cli: Option<PathBuf>,
    /// `cloudmirror.toml` in the working directory or an ancestor
    pub project: Option<PathBuf>,
    /// Global config under the user's config directory
    pub global: Option<PathBuf>,
}

/// Config file discovery
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover all available configuration files
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `cli_path` is given but is not a
    /// file. Missing project and global files are simply skipped.
    pub fn discover(cli_path: Option<&Path>) -> ConfigResult<ConfigFiles> {
        let cli = match cli_path {
            Some(p) if p.is_file() => Some(p.to_path_buf()),
            Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
            None => None,
        };

        let project = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::find_in_ancestors(&cwd, PROJECT_FILE));

        Ok(ConfigFiles {
            cli,
            project,
            global: Self::find_global_config(),
        })
    }

    /// Find `name` in `start` or the nearest ancestor that has it
    #[must_use]
    pub fn find_in_ancestors(start: &Path, name: &str) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Path of the global config, whether or not it exists
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cloudmirror").join("config.toml"))
    }

    fn find_global_config() -> Option<PathBuf> {
        Self::global_config_path().filter(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_cli_config() {
        let tmp = TempDir::new().unwrap();
        let cli_config = tmp.path().join("custom.toml");
        fs::write(&cli_config, "# config").unwrap();

        let files = ConfigDiscovery::discover(Some(&cli_config)).unwrap();
        assert_eq!(files.cli, Some(cli_config));
    }

    #[test]
    fn test_discover_cli_config_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nonexistent.toml");

        let result = ConfigDiscovery::discover(Some(&missing));
        assert!(matches!(result, Err(ConfigError::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_find_in_ancestors() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("a").join(PROJECT_FILE), "").unwrap();

        let found = ConfigDiscovery::find_in_ancestors(&nested, PROJECT_FILE);
        assert_eq!(found, Some(tmp.path().join("a").join(PROJECT_FILE)));
    }

    #[test]
    fn test_find_in_ancestors_prefers_nearest() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join(PROJECT_FILE), "").unwrap();
        fs::write(nested.join(PROJECT_FILE), "").unwrap();

        let found = ConfigDiscovery::find_in_ancestors(&nested, PROJECT_FILE);
        assert_eq!(found, Some(nested.join(PROJECT_FILE)));
    }

    #[test]
    fn test_global_config_location() {
        if let Some(path) = ConfigDiscovery::global_config_path() {
            assert!(path.ends_with("cloudmirror/config.toml"));
        }
    }
}
