//! Configuration validation and resolution into [`Settings`]

use std::time::Duration;

use super::patterns::PatternMatcher;
use super::types::{FileConfig, PacingConfig, RetryConfig, Settings};
use crate::error::{ConfigError, ConfigResult};
use crate::remote::{Pacing, RetryPolicies, RetryPolicy};

/// Seconds between ticks when nothing else is configured
pub const DEFAULT_SYNC_INTERVAL: u64 = 60;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a merged configuration and resolve it
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a missing required field, a local
    /// folder that does not exist, a malformed remote folder, a zero
    /// interval or attempt count, or a pattern that does not compile.
    pub fn validate(config: FileConfig) -> ConfigResult<Settings> {
        let local_path = config
            .local_path
            .ok_or(ConfigError::MissingField("local_path"))?;
        if !local_path.is_dir() {
            return Err(ConfigError::LocalPathMissing(local_path));
        }
        let local_path = dunce::canonicalize(&local_path)
            .map_err(|_| ConfigError::LocalPathMissing(local_path))?;

        let remote_folder = config
            .remote_folder
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .ok_or(ConfigError::MissingField("remote_folder"))?;
        if remote_folder.starts_with('/') || remote_folder.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "remote_folder must not start or end with '/': {remote_folder}"
            )));
        }

        let token = config
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingField("token"))?;

        let interval = config.sync_interval.unwrap_or(DEFAULT_SYNC_INTERVAL);
        if interval == 0 {
            return Err(ConfigError::Invalid(
                "sync_interval must be greater than zero".to_string(),
            ));
        }

        for pattern in config.ignore.iter().chain(&config.include) {
            if pattern.trim().is_empty() {
                return Err(ConfigError::Invalid("Patterns cannot be empty".to_string()));
            }
        }
        PatternMatcher::with_patterns(&config.ignore, &config.include)?;

        Ok(Settings {
            local_path,
            remote_folder,
            token,
            sync_interval: Duration::from_secs(interval),
            log_file: config.log_file,
            api_url: config.api_url,
            identity: config.identity.unwrap_or_default(),
            ignore: config.ignore,
            include: config.include,
            follow_symlinks: config.follow_symlinks,
            retry: Self::retry(&config.retry)?,
            pacing: Self::pacing(&config.pacing),
        })
    }

    fn retry(config: &RetryConfig) -> ConfigResult<RetryPolicies> {
        let defaults = RetryPolicies::default();
        let policy = |attempts: Option<u32>, backoff: Option<u64>, default: RetryPolicy, name: &str| {
            let max_attempts = attempts.unwrap_or(default.max_attempts);
            if max_attempts == 0 {
                return Err(ConfigError::Invalid(format!("retry.{name} must be at least 1")));
            }
            let step = backoff.map_or(default.step, Duration::from_secs);
            Ok(RetryPolicy::linear(max_attempts, step))
        };

        Ok(RetryPolicies {
            listing: policy(
                config.listing_attempts,
                config.listing_backoff_secs,
                defaults.listing,
                "listing_attempts",
            )?,
            initial_listing: policy(
                config.initial_listing_attempts,
                config.listing_backoff_secs,
                defaults.initial_listing,
                "initial_listing_attempts",
            )?,
            upload: policy(
                config.upload_attempts,
                config.upload_backoff_secs,
                defaults.upload,
                "upload_attempts",
            )?,
        })
    }

    fn pacing(config: &PacingConfig) -> Pacing {
        let defaults = Pacing::default();
        let ms = |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_millis);
        Pacing {
            item: ms(config.item_pause_ms, defaults.item),
            step: ms(config.step_pause_ms, defaults.step),
            after_wipe: ms(config.after_wipe_ms, defaults.after_wipe),
            after_bulk_upload: ms(config.after_bulk_upload_ms, defaults.after_bulk_upload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::IdentityKind;
    use tempfile::TempDir;

    fn valid(tmp: &TempDir) -> FileConfig {
        FileConfig {
            local_path: Some(tmp.path().to_path_buf()),
            remote_folder: Some("Mirror".into()),
            token: Some("secret".into()),
            ..FileConfig::default()
        }
    }

    #[test]
    fn test_validate_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = ConfigValidator::validate(valid(&tmp)).unwrap();

        assert_eq!(settings.local_path, dunce::canonicalize(tmp.path()).unwrap());
        assert_eq!(settings.sync_interval, Duration::from_secs(60));
        assert_eq!(settings.identity, IdentityKind::Metadata);
        assert_eq!(settings.retry, RetryPolicies::default());
        assert_eq!(settings.pacing, Pacing::default());
    }

    #[test]
    fn test_validate_missing_fields() {
        let tmp = TempDir::new().unwrap();

        let mut config = valid(&tmp);
        config.local_path = None;
        assert!(matches!(
            ConfigValidator::validate(config),
            Err(ConfigError::MissingField("local_path"))
        ));

        let mut config = valid(&tmp);
        config.remote_folder = Some("  ".into());
        assert!(matches!(
            ConfigValidator::validate(config),
            Err(ConfigError::MissingField("remote_folder"))
        ));

        let mut config = valid(&tmp);
        config.token = None;
        assert!(matches!(
            ConfigValidator::validate(config),
            Err(ConfigError::MissingField("token"))
        ));
    }

    #[test]
    fn test_validate_local_path_must_exist() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid(&tmp);
        config.local_path = Some(tmp.path().join("missing"));

        assert!(matches!(
            ConfigValidator::validate(config),
            Err(ConfigError::LocalPathMissing(_))
        ));
    }

    #[test]
    fn test_validate_local_path_must_be_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let mut config = valid(&tmp);
        config.local_path = Some(file);

        assert!(matches!(
            ConfigValidator::validate(config),
            Err(ConfigError::LocalPathMissing(_))
        ));
    }

    #[test]
    fn test_validate_remote_folder_slashes() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid(&tmp);
        config.remote_folder = Some("/Mirror".into());

        let err = ConfigValidator::validate(config).unwrap_err();
        assert!(err.to_string().contains("must not start or end with '/'"));
    }

    #[test]
    fn test_validate_zero_interval() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid(&tmp);
        config.sync_interval = Some(0);

        let err = ConfigValidator::validate(config).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_validate_empty_pattern() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid(&tmp);
        config.ignore.push("   ".to_string());

        let err = ConfigValidator::validate(config).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_retry_and_pacing_tables() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid(&tmp);
        config.retry.upload_attempts = Some(6);
        config.retry.listing_backoff_secs = Some(1);
        config.pacing.item_pause_ms = Some(0);

        let settings = ConfigValidator::validate(config).unwrap();
        assert_eq!(settings.retry.upload, RetryPolicy::linear(6, Duration::from_secs(2)));
        assert_eq!(settings.retry.listing, RetryPolicy::linear(3, Duration::from_secs(1)));
        assert_eq!(
            settings.retry.initial_listing,
            RetryPolicy::linear(5, Duration::from_secs(1))
        );
        assert_eq!(settings.pacing.item, Duration::ZERO);
        assert_eq!(settings.pacing.step, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_zero_attempts() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid(&tmp);
        config.retry.listing_attempts = Some(0);

        let err = ConfigValidator::validate(config).unwrap_err();
        assert!(err.to_string().contains("retry.listing_attempts"));
    }
}
