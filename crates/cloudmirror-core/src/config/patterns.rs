//! Gitignore-style pattern matching using the ignore crate

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{ConfigError, ConfigResult};

/// Pattern matcher for file inclusion/exclusion
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    gitignore: Option<Gitignore>,
}

impl PatternMatcher {
    /// Matcher that includes everything
    #[must_use]
    pub const fn new() -> Self {
        Self { gitignore: None }
    }

    /// Build pattern matcher from ignore and include patterns
    ///
    /// Include patterns are added as negated ignores, so they re-include
    /// paths an earlier ignore pattern excluded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pattern`] if a pattern does not compile.
    pub fn with_patterns(ignore_patterns: &[String], include_patterns: &[String]) -> ConfigResult<Self> {
        let mut builder = GitignoreBuilder::new("");

        for pattern in ignore_patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| pattern_error(pattern, &e))?;
        }

        for pattern in include_patterns {
            builder
                .add_line(None, &format!("!{pattern}"))
                .map_err(|e| pattern_error(pattern, &e))?;
        }

        let gitignore = builder.build().map_err(|e| ConfigError::Pattern {
            pattern: ignore_patterns.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            gitignore: Some(gitignore),
        })
    }

    /// Check if a path relative to the root should be included
    #[must_use]
    pub fn should_include(&self, path: &Path, is_dir: bool) -> bool {
        self.gitignore
            .as_ref()
            .is_none_or(|gi| !gi.matched(path, is_dir).is_ignore())
    }
}

fn pattern_error(pattern: &str, err: &ignore::Error) -> ConfigError {
    ConfigError::Pattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    }
}
