use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

use cloudmirror_core::config::{ConfigDiscovery, Settings};
use cloudmirror_core::remote::RetryPolicy;
use cloudmirror_yandex::DEFAULT_API_URL;

use crate::commands::common::CommandOptions;

pub struct Config;

impl Config {
    pub fn execute(options: &CommandOptions) -> anyhow::Result<()> {
        let settings = options.load_settings()?;
        let files = ConfigDiscovery::discover(options.config_path)?;

        let sources: Vec<&Path> = [&files.global, &files.project, &files.cli]
            .into_iter()
            .flatten()
            .map(|p| p.as_path())
            .collect();

        println!("{}", Self::render(&settings, &sources));
        Ok(())
    }

    fn render(settings: &Settings, sources: &[&Path]) -> String {
        let mut out = String::new();
        let list = |items: &[String]| {
            if items.is_empty() {
                "(none)".to_string()
            } else {
                items.join(", ")
            }
        };
        let policy = |p: &RetryPolicy| format!("{} attempts, +{}s backoff", p.max_attempts, p.step.as_secs());
        let ms = |d: Duration| format!("{}ms", d.as_millis());

        out.push_str("=== Configuration ===\n");
        let _ = writeln!(out, "Local path:      {}", settings.local_path.display());
        let _ = writeln!(out, "Remote folder:   {}", settings.remote_folder);
        let _ = writeln!(out, "Token:           {}", settings.masked_token());
        let _ = writeln!(out, "Sync interval:   {}s", settings.sync_interval.as_secs());
        let _ = writeln!(
            out,
            "Log file:        {}",
            settings
                .log_file
                .as_ref()
                .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
        );
        let _ = writeln!(
            out,
            "API URL:         {}",
            settings.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
        );
        let _ = writeln!(out, "Rename identity: {}", settings.identity);
        let _ = writeln!(out, "Ignore:          {}", list(&settings.ignore));
        let _ = writeln!(out, "Include:         {}", list(&settings.include));
        let _ = writeln!(out, "Follow symlinks: {}", settings.follow_symlinks);

        out.push_str("\nRetry:\n");
        let _ = writeln!(out, "  listing:         {}", policy(&settings.retry.listing));
        let _ = writeln!(out, "  initial listing: {}", policy(&settings.retry.initial_listing));
        let _ = writeln!(out, "  upload:          {}", policy(&settings.retry.upload));

        out.push_str("\nPacing:\n");
        let _ = writeln!(out, "  per item:          {}", ms(settings.pacing.item));
        let _ = writeln!(out, "  between steps:     {}", ms(settings.pacing.step));
        let _ = writeln!(out, "  after wipe:        {}", ms(settings.pacing.after_wipe));
        let _ = writeln!(out, "  after bulk upload: {}", ms(settings.pacing.after_bulk_upload));

        out.push_str("\nConfig files (lowest to highest precedence):\n");
        if sources.is_empty() {
            out.push_str("  (none)\n");
        }
        for source in sources {
            let _ = writeln!(out, "  {}", source.display());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudmirror_core::config::{CliOverrides, ConfigManager};
    use tempfile::TempDir;

    #[test]
    fn test_render_masks_token() {
        let tmp = TempDir::new().unwrap();
        let config_file = tmp.path().join("config.toml");
        std::fs::write(&config_file, "ignore = [\"*.tmp\"]\n").unwrap();

        let overrides = CliOverrides {
            local_path: Some(tmp.path().to_path_buf()),
            remote_folder: Some("Mirror".into()),
            token: Some("y0_AgAAAAsecretvalue".into()),
            ..CliOverrides::default()
        };
        let settings = ConfigManager::load(Some(&config_file), &overrides).unwrap();

        let rendered = Config::render(&settings, &[config_file.as_path()]);
        assert!(rendered.contains("Remote folder:   Mirror"));
        assert!(rendered.contains("y0_A********"));
        assert!(!rendered.contains("secretvalue"));
        assert!(rendered.contains("Ignore:          *.tmp"));
        assert!(rendered.contains("upload:          3 attempts, +2s backoff"));
        assert!(rendered.contains(&config_file.display().to_string()));
    }
}
