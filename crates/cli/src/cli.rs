//! Command-line surface for a capture/replay session.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use webstash_client::browser;
use webstash_core::{AppConfig, CaptureMode};

/// Visit URLs through the on-disk caching proxy.
///
/// With a warm cache, `--offline` replays an earlier session without any
/// network egress.
#[derive(Debug, Parser)]
#[command(name = "webstash")]
#[command(about = "Transparent on-disk cache for browser sessions", long_about = None)]
pub struct Cli {
    /// URLs to visit, in order.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Abort uncached requests instead of letting them reach the network.
    #[arg(long)]
    pub offline: bool,

    /// Directory holding stored responses.
    #[arg(long)]
    pub files_dir: Option<PathBuf>,

    /// Run with a visible browser window.
    #[arg(long)]
    pub headed: bool,

    /// Navigation timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl Cli {
    /// Merge CLI overrides into the layered configuration.
    fn into_config(self) -> Result<(AppConfig, Vec<String>)> {
        let mut config = AppConfig::load().context("failed to load configuration")?;

        if self.offline {
            config.mode = CaptureMode::Offline;
        }
        if let Some(dir) = self.files_dir {
            config.files_dir = dir;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if self.headed {
            config.headless = false;
        }
        config.validate().context("invalid configuration")?;

        Ok((config, self.urls))
    }
}

/// Run the session: one page per URL, each with its own proxy instance.
pub async fn run(args: Cli) -> Result<()> {
    let (config, urls) = args.into_config()?;
    tracing::info!(mode = ?config.mode, files_dir = %config.files_dir.display(), "starting session");

    let (mut browser, drain) = browser::launch(&config).await.context("failed to launch browser")?;

    let mut failures = 0usize;
    for url in &urls {
        match browser::visit(&browser, &config, url).await {
            Ok(()) => tracing::info!(url = %url, "visit complete"),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "visit failed");
                failures += 1;
            }
        }
    }

    browser.close().await.ok();
    drain.await.ok();

    if failures > 0 {
        anyhow::bail!("{failures} of {} visits failed", urls.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_flag_overrides_mode() {
        let args = Cli::parse_from(["webstash", "--offline", "https://example.com/"]);
        let (config, urls) = args.into_config().unwrap();
        assert_eq!(config.mode, CaptureMode::Offline);
        assert_eq!(urls, vec!["https://example.com/".to_string()]);
    }

    #[test]
    fn test_files_dir_override() {
        let args = Cli::parse_from(["webstash", "--files-dir", "/tmp/stash", "https://example.com/"]);
        let (config, _) = args.into_config().unwrap();
        assert_eq!(config.files_dir, PathBuf::from("/tmp/stash"));
    }

    #[test]
    fn test_requires_at_least_one_url() {
        assert!(Cli::try_parse_from(["webstash"]).is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let args = Cli::parse_from(["webstash", "--timeout-ms", "10", "https://example.com/"]);
        assert!(args.into_config().is_err());
    }
}
