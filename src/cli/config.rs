use anyhow::{Context, Result};

use crate::cli::flags::{Cli, Command};
use crate::config::{apply_feed_filter, load_config, AppConfig};
use crate::core::output::OutputFormat;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub app: AppConfig,
    pub format: OutputFormat,
    pub once: bool,
}

/// Merge CLI overrides onto the file (or default) configuration and validate the result.
pub fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let cfg = load_config(cli.config.as_deref()).context("loading configuration")?;
    resolve_with(cli, cfg)
}

pub fn resolve_with(cli: &Cli, cfg: AppConfig) -> Result<RunConfig> {
    let mut app = apply_feed_filter(cfg, cli.feeds.as_deref());
    if let Some(secs) = cli.normal_interval {
        app.normal_interval_secs = secs;
    }
    if let Some(secs) = cli.incident_interval {
        app.incident_interval_secs = secs;
    }
    let once = match &cli.command {
        Command::Watch { max_run } => {
            if max_run.is_some() {
                app.max_run_secs = *max_run;
            }
            false
        }
        Command::Once => true,
    };
    app.validate().context("invalid configuration")?;

    Ok(RunConfig {
        app,
        format: cli.format.into(),
        once,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::parse_from([
            "statuswatch",
            "watch",
            "--max-run",
            "120",
            "--incident-interval",
            "10",
            "--format",
            "jsonl",
        ]);
        let run = resolve_with(&cli, AppConfig::default()).unwrap();
        assert!(!run.once);
        assert_eq!(run.format, OutputFormat::Jsonl);
        assert_eq!(run.app.max_run_secs, Some(120));
        assert_eq!(run.app.incident_interval_secs, 10);
        assert_eq!(run.app.normal_interval_secs, 60);
    }

    #[test]
    fn inverted_intervals_are_rejected() {
        let cli = Cli::parse_from(["statuswatch", "once", "--normal-interval", "5"]);
        assert!(resolve_with(&cli, AppConfig::default()).is_err());
    }
}
