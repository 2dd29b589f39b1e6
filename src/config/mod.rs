use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::core::error::MonitorError;
use crate::pipeline::scheduler::PollConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/statuswatch.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Statuspage API root, e.g. `https://<page>.statuspage.io/api/v2`.
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
    pub normal_interval_secs: u64,
    pub incident_interval_secs: u64,
    pub max_run_secs: Option<u64>,
    pub feeds: Vec<FeedConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        default_config()
    }
}

impl AppConfig {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            normal_interval: Duration::from_secs(self.normal_interval_secs),
            incident_interval: Duration::from_secs(self.incident_interval_secs),
            max_run: self.max_run_secs.map(Duration::from_secs),
        }
    }

    pub fn enabled_feeds(&self) -> impl Iterator<Item = &FeedConfig> {
        self.feeds.iter().filter(|f| f.enabled)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.poll_config().validate()?;
        if self.timeout_ms == 0 {
            return Err(MonitorError::Config("timeout_ms must be greater than zero".into()));
        }
        if self.enabled_feeds().next().is_none() {
            return Err(MonitorError::Config("no feeds enabled".into()));
        }
        for feed in self.enabled_feeds() {
            if feed.base_url.trim().is_empty() {
                return Err(MonitorError::Config(format!(
                    "feed {} has an empty base_url",
                    feed.name
                )));
            }
            match reqwest::Url::parse(feed.base_url.trim()) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => {
                    return Err(MonitorError::Config(format!(
                        "feed {} base_url must be http or https, got {}",
                        feed.name,
                        url.scheme()
                    )))
                }
                Err(e) => {
                    return Err(MonitorError::Config(format!(
                        "feed {} has an invalid base_url {:?}: {}",
                        feed.name, feed.base_url, e
                    )))
                }
            }
        }
        Ok(())
    }
}

/// Read `path`, or the default location. A missing default file means built-in defaults;
/// a missing explicit file is an error.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, MonitorError> {
    let (path, explicit) = match path {
        Some(p) => (Path::new(p), true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };

    if !path.exists() {
        if explicit {
            return Err(MonitorError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(default_config());
    }

    let content = fs::read_to_string(path).map_err(|e| MonitorError::Config(e.to_string()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, MonitorError> {
    toml::from_str(content).map_err(|e| MonitorError::Config(e.to_string()))
}

pub fn apply_feed_filter(cfg: AppConfig, names: Option<&[String]>) -> AppConfig {
    if let Some(list) = names {
        let mut cfg = cfg;
        let lowered: Vec<String> = list.iter().map(|s| s.to_lowercase()).collect();
        for f in cfg.feeds.iter_mut() {
            f.enabled = lowered.iter().any(|n| n == &f.name.to_lowercase());
        }
        return cfg;
    }
    cfg
}

fn enabled_by_default() -> bool {
    true
}

fn default_config() -> AppConfig {
    AppConfig {
        timeout_ms: 10_000,
        user_agent: concat!("statuswatch/", env!("CARGO_PKG_VERSION")).to_string(),
        normal_interval_secs: 60,
        incident_interval_secs: 15,
        max_run_secs: None,
        feeds: vec![FeedConfig {
            name: "OpenAI".to_string(),
            enabled: true,
            base_url: "https://kh3m0q7m9g8m.statuspage.io/api/v2".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = parse_config(
            r#"
            incident_interval_secs = 5

            [[feeds]]
            name = "github"
            base_url = "https://www.githubstatus.com/api/v2"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.normal_interval_secs, 60);
        assert_eq!(cfg.incident_interval_secs, 5);
        assert_eq!(cfg.feeds.len(), 1);
        assert!(cfg.feeds[0].enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn feed_filter_is_case_insensitive() {
        let mut cfg = default_config();
        cfg.feeds.push(FeedConfig {
            name: "GitHub".into(),
            enabled: true,
            base_url: "https://www.githubstatus.com/api/v2".into(),
        });
        let cfg = apply_feed_filter(cfg, Some(&["github".to_string()]));
        let enabled: Vec<&str> = cfg.enabled_feeds().map(|f| f.name.as_str()).collect();
        assert_eq!(enabled, vec!["GitHub"]);
    }

    #[test]
    fn no_enabled_feed_is_a_config_error() {
        let cfg = apply_feed_filter(default_config(), Some(&["nope".to_string()]));
        assert!(matches!(cfg.validate(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn malformed_base_url_is_a_config_error() {
        for bad in ["not a url", "kh3m0q7m9g8m.statuspage.io/api/v2", "ftp://status.example/api/v2"] {
            let mut cfg = default_config();
            cfg.feeds[0].base_url = bad.to_string();
            assert!(
                matches!(cfg.validate(), Err(MonitorError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn disabled_feed_with_bad_url_is_ignored() {
        let mut cfg = default_config();
        cfg.feeds.push(FeedConfig {
            name: "broken".into(),
            enabled: false,
            base_url: "::".into(),
        });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load_config(Some("does/not/exist.toml")).is_err());
    }
}
