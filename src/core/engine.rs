use std::{sync::Arc, time::Duration};

use tokio::task::JoinSet;

use crate::{
    config::AppConfig,
    core::{error::MonitorError, output::EventSink, shutdown::ShutdownHandle},
    pipeline::scheduler::{CycleReport, Monitor, StopReason},
    sources::statuspage::StatuspageSource,
};

/// Runs one independent monitor per enabled feed over a shared HTTP client.
pub struct Engine {
    client: reqwest::Client,
    pub config: AppConfig,
}

impl Engine {
    pub fn new(config: AppConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(4))
            .build()
            .map_err(MonitorError::from)?;

        Ok(Self { client, config })
    }

    /// Fresh monitors, each with its own empty run state.
    pub fn monitors(
        &self,
        sink: Arc<dyn EventSink>,
    ) -> Result<Vec<Monitor<StatuspageSource>>, MonitorError> {
        let poll = self.config.poll_config();
        self.config
            .enabled_feeds()
            .map(|feed| {
                let source = StatuspageSource::new(self.client.clone(), feed.base_url.clone());
                Monitor::new(feed.name.clone(), source, sink.clone(), poll.clone())
            })
            .collect()
    }

    /// Run every feed concurrently until `shutdown` fires or `max_run` elapses. A feed that
    /// hits a non-transient error stops alone with `StopReason::Fatal`.
    pub async fn run(
        &self,
        sink: Arc<dyn EventSink>,
        shutdown: &ShutdownHandle,
    ) -> Result<Vec<(String, StopReason)>, MonitorError> {
        let mut tasks = JoinSet::new();
        for mut monitor in self.monitors(sink)? {
            let signal = shutdown.subscribe();
            tasks.spawn(async move {
                let reason = monitor.run(signal).await;
                (monitor.feed().to_string(), reason)
            });
        }

        let mut stopped = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => stopped.push(done),
                Err(err) => tracing::error!("monitor task failed: {}", err),
            }
        }
        stopped.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(stopped)
    }

    /// A single cycle per feed, in configuration order.
    pub async fn check_once(
        &self,
        sink: Arc<dyn EventSink>,
    ) -> Result<Vec<(String, CycleReport)>, MonitorError> {
        let mut reports = Vec::new();
        for mut monitor in self.monitors(sink)? {
            let report = monitor.run_cycle().await;
            reports.push((monitor.feed().to_string(), report));
        }
        Ok(reports)
    }
}
