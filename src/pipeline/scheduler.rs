//! Adaptive polling loop for a single feed.
//!
//! Each cycle fetches the cheap summary endpoint first and only pulls incident and
//! component detail when the summary fingerprint moved. The sleep between cycles is
//! short while any incident is open and long otherwise.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::error::MonitorError;
use crate::core::fingerprint::{has_changed, Fingerprint};
use crate::core::output::EventSink;
use crate::core::shutdown::ShutdownSignal;
use crate::core::store::StateStore;
use crate::core::time::now_utc;
use crate::core::types::{FetchStage, Notification};
use crate::pipeline::diff::diff;
use crate::sources::DataSource;

pub const DEFAULT_NORMAL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_INCIDENT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub normal_interval: Duration,
    pub incident_interval: Duration,
    /// Stop on our own after this long. `None` runs until cancelled.
    pub max_run: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            normal_interval: DEFAULT_NORMAL_INTERVAL,
            incident_interval: DEFAULT_INCIDENT_INTERVAL,
            max_run: None,
        }
    }
}

impl PollConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.normal_interval.is_zero() || self.incident_interval.is_zero() {
            return Err(MonitorError::Config(
                "polling intervals must be greater than zero".into(),
            ));
        }
        if self.incident_interval > self.normal_interval {
            return Err(MonitorError::Config(format!(
                "incident interval ({:?}) must not exceed normal interval ({:?})",
                self.incident_interval, self.normal_interval
            )));
        }
        if self.max_run.is_some_and(|d| d.is_zero()) {
            return Err(MonitorError::Config("max run must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn interval_for(&self, incident_active: bool) -> Duration {
        if incident_active {
            self.incident_interval
        } else {
            self.normal_interval
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Polling,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    MaxRunElapsed,
    /// A source reported an error that retrying cannot fix.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Summary fingerprint matched; no detail fetch was made.
    Unchanged,
    /// Details were fetched and diffed (possibly yielding zero events).
    Changed,
    SummaryFailed,
    DetailFailed,
    /// The failure was not transient; the loop must not continue.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub events: usize,
    pub next_interval: Duration,
}

/// Mutable state owned by one monitor for its whole lifetime.
#[derive(Debug)]
pub struct RunState {
    pub fingerprint: Option<Fingerprint>,
    pub store: StateStore,
    pub interval: Duration,
    pub incident_active: bool,
}

impl RunState {
    fn new(initial_interval: Duration) -> Self {
        Self {
            fingerprint: None,
            store: StateStore::new(),
            interval: initial_interval,
            incident_active: false,
        }
    }
}

pub struct Monitor<S> {
    feed: String,
    source: S,
    sink: Arc<dyn EventSink>,
    config: PollConfig,
    state: RunState,
    phase: Phase,
    cycles: u64,
}

impl<S: DataSource> Monitor<S> {
    pub fn new(
        feed: impl Into<String>,
        source: S,
        sink: Arc<dyn EventSink>,
        config: PollConfig,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let state = RunState::new(config.normal_interval);
        Ok(Self {
            feed: feed.into(),
            source,
            sink,
            config,
            state,
            phase: Phase::Idle,
            cycles: 0,
        })
    }

    pub fn feed(&self) -> &str {
        &self.feed
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Poll until `shutdown` fires, `max_run` elapses, or a source error is not transient.
    ///
    /// A cycle already in flight is allowed to finish; only the sleep is preempted.
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> StopReason {
        let deadline = self.config.max_run.map(|d| Instant::now() + d);
        tracing::info!(
            "{}: monitoring (normal {:?}, incident {:?})",
            self.feed,
            self.config.normal_interval,
            self.config.incident_interval
        );

        let reason = loop {
            if shutdown.is_triggered() {
                break StopReason::Cancelled;
            }

            let report = self.run_cycle().await;

            if report.outcome == CycleOutcome::Fatal {
                break StopReason::Fatal;
            }
            if shutdown.is_triggered() {
                break StopReason::Cancelled;
            }
            let mut wake = Instant::now() + report.next_interval;
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break StopReason::MaxRunElapsed;
                }
                wake = wake.min(deadline);
            }

            tokio::select! {
                _ = tokio::time::sleep_until(wake) => {}
                _ = shutdown.wait() => break StopReason::Cancelled,
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                break StopReason::MaxRunElapsed;
            }
        };

        self.phase = Phase::Stopped;
        tracing::info!(
            "{}: stopped after {} cycles ({:?})",
            self.feed,
            self.cycles,
            reason
        );
        reason
    }

    /// One fetch, compare, diff, emit pass. Never fails: fetch errors are reported to the
    /// sink and leave the run state as it was.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.phase = Phase::Polling;
        self.cycles += 1;

        let raw = match self.source.fetch_summary().await {
            Ok(raw) => raw,
            Err(err) => return self.fail(FetchStage::Summary, err),
        };

        let fingerprint = Fingerprint::compute(&raw);
        if !has_changed(self.state.fingerprint.as_ref(), &fingerprint) {
            tracing::debug!("{}: summary unchanged ({})", self.feed, fingerprint);
            return self.finish(CycleOutcome::Unchanged, 0);
        }

        // Both snapshots must arrive before anything is applied. The fingerprint is only
        // committed afterwards so a failed detail fetch is retried next cycle.
        let incidents = match self.source.fetch_incidents().await {
            Ok(incidents) => incidents,
            Err(err) => return self.fail(FetchStage::Incidents, err),
        };
        let components = match self.source.fetch_components().await {
            Ok(components) => components,
            Err(err) => return self.fail(FetchStage::Components, err),
        };

        tracing::debug!(
            "{}: summary changed ({}), {} incidents / {} components fetched",
            self.feed,
            fingerprint,
            incidents.len(),
            components.len()
        );
        self.state.fingerprint = Some(fingerprint);

        let events = diff(&incidents, &components, &mut self.state.store, now_utc());
        for event in &events {
            tracing::info!(
                "{}: {:?} {} -> {}",
                self.feed,
                event.kind,
                event.subject_id,
                event.new_status
            );
            self.sink.emit(&Notification::Change {
                feed: self.feed.clone(),
                event: event.clone(),
            });
        }

        self.finish(CycleOutcome::Changed, events.len())
    }

    fn finish(&mut self, outcome: CycleOutcome, events: usize) -> CycleReport {
        let active = self.state.store.has_active_incident();
        let next = self.config.interval_for(active);
        if next != self.state.interval {
            tracing::info!(
                "{}: {} active incidents, polling every {:?}",
                self.feed,
                self.state.store.active_incident_count(),
                next
            );
        }
        self.state.incident_active = active;
        self.state.interval = next;
        self.phase = Phase::Idle;
        CycleReport {
            outcome,
            events,
            next_interval: next,
        }
    }

    fn fail(&mut self, stage: FetchStage, err: MonitorError) -> CycleReport {
        if err.is_transient() {
            tracing::warn!("{}: {} fetch failed: {}", self.feed, stage, err);
        } else {
            tracing::error!("{}: {} fetch failed, giving up: {}", self.feed, stage, err);
        }
        self.sink.emit(&Notification::FetchFailed {
            feed: self.feed.clone(),
            stage,
            error: err.to_string(),
            observed_at: now_utc(),
        });
        self.phase = Phase::Idle;
        let outcome = match stage {
            _ if !err.is_transient() => CycleOutcome::Fatal,
            FetchStage::Summary => CycleOutcome::SummaryFailed,
            FetchStage::Incidents | FetchStage::Components => CycleOutcome::DetailFailed,
        };
        CycleReport {
            outcome,
            events: 0,
            next_interval: self.state.interval,
        }
    }
}
