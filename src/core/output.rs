use std::io::Write;
use std::sync::Arc;

use crate::core::time::display_timestamp;
use crate::core::types::{ChangeKind, Notification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

/// Receives notifications from monitors. Fire and forget: nothing is retried.
pub trait EventSink: Send + Sync {
    fn emit(&self, notification: &Notification);
}

impl<F> EventSink for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn emit(&self, notification: &Notification) {
        self(notification)
    }
}

pub fn sink_for(format: OutputFormat) -> Arc<dyn EventSink> {
    match format {
        OutputFormat::Text => Arc::new(ConsoleSink),
        OutputFormat::Jsonl => Arc::new(JsonlSink),
    }
}

/// Human readable blocks on stdout.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, notification: &Notification) {
        let text = format_text(notification);
        let mut out = std::io::stdout().lock();
        if let Err(err) = writeln!(out, "{text}") {
            tracing::warn!("failed to write notification: {}", err);
        }
    }
}

/// One JSON object per line on stdout.
pub struct JsonlSink;

impl EventSink for JsonlSink {
    fn emit(&self, notification: &Notification) {
        let line = match serde_json::to_string(notification) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!("failed to encode notification: {}", err);
                return;
            }
        };
        let mut out = std::io::stdout().lock();
        if let Err(err) = writeln!(out, "{line}") {
            tracing::warn!("failed to write notification: {}", err);
        }
    }
}

pub fn format_text(notification: &Notification) -> String {
    match notification {
        Notification::Change { feed, event } => {
            let status = match event.kind {
                ChangeKind::IncidentNew => format!("New incident - {}", title_case(&event.new_status)),
                ChangeKind::IncidentUpdated => {
                    format!("Incident update - {}", title_case(&event.new_status))
                }
                ChangeKind::ComponentStatusChanged => title_case(&event.new_status),
            };
            let mut lines = vec![
                String::new(),
                format!(
                    "[{}] Product: {} - {}",
                    display_timestamp(&event.observed_at),
                    feed,
                    event.subject_name
                ),
                format!("Status: {status}"),
            ];
            if !event.detail_text.is_empty() {
                lines.push(format!("Details: {}", event.detail_text));
            }
            lines.push("-".repeat(80));
            lines.join("\n")
        }
        Notification::FetchFailed {
            feed,
            stage,
            error,
            observed_at,
        } => format!(
            "[{}] [ERROR] {}: {} fetch failed: {}",
            display_timestamp(observed_at),
            feed,
            stage,
            error
        ),
    }
}

fn title_case(status: &str) -> String {
    status
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::core::types::{ChangeEvent, FetchStage};

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-02T08:15:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn component_change_text_block() {
        let note = Notification::Change {
            feed: "OpenAI".into(),
            event: ChangeEvent {
                kind: ChangeKind::ComponentStatusChanged,
                subject_id: "chat_api".into(),
                subject_name: "Chat API".into(),
                new_status: "degraded_performance".into(),
                previous_status: Some("operational".into()),
                detail_text: "status changed from operational to degraded performance".into(),
                observed_at: at(),
            },
        };
        let text = format_text(&note);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "[2025-01-02 08:15:00] Product: OpenAI - Chat API");
        assert_eq!(lines[2], "Status: Degraded Performance");
        assert_eq!(
            lines[3],
            "Details: status changed from operational to degraded performance"
        );
        assert_eq!(lines[4].len(), 80);
    }

    #[test]
    fn fetch_failure_is_one_line() {
        let note = Notification::FetchFailed {
            feed: "OpenAI".into(),
            stage: FetchStage::Summary,
            error: "timeout".into(),
            observed_at: at(),
        };
        assert_eq!(
            format_text(&note),
            "[2025-01-02 08:15:00] [ERROR] OpenAI: summary fetch failed: timeout"
        );
    }

    #[test]
    fn closures_are_sinks() {
        let seen = std::sync::Mutex::new(0usize);
        let sink = |_: &Notification| *seen.lock().unwrap() += 1;
        sink.emit(&Notification::FetchFailed {
            feed: "x".into(),
            stage: FetchStage::Components,
            error: "boom".into(),
            observed_at: at(),
        });
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
