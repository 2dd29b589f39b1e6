use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a monitored component as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentStatus {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
    UnderMaintenance,
    Other(String),
}

impl ComponentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ComponentStatus::Operational => "operational",
            ComponentStatus::DegradedPerformance => "degraded_performance",
            ComponentStatus::PartialOutage => "partial_outage",
            ComponentStatus::MajorOutage => "major_outage",
            ComponentStatus::UnderMaintenance => "under_maintenance",
            ComponentStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ComponentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "operational" => ComponentStatus::Operational,
            "degraded_performance" => ComponentStatus::DegradedPerformance,
            "partial_outage" => ComponentStatus::PartialOutage,
            "major_outage" => ComponentStatus::MajorOutage,
            "under_maintenance" => ComponentStatus::UnderMaintenance,
            _ => ComponentStatus::Other(value),
        }
    }
}

impl From<&str> for ComponentStatus {
    fn from(value: &str) -> Self {
        ComponentStatus::from(value.to_string())
    }
}

impl From<ComponentStatus> for String {
    fn from(value: ComponentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident lifecycle status. Values outside the known set are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Monitoring,
    Resolved,
    Postmortem,
    Other(String),
}

impl IncidentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Identified => "identified",
            IncidentStatus::Monitoring => "monitoring",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Postmortem => "postmortem",
            IncidentStatus::Other(raw) => raw,
        }
    }

    /// Postmortems are only published after resolution, so both count as closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Postmortem)
    }
}

impl From<String> for IncidentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "investigating" => IncidentStatus::Investigating,
            "identified" => IncidentStatus::Identified,
            "monitoring" => IncidentStatus::Monitoring,
            "resolved" => IncidentStatus::Resolved,
            "postmortem" => IncidentStatus::Postmortem,
            _ => IncidentStatus::Other(value),
        }
    }
}

impl From<&str> for IncidentStatus {
    fn from(value: &str) -> Self {
        IncidentStatus::from(value.to_string())
    }
}

impl From<IncidentStatus> for String {
    fn from(value: IncidentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub status: ComponentStatus,
}

impl Component {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: impl Into<ComponentStatus>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: status.into(),
        }
    }
}

/// Most recent entry of an incident's update timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub id: Option<String>,
    pub status: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// What the engine needs to know about one incident from a detail fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentSnapshot {
    pub id: String,
    pub name: String,
    pub status: IncidentStatus,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub affected_components: Vec<String>,
    #[serde(default)]
    pub latest_update: Option<IncidentUpdate>,
}

impl IncidentSnapshot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: impl Into<IncidentStatus>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: status.into(),
            impact: None,
            affected_components: Vec::new(),
            latest_update: None,
        }
    }

    pub fn with_update(mut self, status: impl Into<String>, body: impl Into<String>) -> Self {
        self.latest_update = Some(IncidentUpdate {
            id: None,
            status: status.into(),
            body: body.into(),
            created_at: None,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    IncidentNew,
    IncidentUpdated,
    ComponentStatusChanged,
}

/// A real, externally visible state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub subject_id: String,
    pub subject_name: String,
    pub new_status: String,
    #[serde(default)]
    pub previous_status: Option<String>,
    pub detail_text: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStage {
    Summary,
    Incidents,
    Components,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStage::Summary => "summary",
            FetchStage::Incidents => "incidents",
            FetchStage::Components => "components",
        };
        f.write_str(name)
    }
}

/// Everything a sink can be handed by a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Change {
        feed: String,
        #[serde(flatten)]
        event: ChangeEvent,
    },
    FetchFailed {
        feed: String,
        stage: FetchStage,
        error: String,
        observed_at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_statuses_round_trip_verbatim() {
        let status: ComponentStatus = serde_json::from_str("\"exploded\"").unwrap();
        assert_eq!(status, ComponentStatus::Other("exploded".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"exploded\"");
    }

    #[test]
    fn closed_incident_statuses() {
        assert!(IncidentStatus::Resolved.is_closed());
        assert!(IncidentStatus::Postmortem.is_closed());
        assert!(!IncidentStatus::Monitoring.is_closed());
        assert!(!IncidentStatus::from("scheduled").is_closed());
    }

    #[test]
    fn change_notification_serializes_flat() {
        let note = Notification::Change {
            feed: "openai".into(),
            event: ChangeEvent {
                kind: ChangeKind::ComponentStatusChanged,
                subject_id: "chat_api".into(),
                subject_name: "Chat API".into(),
                new_status: "degraded_performance".into(),
                previous_status: Some("operational".into()),
                detail_text: "status changed".into(),
                observed_at: DateTime::parse_from_rfc3339("2025-01-02T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            },
        };
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["type"], "change");
        assert_eq!(value["kind"], "component_status_changed");
        assert_eq!(value["subject_id"], "chat_api");
    }
}
