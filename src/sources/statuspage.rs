use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::error::MonitorError;
use crate::core::types::{Component, ComponentStatus, IncidentSnapshot, IncidentUpdate};
use crate::sources::DataSource;

const UNKNOWN_INCIDENT: &str = "Unknown Incident";
const UNKNOWN_SERVICE: &str = "Unknown Service";

/// Atlassian Statuspage v2 API, e.g. `https://<page>.statuspage.io/api/v2`.
pub struct StatuspageSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IncidentsEnvelope {
    #[serde(default)]
    incidents: Vec<WireIncident>,
}

#[derive(Debug, Deserialize)]
struct WireIncident {
    id: String,
    #[serde(default)]
    name: Option<String>,
    status: String,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    incident_updates: Vec<WireUpdate>,
    #[serde(default)]
    components: Vec<WireComponentRef>,
}

#[derive(Debug, Deserialize)]
struct WireUpdate {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireComponentRef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ComponentsEnvelope {
    #[serde(default)]
    components: Vec<WireComponent>,
}

#[derive(Debug, Deserialize)]
struct WireComponent {
    id: String,
    #[serde(default)]
    name: Option<String>,
    status: ComponentStatus,
}

impl StatuspageSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_bytes(&self, endpoint: &str) -> Result<Vec<u8>, MonitorError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::trace!("GET {}", url);
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, MonitorError> {
        let body = self.get_bytes(endpoint).await?;
        serde_json::from_slice(&body)
            .map_err(|e| MonitorError::Parse(format!("{}: {}", endpoint, e)))
    }
}

#[async_trait]
impl DataSource for StatuspageSource {
    async fn fetch_summary(&self) -> Result<Vec<u8>, MonitorError> {
        self.get_bytes("summary.json").await
    }

    async fn fetch_incidents(&self) -> Result<Vec<IncidentSnapshot>, MonitorError> {
        let envelope: IncidentsEnvelope = self.get_json("incidents.json").await?;
        Ok(envelope.incidents.into_iter().map(into_snapshot).collect())
    }

    async fn fetch_components(&self) -> Result<Vec<Component>, MonitorError> {
        let envelope: ComponentsEnvelope = self.get_json("components.json").await?;
        Ok(envelope
            .components
            .into_iter()
            .map(|c| Component {
                id: c.id,
                name: display_name(c.name, UNKNOWN_SERVICE),
                status: c.status,
            })
            .collect())
    }
}

fn into_snapshot(wire: WireIncident) -> IncidentSnapshot {
    // Statuspage lists updates newest first.
    let latest_update = wire.incident_updates.into_iter().next().map(|u| IncidentUpdate {
        id: u.id,
        status: u.status,
        body: u.body,
        created_at: u
            .created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    });
    IncidentSnapshot {
        id: wire.id,
        name: display_name(wire.name, UNKNOWN_INCIDENT),
        status: wire.status.into(),
        impact: wire.impact,
        affected_components: wire.components.into_iter().map(|c| c.name).collect(),
        latest_update,
    }
}

/// Missing, null and blank names all fall back to `fallback`.
fn display_name(name: Option<String>, fallback: &str) -> String {
    name.filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
