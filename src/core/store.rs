use std::collections::HashMap;

use crate::core::types::{ComponentStatus, IncidentStatus};

/// Last observed state of one incident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentState {
    pub status: IncidentStatus,
    pub update_signature: String,
}

/// In-memory record of everything a monitor has seen so far.
///
/// Entries are never evicted: resolved incidents stay so a repeated "resolved" payload
/// is recognized as old news, and components missing from a later fetch keep their last
/// known status.
#[derive(Debug, Default)]
pub struct StateStore {
    incidents: HashMap<String, IncidentState>,
    components: HashMap<String, ComponentStatus>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state` for `id` and hand back whatever was there before.
    pub fn upsert_incident(&mut self, id: &str, state: IncidentState) -> Option<IncidentState> {
        self.incidents.insert(id.to_string(), state)
    }

    pub fn upsert_component(
        &mut self,
        id: &str,
        status: ComponentStatus,
    ) -> Option<ComponentStatus> {
        self.components.insert(id.to_string(), status)
    }

    pub fn incident(&self, id: &str) -> Option<&IncidentState> {
        self.incidents.get(id)
    }

    pub fn component(&self, id: &str) -> Option<&ComponentStatus> {
        self.components.get(id)
    }

    pub fn has_active_incident(&self) -> bool {
        self.incidents.values().any(|s| !s.status.is_closed())
    }

    pub fn active_incident_count(&self) -> usize {
        self.incidents
            .values()
            .filter(|s| !s.status.is_closed())
            .count()
    }

    pub fn incident_count(&self) -> usize {
        self.incidents.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty() && self.components.is_empty()
    }
}
