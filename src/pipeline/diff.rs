use chrono::{DateTime, Utc};

use crate::core::fingerprint::sha256_hex;
use crate::core::store::{IncidentState, StateStore};
use crate::core::time::display_timestamp;
use crate::core::types::{ChangeEvent, ChangeKind, Component, IncidentSnapshot};

pub const DETAIL_MAX_CHARS: usize = 200;
const NO_DETAILS: &str = "No details available";

/// Compare a fully fetched snapshot pair against `store`, recording the new observations.
///
/// Incident events come first, then component events, each in feed order.
pub fn diff(
    incidents: &[IncidentSnapshot],
    components: &[Component],
    store: &mut StateStore,
    observed_at: DateTime<Utc>,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for incident in incidents {
        let next = IncidentState {
            status: incident.status.clone(),
            update_signature: update_signature(incident),
        };
        let prev = store.upsert_incident(&incident.id, next.clone());
        let kind = match &prev {
            None => ChangeKind::IncidentNew,
            Some(p) if *p == next => continue,
            Some(_) => ChangeKind::IncidentUpdated,
        };
        events.push(ChangeEvent {
            kind,
            subject_id: incident.id.clone(),
            subject_name: incident.name.clone(),
            new_status: incident.status.to_string(),
            previous_status: prev.map(|p| p.status.to_string()),
            detail_text: incident_detail(incident),
            observed_at,
        });
    }

    for component in components {
        let prev = store.upsert_component(&component.id, component.status.clone());
        match prev {
            // first sighting is baseline, not news
            None => {}
            Some(p) if p == component.status => {}
            Some(p) => events.push(ChangeEvent {
                kind: ChangeKind::ComponentStatusChanged,
                subject_id: component.id.clone(),
                subject_name: component.name.clone(),
                new_status: component.status.to_string(),
                detail_text: format!(
                    "status changed from {} to {}",
                    humanize(p.as_str()),
                    humanize(component.status.as_str())
                ),
                previous_status: Some(p.to_string()),
                observed_at,
            }),
        }
    }

    events
}

/// Digest of the latest update, so a new body under an unchanged status still counts.
pub fn update_signature(incident: &IncidentSnapshot) -> String {
    let mut buf = String::new();
    if let Some(update) = &incident.latest_update {
        buf.push_str(update.id.as_deref().unwrap_or(""));
        buf.push('|');
        buf.push_str(&update.status);
        buf.push('|');
        buf.push_str(&update.body);
    }
    sha256_hex(buf.as_bytes())
}

fn incident_detail(incident: &IncidentSnapshot) -> String {
    let body = incident
        .latest_update
        .as_ref()
        .map(|u| u.body.trim())
        .filter(|b| !b.is_empty())
        .unwrap_or(NO_DETAILS);
    let mut detail = truncate_chars(body, DETAIL_MAX_CHARS);

    let mut context = Vec::new();
    if let Some(posted) = incident.latest_update.as_ref().and_then(|u| u.created_at) {
        context.push(format!("posted {} UTC", display_timestamp(&posted)));
    }
    if let Some(impact) = incident.impact.as_deref().filter(|i| *i != "none") {
        context.push(format!("impact: {impact}"));
    }
    if !incident.affected_components.is_empty() {
        context.push(format!(
            "affects: {}",
            incident.affected_components.join(", ")
        ));
    }
    if !context.is_empty() {
        detail.push_str(&format!(" ({})", context.join("; ")));
    }
    detail
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn humanize(status: &str) -> String {
    status.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ComponentStatus, IncidentStatus};

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn repeated_incident_snapshot_notifies_once() {
        let mut store = StateStore::new();
        let incident = IncidentSnapshot::new("inc1", "Elevated errors", "investigating")
            .with_update("investigating", "We are looking into it.");

        let first = diff(&[incident.clone()], &[], &mut store, at());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, ChangeKind::IncidentNew);
        assert_eq!(first[0].previous_status, None);

        for _ in 0..3 {
            assert!(diff(&[incident.clone()], &[], &mut store, at()).is_empty());
        }
    }

    #[test]
    fn new_update_body_under_same_status_is_an_update() {
        let mut store = StateStore::new();
        let v1 = IncidentSnapshot::new("inc1", "Elevated errors", "identified")
            .with_update("identified", "Root cause found.");
        let v2 = IncidentSnapshot::new("inc1", "Elevated errors", "identified")
            .with_update("identified", "Fix is rolling out.");

        diff(&[v1], &[], &mut store, at());
        let events = diff(&[v2], &[], &mut store, at());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::IncidentUpdated);
        assert_eq!(events[0].detail_text, "Fix is rolling out.");
        assert_eq!(events[0].previous_status.as_deref(), Some("identified"));
    }

    #[test]
    fn already_resolved_incident_is_still_reported_once() {
        let mut store = StateStore::new();
        let incident = IncidentSnapshot::new("old", "Past outage", IncidentStatus::Resolved);
        let events = diff(&[incident.clone()], &[], &mut store, at());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail_text, NO_DETAILS);
        assert!(diff(&[incident], &[], &mut store, at()).is_empty());
        assert!(!store.has_active_incident());
    }

    #[test]
    fn first_seen_component_is_silent() {
        let mut store = StateStore::new();
        let components = vec![
            Component::new("a", "API", ComponentStatus::MajorOutage),
            Component::new("b", "Chat", ComponentStatus::Operational),
        ];
        assert!(diff(&[], &components, &mut store, at()).is_empty());
        assert_eq!(store.component_count(), 2);
    }

    #[test]
    fn component_transitions_and_recovery_are_reported() {
        let mut store = StateStore::new();
        let up = Component::new("chat_api", "Chat API", ComponentStatus::Operational);
        let down = Component::new("chat_api", "Chat API", ComponentStatus::DegradedPerformance);

        diff(&[], &[up.clone()], &mut store, at());
        let events = diff(&[], &[down.clone()], &mut store, at());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::ComponentStatusChanged);
        assert_eq!(events[0].new_status, "degraded_performance");
        assert_eq!(
            events[0].detail_text,
            "status changed from operational to degraded performance"
        );

        assert!(diff(&[], &[down], &mut store, at()).is_empty());

        let events = diff(&[], &[up], &mut store, at());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].new_status, "operational");
    }

    #[test]
    fn incidents_precede_components_in_feed_order() {
        let mut store = StateStore::new();
        store.upsert_component("c2", ComponentStatus::Operational);
        store.upsert_component("c1", ComponentStatus::Operational);

        let incidents = vec![
            IncidentSnapshot::new("i2", "Second", "investigating"),
            IncidentSnapshot::new("i1", "First", "investigating"),
        ];
        let components = vec![
            Component::new("c2", "Two", ComponentStatus::PartialOutage),
            Component::new("c1", "One", ComponentStatus::MajorOutage),
        ];
        let ids: Vec<String> = diff(&incidents, &components, &mut store, at())
            .into_iter()
            .map(|e| e.subject_id)
            .collect();
        assert_eq!(ids, vec!["i2", "i1", "c2", "c1"]);
    }

    #[test]
    fn identical_inputs_produce_identical_events() {
        let incidents = vec![IncidentSnapshot::new("i1", "Outage", "monitoring")
            .with_update("monitoring", "Watching recovery.")];
        let components = vec![Component::new("c1", "API", ComponentStatus::Operational)];

        let mut a = StateStore::new();
        let mut b = StateStore::new();
        assert_eq!(
            diff(&incidents, &components, &mut a, at()),
            diff(&incidents, &components, &mut b, at())
        );
    }

    #[test]
    fn detail_is_truncated_on_char_boundary_with_context() {
        let mut incident = IncidentSnapshot::new("i1", "Outage", "investigating")
            .with_update("investigating", "é".repeat(250));
        incident.impact = Some("major".into());
        incident.affected_components = vec!["API".into(), "Chat".into()];

        let detail = incident_detail(&incident);
        assert!(detail.starts_with(&format!("{}...", "é".repeat(DETAIL_MAX_CHARS))));
        assert!(detail.ends_with("(impact: major; affects: API, Chat)"));
    }

    #[test]
    fn detail_carries_update_post_time() {
        let mut incident = IncidentSnapshot::new("i1", "Outage", "identified")
            .with_update("identified", "Rolling back the deploy.");
        if let Some(update) = incident.latest_update.as_mut() {
            update.created_at = Some(at());
        }
        incident.impact = Some("minor".into());

        let mut store = StateStore::new();
        let events = diff(&[incident], &[], &mut store, at());
        assert_eq!(
            events[0].detail_text,
            "Rolling back the deploy. (posted 2025-01-02 00:00:00 UTC; impact: minor)"
        );
    }
}
