//! CLI Commands

use anyhow::{bail, Context};
use edgeconsent_core::{ConsentDocument, CONSENTS};
use edgeconsent_extension::{ConsentNotification, Event, EventSource, EventType};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// Consent update event setting one category
pub fn set_consent_event(category: &str, value: &str) -> Event {
    let document = ConsentDocument::with_consent(category, value);
    update_event(document.into_map())
}

/// Consent update event from a JSON document.
///
/// Accepts either a full document (`{"consents": {...}}`) or the bare
/// category map (`{"collect": {"val": "y"}}`).
pub fn merge_event(json: &str) -> anyhow::Result<Event> {
    let value: Value = serde_json::from_str(json).context("consent update is not valid JSON")?;
    let Value::Object(map) = value else {
        bail!("consent update must be a JSON object");
    };

    let data = if map.contains_key(CONSENTS) {
        map
    } else {
        let mut wrapped = Map::new();
        wrapped.insert(CONSENTS.to_string(), Value::Object(map));
        wrapped
    };
    Ok(update_event(data))
}

fn update_event(data: Map<String, Value>) -> Event {
    Event::new("Consent update (cli)", EventType::Consent, EventSource::UpdateConsent)
        .with_data(data)
}

/// Pretty JSON of a consent document
pub fn render_document(document: &ConsentDocument) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(document.raw_map())?)
}

/// One-line summary of a notification
pub fn render_notification(notification: &ConsentNotification) -> anyhow::Result<String> {
    let line = match notification {
        ConsentNotification::SharedState(consents) => {
            format!("shared state: {}", consents.to_json()?)
        }
        ConsentNotification::PreferencesUpdated(consents) => {
            format!("preferences updated: {}", consents.to_json()?)
        }
        ConsentNotification::ConsentsResponse { request_id, consents } => {
            format!("consents response {}: {}", request_id, consents.to_json()?)
        }
    };
    Ok(line)
}

/// Collect the notifications queued so far
pub fn drain_notifications(rx: &mut mpsc::Receiver<ConsentNotification>) -> Vec<ConsentNotification> {
    let mut notifications = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        notifications.push(notification);
    }
    notifications
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_consent_event() {
        let event = set_consent_event("collect", "n");
        assert_eq!(event.key(), (EventType::Consent, EventSource::UpdateConsent));

        let document = ConsentDocument::new(event.data.unwrap());
        assert_eq!(document.collect(), Some("n"));
    }

    #[test]
    fn test_merge_event_wraps_bare_categories() {
        let event = merge_event(r#"{"adID":{"val":"y"}}"#).unwrap();
        let document = ConsentDocument::new(event.data.unwrap());
        assert_eq!(document.ad_id(), Some("y"));

        let event = merge_event(r#"{"consents":{"personalize":{"val":"pi"}}}"#).unwrap();
        let document = ConsentDocument::new(event.data.unwrap());
        assert_eq!(document.personalize(), Some("pi"));
    }

    #[test]
    fn test_merge_event_rejects_bad_input() {
        assert!(merge_event("not json").is_err());
        assert!(merge_event("[1]").is_err());
    }

    #[test]
    fn test_drain_notifications() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.try_send(ConsentNotification::SharedState(ConsentDocument::empty()))
            .unwrap();

        let drained = drain_notifications(&mut rx);

        assert_eq!(drained.len(), 1);
        assert_eq!(
            render_notification(&drained[0]).unwrap(),
            "shared state: {}"
        );
    }
}
