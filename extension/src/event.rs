//! Events delivered to the consent extension

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Consent,
    Edge,
    Configuration,
    Hub,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Consent => "com.adobe.eventType.edgeConsent",
            EventType::Edge => "com.adobe.eventType.edge",
            EventType::Configuration => "com.adobe.eventType.configuration",
            EventType::Hub => "com.adobe.eventType.hub",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    UpdateConsent,
    RequestContent,
    ResponseContent,
    ConsentPreference,
    Booted,
    SharedState,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::UpdateConsent => "com.adobe.eventSource.updateConsent",
            EventSource::RequestContent => "com.adobe.eventSource.requestContent",
            EventSource::ResponseContent => "com.adobe.eventSource.responseContent",
            EventSource::ConsentPreference => "consent:preferences",
            EventSource::Booted => "com.adobe.eventSource.booted",
            EventSource::SharedState => "com.adobe.eventSource.sharedState",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with optional JSON payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub event_type: EventType,
    pub source: EventSource,
    pub data: Option<Map<String, Value>>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(name: impl Into<String>, event_type: EventType, source: EventSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            event_type,
            source,
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Dispatch key of this event
    pub fn key(&self) -> (EventType, EventSource) {
        (self.event_type, self.source)
    }

    /// True when the event carries a non-empty payload
    pub fn has_data(&self) -> bool {
        self.data.as_ref().map_or(false, |d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_builder() {
        let data = json!({ "consents": { "collect": { "val": "y" } } });
        let event = Event::new("Consent update", EventType::Consent, EventSource::UpdateConsent)
            .with_data(data.as_object().unwrap().clone());

        assert_eq!(event.key(), (EventType::Consent, EventSource::UpdateConsent));
        assert!(event.has_data());
        assert_eq!(event.name, "Consent update");
    }

    #[test]
    fn test_event_without_data() {
        let event = Event::new("Boot", EventType::Hub, EventSource::Booted);
        assert!(!event.has_data());

        let event = event.with_data(Map::new());
        assert!(!event.has_data());
    }

    #[test]
    fn test_event_ids_unique() {
        let a = Event::new("a", EventType::Hub, EventSource::Booted);
        let b = Event::new("b", EventType::Hub, EventSource::Booted);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(EventSource::ConsentPreference.to_string(), "consent:preferences");
        assert_eq!(EventType::Edge.to_string(), "com.adobe.eventType.edge");
    }
}
