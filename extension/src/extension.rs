//! Consent extension: event handlers around the consent state manager

use edgeconsent_core::{format_timestamp, ConsentDocument, CONSENTS};
use edgeconsent_state::ConsentStateManager;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::DispatchTable;
use crate::event::{Event, EventSource, EventType};

/// Configuration key carrying default consents
pub const CONFIG_CONSENT_DEFAULT: &str = "consent.default";

/// Event data key carrying server consent payloads
pub const PAYLOAD: &str = "payload";

/// Notifications published by the consent extension
#[derive(Debug, Clone, PartialEq)]
pub enum ConsentNotification {
    /// Effective consents, shared for other extensions to read
    SharedState(ConsentDocument),
    /// Effective consents changed
    PreferencesUpdated(ConsentDocument),
    /// Answer to a get-consents request
    ConsentsResponse {
        request_id: Uuid,
        consents: ConsentDocument,
    },
}

struct ConsentState {
    manager: ConsentStateManager,
    defaults: Option<ConsentDocument>,
}

impl ConsentState {
    /// Defaults overlaid with the persisted consents
    fn effective(&self) -> Option<ConsentDocument> {
        match (&self.defaults, self.manager.current_consents()) {
            (None, None) => None,
            (Some(defaults), None) => Some(defaults.clone()),
            (None, Some(current)) => Some(current.clone()),
            (Some(defaults), Some(current)) => Some(defaults.merge(current)),
        }
    }
}

/// Consent extension.
///
/// The state manager and default consents sit behind one lock, so each
/// handler's read-merge-persist runs as a unit.
pub struct ConsentExtension {
    state: Mutex<ConsentState>,
    event_tx: Option<mpsc::Sender<ConsentNotification>>,
}

impl ConsentExtension {
    pub fn new(manager: ConsentStateManager) -> Self {
        Self {
            state: Mutex::new(ConsentState {
                manager,
                defaults: None,
            }),
            event_tx: None,
        }
    }

    /// Set notification channel
    pub fn set_notification_channel(&mut self, tx: mpsc::Sender<ConsentNotification>) {
        self.event_tx = Some(tx);
    }

    /// Persisted consents, without defaults
    pub fn current_consents(&self) -> Option<ConsentDocument> {
        self.state.lock().manager.current_consents().cloned()
    }

    pub fn default_consents(&self) -> Option<ConsentDocument> {
        self.state.lock().defaults.clone()
    }

    /// Defaults overlaid with persisted consents
    pub fn effective_consents(&self) -> Option<ConsentDocument> {
        self.state.lock().effective()
    }

    /// Install every handler of this extension into `table`.
    ///
    /// Handlers hold a weak reference; once the extension is dropped they
    /// ignore their events.
    pub fn register(self: &Arc<Self>, table: &mut DispatchTable) {
        let routes: [(EventType, EventSource, fn(&ConsentExtension, &Event)); 5] = [
            (EventType::Consent, EventSource::UpdateConsent, Self::handle_consent_update),
            (EventType::Consent, EventSource::RequestContent, Self::handle_get_consents_request),
            (EventType::Edge, EventSource::ConsentPreference, Self::handle_edge_consent_preference),
            (EventType::Configuration, EventSource::ResponseContent, Self::handle_configuration_response),
            (EventType::Hub, EventSource::Booted, Self::handle_event_hub_boot),
        ];

        for (event_type, source, handler) in routes {
            let extension: Weak<Self> = Arc::downgrade(self);
            table.register(event_type, source, move |event| match extension.upgrade() {
                Some(extension) => handler(&extension, event),
                None => debug!(
                    "Consent extension is gone, ignoring {} ({}/{})",
                    event.name, event.event_type, event.source
                ),
            });
        }
    }

    /// User or API consent update: merge, persist, and publish.
    pub fn handle_consent_update(&self, event: &Event) {
        let Some(data) = event.data.as_ref() else {
            debug!("Consent update event has no data, ignoring it");
            return;
        };

        let update = ConsentDocument::new(data.clone());
        if update.is_empty() {
            debug!("Consent update event carries no consents, ignoring it");
            return;
        }
        let update = update.with_timestamp(&format_timestamp(event.timestamp));

        let effective = {
            let mut state = self.state.lock();
            let outcome = state.manager.merge_and_persist(Some(update));
            debug!("Consent update persisted: {:?}", outcome);
            state.effective()
        };

        if let Some(consents) = effective {
            info!("Consent preferences updated");
            self.publish_update(consents);
        }
    }

    /// Consent preferences returned by the server.
    ///
    /// Only published when they differ from what is already known,
    /// timestamps aside.
    pub fn handle_edge_consent_preference(&self, event: &Event) {
        if !event.has_data() {
            debug!("Edge consent preference event has no data, ignoring it");
            return;
        }
        let Some(update) = event.data.as_ref().and_then(server_consents) else {
            debug!("Edge consent preference event has no consent payload, ignoring it");
            return;
        };
        let update = update.with_timestamp(&format_timestamp(event.timestamp));

        let effective = {
            let mut state = self.state.lock();
            let unchanged = state
                .manager
                .current_consents()
                .map_or(false, |current| current.merge(&update).same_consents(current));
            if unchanged {
                debug!("Server consents match current consents, nothing to update");
                return;
            }
            state.manager.merge_and_persist(Some(update));
            state.effective()
        };

        if let Some(consents) = effective {
            info!("Consent preferences updated from server response");
            self.publish_update(consents);
        }
    }

    /// Configuration update: replace the default consents.
    pub fn handle_configuration_response(&self, event: &Event) {
        let Some(data) = event.data.as_ref() else {
            debug!("Configuration event has no data, ignoring it");
            return;
        };

        let defaults = match data.get(CONFIG_CONSENT_DEFAULT) {
            Some(Value::Object(map)) => Some(ConsentDocument::new(map.clone())),
            Some(other) => {
                warn!("Ignoring malformed {}, keeping current defaults: {}", CONFIG_CONSENT_DEFAULT, other);
                return;
            }
            None => None,
        };

        let (before, after) = {
            let mut state = self.state.lock();
            let before = state.effective();
            state.defaults = defaults;
            (before, state.effective())
        };

        if before == after {
            debug!("Default consents unchanged");
            return;
        }
        if let Some(consents) = after {
            info!("Default consents updated");
            self.publish_update(consents);
        }
    }

    /// Host boot: share the initial consents, if any are known.
    pub fn handle_event_hub_boot(&self, _event: &Event) {
        match self.effective_consents() {
            Some(consents) if !consents.is_empty() => {
                self.emit(ConsentNotification::SharedState(consents));
            }
            _ => debug!("No consents known at boot, nothing to share"),
        }
    }

    /// Answer a get-consents request with the effective consents
    pub fn handle_get_consents_request(&self, event: &Event) {
        let consents = self.effective_consents().unwrap_or_default();
        self.emit(ConsentNotification::ConsentsResponse {
            request_id: event.id,
            consents,
        });
    }

    fn publish_update(&self, consents: ConsentDocument) {
        self.emit(ConsentNotification::SharedState(consents.clone()));
        self.emit(ConsentNotification::PreferencesUpdated(consents));
    }

    fn emit(&self, notification: ConsentNotification) {
        if let Some(tx) = &self.event_tx {
            if let Err(e) = tx.try_send(notification) {
                warn!("Dropped consent notification: {}", e);
            }
        }
    }
}

/// Consents carried by a server response: the first object of `payload`,
/// wrapped under `consents` unless it already is a full document.
fn server_consents(data: &Map<String, Value>) -> Option<ConsentDocument> {
    let first = data.get(PAYLOAD)?.as_array()?.first()?.as_object()?;
    if first.contains_key(CONSENTS) {
        return Some(ConsentDocument::new(first.clone()));
    }

    let mut map = Map::new();
    map.insert(CONSENTS.to_string(), Value::Object(first.clone()));
    let document = ConsentDocument::new(map);
    (!document.is_empty()).then_some(document)
}
