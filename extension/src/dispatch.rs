//! Event dispatch table keyed by (event type, event source)

use edgeconsent_core::{ConsentError, ConsentResult};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::event::{Event, EventSource, EventType};

/// Handler invoked for a dispatched event
pub type EventHandler = Box<dyn Fn(&Event) + Send + Sync>;

/// Routes events to the handler registered for their (type, source) pair
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<(EventType, EventSource), EventHandler>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one for the same pair
    pub fn register<F>(&mut self, event_type: EventType, source: EventSource, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        if self
            .handlers
            .insert((event_type, source), Box::new(handler))
            .is_some()
        {
            warn!("Replaced handler for {}/{}", event_type, source);
        }
    }

    pub fn is_registered(&self, event_type: EventType, source: EventSource) -> bool {
        self.handlers.contains_key(&(event_type, source))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler registered for `event`
    pub fn dispatch(&self, event: &Event) -> ConsentResult<()> {
        match self.handlers.get(&event.key()) {
            Some(handler) => {
                debug!("Dispatching {} ({}/{})", event.name, event.event_type, event.source);
                handler(event);
                Ok(())
            }
            None => {
                debug!("No handler for {}/{}, ignoring {}", event.event_type, event.source, event.name);
                Err(ConsentError::UnhandledEvent {
                    event_type: event.event_type.to_string(),
                    event_source: event.source.to_string(),
                })
            }
        }
    }
}
