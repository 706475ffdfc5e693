//! EDGECONSENT Extension
//! 
//! Connects the consent state manager to an event-driven host:
//! - Typed events and a (type, source) dispatch table
//! - Consent update, server response, and configuration handling
//! - Default consents layered under user consents
//! - Consent change notifications

pub mod event;
pub mod dispatch;
pub mod extension;

pub use event::*;
pub use dispatch::*;
pub use extension::*;
