//! EDGECONSENT Core Library
//! 
//! Consent document model, error types, configuration, and the durable
//! store contract shared by every EDGECONSENT crate.

pub mod document;
pub mod traits;
pub mod error;
pub mod config;

pub use document::*;
pub use traits::*;
pub use error::*;
pub use config::*;
