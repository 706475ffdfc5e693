//! EDGECONSENT State Management
//! 
//! Holds the current consent document, merges partial updates into it,
//! and keeps it persisted in a durable preference store.

pub mod store;
pub mod memory;
pub mod persistent;
pub mod manager;

pub use store::*;
pub use memory::*;
pub use persistent::*;
pub use manager::*;
