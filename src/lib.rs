//! EventDesk
//!
//! Event lifecycle and capacity-bounded registration. This library provides
//! the event status state machine and its periodic sweep, per-role admission
//! control, the registration/cancellation/check-in workflow and the check-in
//! token codec, over a pluggable persistence store.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ErrorKind, EventDeskError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, EventStore, InMemoryStore};
pub use services::ServiceFactory;
pub use state::{LifecycleSweep, SweepRunner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
