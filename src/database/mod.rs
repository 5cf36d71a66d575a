//! Database module
//!
//! This module defines the persistence interface and its Postgres and
//! in-memory implementations.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check};
pub use memory::InMemoryStore;
pub use repositories::{CapacityRepository, EventRepository, RegistrationRepository};
pub use service::DatabaseService;
pub use store::{AdmissionLimit, EventStore, SweepCriteria};
