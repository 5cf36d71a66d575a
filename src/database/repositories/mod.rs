//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod capacity;
pub mod event;
pub mod registration;

// Re-export repositories
pub use capacity::CapacityRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
