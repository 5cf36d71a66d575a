//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod principal;
pub mod registration;
pub mod role;

// Re-export commonly used models
pub use event::{
    Audience, CapacityEntry, CreateEventRequest, Event, EventAggregate, EventCapacity, EventMode,
    EventStatus, NewEvent, UpdateEventRequest,
};
pub use principal::Principal;
pub use registration::{NewRegistration, Registration, RegistrationStatus};
pub use role::Role;
