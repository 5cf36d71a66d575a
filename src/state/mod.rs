//! Event lifecycle
//!
//! This module holds the status state machine and the periodic sweep that
//! advances events through their time-driven transitions.

pub mod machine;
pub mod sweep;

pub use machine::{allowed_transitions, can_transition, is_terminal, validate_transition};
pub use sweep::{LifecycleSweep, SweepReport, SweepRunner};
