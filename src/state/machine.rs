//! Event lifecycle state machine
//!
//! The transition table below is the only authority on whether an event may
//! move from one status to another. Manual operator changes and the lifecycle
//! sweep both call [`validate_transition`] before writing a new status.

use crate::models::EventStatus;
use crate::utils::errors::{EventDeskError, Result};

/// Statuses reachable from `current`
pub fn allowed_transitions(current: EventStatus) -> &'static [EventStatus] {
    match current {
        EventStatus::Draft => &[EventStatus::Published],
        EventStatus::Published => &[EventStatus::Closed, EventStatus::Blocked, EventStatus::Canceled],
        EventStatus::Closed => &[EventStatus::Completed, EventStatus::Canceled],
        EventStatus::Blocked => &[EventStatus::Published, EventStatus::Canceled],
        EventStatus::Canceled | EventStatus::Completed | EventStatus::Deleted => &[],
    }
}

pub fn can_transition(current: EventStatus, target: EventStatus) -> bool {
    allowed_transitions(current).contains(&target)
}

/// Fail with the disallowed pair and the allowed set when `target` is not reachable
pub fn validate_transition(current: EventStatus, target: EventStatus) -> Result<()> {
    if can_transition(current, target) {
        return Ok(());
    }

    Err(EventDeskError::InvalidStateTransition {
        from: current.to_string(),
        to: target.to_string(),
        allowed: allowed_transitions(current)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })
}

pub fn is_terminal(status: EventStatus) -> bool {
    allowed_transitions(status).is_empty()
}
