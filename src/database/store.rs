//! Persistence interface used by the services
//!
//! Every mutating method that touches a shared counter or status is a single
//! atomic unit: status changes are compare-and-set, and admission counts live
//! registrations and inserts the new one without letting another admission for
//! the same key in between.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::models::{
    CapacityEntry, Event, EventAggregate, EventStatus, NewEvent, NewRegistration, Registration,
    RegistrationStatus, Role,
};
use crate::utils::errors::{EventDeskError, Result};

/// Seat limit applied to one admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionLimit {
    /// Live registrations under `role` must stay below `capacity`
    Role { role: Role, capacity: i32 },
    /// Live registrations across all roles must stay below `capacity`
    Overall { capacity: i32 },
    Unlimited,
}

impl AdmissionLimit {
    /// Error returned when the limit is exhausted
    pub fn exhausted(&self) -> EventDeskError {
        match self {
            AdmissionLimit::Role { role, capacity } => EventDeskError::conflict(format!(
                "No seats left for role {} (capacity {})",
                role, capacity
            )),
            AdmissionLimit::Overall { capacity } => EventDeskError::conflict(format!(
                "Event is full (capacity {})",
                capacity
            )),
            AdmissionLimit::Unlimited => EventDeskError::conflict("Event is full"),
        }
    }
}

/// Selection used by the lifecycle sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepCriteria {
    /// PUBLISHED events whose registration window closed before `now`
    RegistrationEnded { now: DateTime<Utc> },
    /// CLOSED events that ended before `now`
    EventEnded { now: DateTime<Utc> },
}

impl SweepCriteria {
    pub fn status(&self) -> EventStatus {
        match self {
            SweepCriteria::RegistrationEnded { .. } => EventStatus::Published,
            SweepCriteria::EventEnded { .. } => EventStatus::Closed,
        }
    }

    pub fn target(&self) -> EventStatus {
        match self {
            SweepCriteria::RegistrationEnded { .. } => EventStatus::Closed,
            SweepCriteria::EventEnded { .. } => EventStatus::Completed,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        match self {
            SweepCriteria::RegistrationEnded { now } => {
                event.status == EventStatus::Published && event.registration_end < *now
            }
            SweepCriteria::EventEnded { now } => {
                event.status == EventStatus::Closed && event.end_time < *now
            }
        }
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a DRAFT event and its capacity set in one unit
    async fn create_event(&self, event: NewEvent, capacities: Vec<CapacityEntry>) -> Result<EventAggregate>;

    async fn find_event(&self, event_id: i64) -> Result<Option<EventAggregate>>;

    /// Persist payload fields and replace the capacity set, only if the stored
    /// status still equals `expected`. Returns `false` when it does not.
    async fn save_event(&self, aggregate: &EventAggregate, expected: EventStatus) -> Result<bool>;

    /// Compare-and-set on the event status
    async fn set_event_status(
        &self,
        event_id: i64,
        expected: EventStatus,
        target: EventStatus,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn find_events_needing_sweep(&self, criteria: SweepCriteria) -> Result<Vec<Event>>;

    /// Count registrations for an event, optionally for one role, in any of `statuses`
    async fn count_registrations(
        &self,
        event_id: i64,
        role: Option<Role>,
        statuses: &[RegistrationStatus],
    ) -> Result<i64>;

    async fn find_registration(&self, user_id: i64, event_id: i64) -> Result<Option<Registration>>;

    async fn find_registration_by_email(&self, event_id: i64, email: &str) -> Result<Option<Registration>>;

    async fn list_event_registrations(&self, event_id: i64) -> Result<Vec<Registration>>;

    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<Registration>>;

    /// Admit a registration atomically: the event must still be PUBLISHED, the
    /// user must have no prior registration for it, and `limit` must not be
    /// exhausted.
    async fn admit_registration(&self, registration: NewRegistration, limit: AdmissionLimit) -> Result<Registration>;

    /// Compare-and-set on a registration status. Stamps `canceled_at` or
    /// `checkin_at` with `at` as the target requires. Returns `None` when the
    /// stored status no longer equals `expected`.
    async fn set_registration_status(
        &self,
        registration_id: i64,
        expected: RegistrationStatus,
        target: RegistrationStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Registration>>;

    /// Move every REGISTERED row of an event to ABSENT
    async fn mark_absentees(&self, event_id: i64) -> Result<u64>;
}

/// Error for a registration that already exists for (user, event)
pub(crate) fn duplicate_registration(existing: Option<RegistrationStatus>) -> EventDeskError {
    match existing {
        Some(RegistrationStatus::Canceled) => EventDeskError::conflict(
            "Registration was canceled and cannot be created again for this event",
        ),
        _ => EventDeskError::conflict("User is already registered for this event"),
    }
}

/// The role's capacity row is gone, so the caller's view of the event is stale
pub(crate) fn capacity_changed(event_id: i64, role: Role) -> EventDeskError {
    EventDeskError::state(format!(
        "Capacity for role {} on event {} changed while registering; retry",
        role, event_id
    ))
}
