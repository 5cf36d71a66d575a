//! In-memory event store
//!
//! All state sits behind one `RwLock`; every mutating call holds the write
//! half for its whole read-decide-write sequence, which gives the same
//! atomicity the Postgres store gets from row locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;
use crate::database::store::{capacity_changed, duplicate_registration, AdmissionLimit, EventStore, SweepCriteria};
use crate::models::{
    CapacityEntry, Event, EventAggregate, EventCapacity, EventStatus, NewEvent, NewRegistration,
    Registration, RegistrationStatus, Role,
};
use crate::utils::errors::{EventDeskError, Result};

#[derive(Debug, Default)]
struct Inner {
    events: BTreeMap<i64, Event>,
    capacities: BTreeMap<i64, Vec<EventCapacity>>,
    registrations: BTreeMap<i64, Registration>,
    next_event_id: i64,
    next_registration_id: i64,
}

impl Inner {
    fn aggregate(&self, event_id: i64) -> Option<EventAggregate> {
        self.events.get(&event_id).map(|event| EventAggregate {
            event: event.clone(),
            capacities: self.capacities.get(&event_id).cloned().unwrap_or_default(),
        })
    }

    fn count(&self, event_id: i64, role: Option<Role>, statuses: &[RegistrationStatus]) -> i64 {
        self.registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .filter(|r| role.map_or(true, |role| r.role == role))
            .filter(|r| statuses.contains(&r.status))
            .count() as i64
    }
}

fn capacity_rows(event_id: i64, entries: &[CapacityEntry]) -> Vec<EventCapacity> {
    entries
        .iter()
        .map(|entry| EventCapacity {
            event_id,
            role: entry.role,
            capacity: entry.capacity,
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn create_event(&self, new: NewEvent, capacities: Vec<CapacityEntry>) -> Result<EventAggregate> {
        let mut inner = self.inner.write().await;
        inner.next_event_id += 1;
        let id = inner.next_event_id;

        let event = Event {
            id,
            title: new.title,
            description: new.description,
            location: new.location,
            department_id: new.department_id,
            created_by: new.created_by,
            status: EventStatus::Draft,
            audience: new.audience,
            mode: new.mode,
            max_capacity: new.max_capacity,
            start_time: new.start_time,
            end_time: new.end_time,
            registration_start: new.registration_start,
            registration_end: new.registration_end,
            checkin_start: new.checkin_start,
            checkin_end: new.checkin_end,
            created_at: new.created_at,
            updated_at: new.created_at,
        };

        inner.events.insert(id, event);
        inner.capacities.insert(id, capacity_rows(id, &capacities));
        debug!(event_id = id, "Event stored");

        inner
            .aggregate(id)
            .ok_or_else(|| EventDeskError::Processing(format!("Event {} vanished after insert", id)))
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<EventAggregate>> {
        Ok(self.inner.read().await.aggregate(event_id))
    }

    async fn save_event(&self, aggregate: &EventAggregate, expected: EventStatus) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let event_id = aggregate.event.id;

        let Some(stored) = inner.events.get_mut(&event_id) else {
            return Err(EventDeskError::not_found(format!("Event {} not found", event_id)));
        };
        if stored.status != expected {
            return Ok(false);
        }

        let status = stored.status;
        *stored = aggregate.event.clone();
        stored.status = status;

        let rows = capacity_rows(event_id, &aggregate.capacity_entries());
        inner.capacities.insert(event_id, rows);
        Ok(true)
    }

    async fn set_event_status(
        &self,
        event_id: i64,
        expected: EventStatus,
        target: EventStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.events.get_mut(&event_id) {
            Some(event) if event.status == expected => {
                event.status = target;
                event.updated_at = at;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(EventDeskError::not_found(format!("Event {} not found", event_id))),
        }
    }

    async fn find_events_needing_sweep(&self, criteria: SweepCriteria) -> Result<Vec<Event>> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .values()
            .filter(|event| criteria.matches(event))
            .cloned()
            .collect())
    }

    async fn count_registrations(
        &self,
        event_id: i64,
        role: Option<Role>,
        statuses: &[RegistrationStatus],
    ) -> Result<i64> {
        Ok(self.inner.read().await.count(event_id, role, statuses))
    }

    async fn find_registration(&self, user_id: i64, event_id: i64) -> Result<Option<Registration>> {
        let inner = self.inner.read().await;
        Ok(inner
            .registrations
            .values()
            .find(|r| r.user_id == user_id && r.event_id == event_id)
            .cloned())
    }

    async fn find_registration_by_email(&self, event_id: i64, email: &str) -> Result<Option<Registration>> {
        let inner = self.inner.read().await;
        Ok(inner
            .registrations
            .values()
            .find(|r| r.event_id == event_id && r.user_email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_event_registrations(&self, event_id: i64) -> Result<Vec<Registration>> {
        let inner = self.inner.read().await;
        Ok(inner
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<Registration>> {
        let inner = self.inner.read().await;
        Ok(inner
            .registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .rev()
            .cloned()
            .collect())
    }

    async fn admit_registration(&self, new: NewRegistration, limit: AdmissionLimit) -> Result<Registration> {
        let mut inner = self.inner.write().await;

        let status = inner
            .events
            .get(&new.event_id)
            .map(|e| e.status)
            .ok_or_else(|| EventDeskError::not_found(format!("Event {} not found", new.event_id)))?;
        if status != EventStatus::Published {
            return Err(EventDeskError::state(format!(
                "Event is not open for registration (status {})",
                status
            )));
        }

        if let Some(existing) = inner
            .registrations
            .values()
            .find(|r| r.user_id == new.user_id && r.event_id == new.event_id)
        {
            return Err(duplicate_registration(Some(existing.status)));
        }

        // Role seats come from the stored row, not the caller's snapshot
        let limit = match limit {
            AdmissionLimit::Role { role, .. } => {
                let capacity = inner
                    .capacities
                    .get(&new.event_id)
                    .and_then(|rows| rows.iter().find(|row| row.role == role))
                    .map(|row| row.capacity)
                    .ok_or_else(|| capacity_changed(new.event_id, role))?;
                AdmissionLimit::Role { role, capacity }
            }
            other => other,
        };
        let (scope, capacity) = match limit {
            AdmissionLimit::Role { role, capacity } => (Some(role), Some(capacity)),
            AdmissionLimit::Overall { capacity } => (None, Some(capacity)),
            AdmissionLimit::Unlimited => (None, None),
        };
        if let Some(capacity) = capacity {
            let live = inner.count(new.event_id, scope, &RegistrationStatus::LIVE);
            if live >= i64::from(capacity) {
                return Err(limit.exhausted());
            }
        }

        inner.next_registration_id += 1;
        let registration = Registration {
            id: inner.next_registration_id,
            event_id: new.event_id,
            user_id: new.user_id,
            user_email: new.user_email,
            role: new.role,
            status: RegistrationStatus::Registered,
            checkin_code: new.checkin_code,
            created_at: new.created_at,
            canceled_at: None,
            checkin_at: None,
        };
        inner.registrations.insert(registration.id, registration.clone());
        Ok(registration)
    }

    async fn set_registration_status(
        &self,
        registration_id: i64,
        expected: RegistrationStatus,
        target: RegistrationStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Registration>> {
        let mut inner = self.inner.write().await;
        let registration = inner.registrations.get_mut(&registration_id).ok_or_else(|| {
            EventDeskError::not_found(format!("Registration {} not found", registration_id))
        })?;

        if registration.status != expected {
            return Ok(None);
        }

        registration.status = target;
        match target {
            RegistrationStatus::Canceled => registration.canceled_at = Some(at),
            RegistrationStatus::Attended => registration.checkin_at = Some(at),
            RegistrationStatus::Registered | RegistrationStatus::Absent => {}
        }
        Ok(Some(registration.clone()))
    }

    async fn mark_absentees(&self, event_id: i64) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut marked = 0;
        for registration in inner.registrations.values_mut() {
            if registration.event_id == event_id && registration.status == RegistrationStatus::Registered {
                registration.status = RegistrationStatus::Absent;
                marked += 1;
            }
        }
        Ok(marked)
    }
}
