//! Database service layer
//!
//! `DatabaseService` bundles the Postgres repositories and implements
//! [`EventStore`] on top of them. Multi-statement operations run inside one
//! transaction; admission serializes on the `(event, role)` capacity row, or on
//! the event row when only an overall limit applies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::debug;
use crate::database::store::{capacity_changed, duplicate_registration, AdmissionLimit, EventStore, SweepCriteria};
use crate::database::{CapacityRepository, DatabasePool, EventRepository, RegistrationRepository};
use crate::models::*;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::logging::log_database_operation;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub events: EventRepository,
    pub capacities: CapacityRepository,
    pub registrations: RegistrationRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            capacities: CapacityRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            pool,
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl EventStore for DatabaseService {
    async fn create_event(&self, event: NewEvent, capacities: Vec<CapacityEntry>) -> Result<EventAggregate> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        let event = EventRepository::insert(&mut *tx, &event).await?;
        let capacities = CapacityRepository::replace_all(&mut *tx, event.id, &capacities).await?;
        tx.commit().await?;

        log_database_operation("create_event", "events", started.elapsed().as_millis() as u64, true);
        Ok(EventAggregate { event, capacities })
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<EventAggregate>> {
        let Some(event) = self.events.find_by_id(event_id).await? else {
            return Ok(None);
        };
        let capacities = self.capacities.list_for_event(event_id).await?;
        Ok(Some(EventAggregate { event, capacities }))
    }

    async fn save_event(&self, aggregate: &EventAggregate, expected: EventStatus) -> Result<bool> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        let updated = EventRepository::update_if_status(&mut *tx, &aggregate.event, expected).await?;
        if !updated {
            tx.rollback().await?;
            return Ok(false);
        }
        CapacityRepository::replace_all(&mut *tx, aggregate.event.id, &aggregate.capacity_entries()).await?;
        tx.commit().await?;

        log_database_operation("save_event", "events", started.elapsed().as_millis() as u64, true);
        Ok(true)
    }

    async fn set_event_status(
        &self,
        event_id: i64,
        expected: EventStatus,
        target: EventStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        if self.events.set_status_if(event_id, expected, target, at).await? {
            return Ok(true);
        }
        match self.events.find_by_id(event_id).await? {
            Some(_) => Ok(false),
            None => Err(EventDeskError::not_found(format!("Event {} not found", event_id))),
        }
    }

    async fn find_events_needing_sweep(&self, criteria: SweepCriteria) -> Result<Vec<Event>> {
        self.events.find_sweep_candidates(criteria).await
    }

    async fn count_registrations(
        &self,
        event_id: i64,
        role: Option<Role>,
        statuses: &[RegistrationStatus],
    ) -> Result<i64> {
        self.registrations.count(event_id, role, statuses).await
    }

    async fn find_registration(&self, user_id: i64, event_id: i64) -> Result<Option<Registration>> {
        self.registrations.find_by_user_and_event(user_id, event_id).await
    }

    async fn find_registration_by_email(&self, event_id: i64, email: &str) -> Result<Option<Registration>> {
        self.registrations.find_by_email(event_id, email).await
    }

    async fn list_event_registrations(&self, event_id: i64) -> Result<Vec<Registration>> {
        self.registrations.list_for_event(event_id).await
    }

    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<Registration>> {
        self.registrations.list_for_user(user_id).await
    }

    async fn admit_registration(&self, new: NewRegistration, limit: AdmissionLimit) -> Result<Registration> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        // An overall limit serializes on the event row itself, so take it
        // exclusively up front rather than upgrading a share lock later.
        let exclusive = matches!(limit, AdmissionLimit::Overall { .. });
        let status = EventRepository::locked_status(&mut *tx, new.event_id, exclusive)
            .await?
            .ok_or_else(|| EventDeskError::not_found(format!("Event {} not found", new.event_id)))?;
        if status != EventStatus::Published {
            return Err(EventDeskError::state(format!(
                "Event is not open for registration (status {})",
                status
            )));
        }

        // A missing row means the capacity set was replaced after the caller
        // read it; without the row there is nothing to serialize on
        let limit = match limit {
            AdmissionLimit::Role { role, .. } => {
                let capacity = CapacityRepository::lock_for_update(&mut *tx, new.event_id, role)
                    .await?
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

        if let Some(existing) = RegistrationRepository::existing_status(&mut *tx, new.user_id, new.event_id).await? {
            return Err(duplicate_registration(Some(existing)));
        }

        if let Some(capacity) = capacity {
            let live = RegistrationRepository::count_in(&mut *tx, new.event_id, scope, &RegistrationStatus::LIVE).await?;
            if live >= i64::from(capacity) {
                debug!(event_id = new.event_id, live = live, capacity = capacity, "Admission limit reached");
                return Err(limit.exhausted());
            }
        }

        let registration = match RegistrationRepository::insert(&mut *tx, &new).await {
            Ok(registration) => registration,
            Err(e) if is_unique_violation(&e) => return Err(duplicate_registration(None)),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        log_database_operation("admit_registration", "registrations", started.elapsed().as_millis() as u64, true);
        Ok(registration)
    }

    async fn set_registration_status(
        &self,
        registration_id: i64,
        expected: RegistrationStatus,
        target: RegistrationStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Registration>> {
        if let Some(updated) = self.registrations.set_status_if(registration_id, expected, target, at).await? {
            return Ok(Some(updated));
        }
        match self.registrations.find_by_id(registration_id).await? {
            Some(_) => Ok(None),
            None => Err(EventDeskError::not_found(format!("Registration {} not found", registration_id))),
        }
    }

    async fn mark_absentees(&self, event_id: i64) -> Result<u64> {
        self.registrations.mark_absent(event_id).await
    }
}
