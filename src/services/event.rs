//! Event authoring and manual status changes

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use crate::database::EventStore;
use crate::models::{
    CapacityEntry, CreateEventRequest, Event, EventAggregate, EventCapacity, EventStatus, NewEvent,
    Principal, UpdateEventRequest,
};
use crate::services::admission::CapacityValidator;
use crate::services::ledger::{CapacityLedger, CapacityReport};
use crate::state::machine::validate_transition;
use crate::utils::clock::Clock;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::helpers::{format_timestamp, normalize_whitespace};
use crate::utils::logging::{log_status_transition, log_transition_conflict};

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    ledger: CapacityLedger,
    validator: CapacityValidator,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        let ledger = CapacityLedger::new(Arc::clone(&store));
        Self {
            validator: CapacityValidator::new(ledger.clone()),
            ledger,
            store,
            clock,
        }
    }

    /// Create a DRAFT event with its capacity set
    pub async fn create_event(&self, principal: &Principal, request: CreateEventRequest) -> Result<EventAggregate> {
        if !principal.can_author_in(request.department_id) {
            return Err(EventDeskError::forbidden("Caller cannot create events in this department"));
        }

        let title = normalize_title(&request.title)?;
        validate_schedule(
            request.registration_start,
            request.registration_end,
            request.start_time,
            request.end_time,
            request.checkin_start,
            request.checkin_end,
        )?;
        CapacityValidator::validate_declaration(request.audience, request.max_capacity, &request.capacities)?;

        let new = NewEvent {
            title,
            description: request.description,
            location: request.location,
            department_id: request.department_id,
            created_by: principal.user_id,
            audience: request.audience,
            mode: request.mode,
            max_capacity: request.max_capacity,
            start_time: request.start_time,
            end_time: request.end_time,
            registration_start: request.registration_start,
            registration_end: request.registration_end,
            checkin_start: request.checkin_start,
            checkin_end: request.checkin_end,
            created_at: self.clock.now(),
        };

        let aggregate = self.store.create_event(new, request.capacities).await?;
        info!(
            event_id = aggregate.event.id,
            created_by = principal.user_id,
            audience = %aggregate.event.audience,
            "Event created"
        );
        Ok(aggregate)
    }

    /// Update an event while it is DRAFT or BLOCKED. A `capacities` field
    /// replaces the whole capacity set.
    pub async fn update_event(
        &self,
        principal: &Principal,
        event_id: i64,
        request: UpdateEventRequest,
    ) -> Result<EventAggregate> {
        let current = self.get_event(event_id).await?;
        self.ensure_manager(principal, &current.event)?;

        let expected = current.event.status;
        if !expected.is_editable() {
            return Err(EventDeskError::state(format!(
                "Event can only be edited while DRAFT or BLOCKED (status {})",
                expected
            )));
        }

        let mut event = current.event.clone();
        if let Some(title) = request.title {
            event.title = normalize_title(&title)?;
        }
        if let Some(description) = request.description {
            event.description = description;
        }
        if let Some(location) = request.location {
            event.location = location;
        }
        if let Some(audience) = request.audience {
            event.audience = audience;
        }
        if let Some(mode) = request.mode {
            event.mode = mode;
        }
        if let Some(max_capacity) = request.max_capacity {
            event.max_capacity = max_capacity;
        }
        event.start_time = request.start_time.unwrap_or(event.start_time);
        event.end_time = request.end_time.unwrap_or(event.end_time);
        event.registration_start = request.registration_start.unwrap_or(event.registration_start);
        event.registration_end = request.registration_end.unwrap_or(event.registration_end);
        if let Some(checkin_start) = request.checkin_start {
            event.checkin_start = checkin_start;
        }
        if let Some(checkin_end) = request.checkin_end {
            event.checkin_end = checkin_end;
        }

        validate_schedule(
            event.registration_start,
            event.registration_end,
            event.start_time,
            event.end_time,
            event.checkin_start,
            event.checkin_end,
        )?;

        let entries = request.capacities.unwrap_or_else(|| current.capacity_entries());
        CapacityValidator::validate_declaration(event.audience, event.max_capacity, &entries)?;
        self.validator
            .validate_change(&current, event.audience, event.max_capacity, &entries)
            .await?;

        event.updated_at = self.clock.now();
        let capacities = entries
            .iter()
            .map(|entry| EventCapacity {
                event_id,
                role: entry.role,
                capacity: entry.capacity,
            })
            .collect();
        let updated = EventAggregate { event, capacities };

        if !self.store.save_event(&updated, expected).await? {
            return Err(EventDeskError::state(
                "Event status changed concurrently; reload and retry the update",
            ));
        }

        info!(event_id = event_id, updated_by = principal.user_id, "Event updated");
        self.get_event(event_id).await
    }

    /// Replace the capacity set alone
    pub async fn replace_capacities(
        &self,
        principal: &Principal,
        event_id: i64,
        capacities: Vec<CapacityEntry>,
    ) -> Result<EventAggregate> {
        let request = UpdateEventRequest {
            capacities: Some(capacities),
            ..UpdateEventRequest::default()
        };
        self.update_event(principal, event_id, request).await
    }

    /// Load an event; soft-deleted events are not found
    pub async fn get_event(&self, event_id: i64) -> Result<EventAggregate> {
        match self.store.find_event(event_id).await? {
            Some(aggregate) if aggregate.event.status != EventStatus::Deleted => Ok(aggregate),
            _ => Err(EventDeskError::not_found(format!("Event {} not found", event_id))),
        }
    }

    pub async fn capacity_report(&self, event_id: i64) -> Result<CapacityReport> {
        let aggregate = self.get_event(event_id).await?;
        self.ledger.report(&aggregate).await
    }

    /// Move an event to `target` through the state machine
    pub async fn change_status(&self, principal: &Principal, event_id: i64, target: EventStatus) -> Result<Event> {
        let aggregate = self.get_event(event_id).await?;
        self.ensure_manager(principal, &aggregate.event)?;

        let current = aggregate.event.status;
        validate_transition(current, target)?;
        self.apply_status(event_id, current, target, principal.user_id).await
    }

    pub async fn publish(&self, principal: &Principal, event_id: i64) -> Result<Event> {
        self.change_status(principal, event_id, EventStatus::Published).await
    }

    pub async fn close(&self, principal: &Principal, event_id: i64) -> Result<Event> {
        self.change_status(principal, event_id, EventStatus::Closed).await
    }

    pub async fn block(&self, principal: &Principal, event_id: i64) -> Result<Event> {
        self.change_status(principal, event_id, EventStatus::Blocked).await
    }

    pub async fn unblock(&self, principal: &Principal, event_id: i64) -> Result<Event> {
        self.change_status(principal, event_id, EventStatus::Published).await
    }

    pub async fn cancel(&self, principal: &Principal, event_id: i64) -> Result<Event> {
        self.change_status(principal, event_id, EventStatus::Canceled).await
    }

    /// Soft-delete a DRAFT event
    pub async fn delete_event(&self, principal: &Principal, event_id: i64) -> Result<Event> {
        let aggregate = self.get_event(event_id).await?;
        self.ensure_manager(principal, &aggregate.event)?;

        let current = aggregate.event.status;
        if current != EventStatus::Draft {
            return Err(EventDeskError::state(format!(
                "Only DRAFT events can be deleted (status {})",
                current
            )));
        }
        self.apply_status(event_id, current, EventStatus::Deleted, principal.user_id).await
    }

    async fn apply_status(
        &self,
        event_id: i64,
        expected: EventStatus,
        target: EventStatus,
        actor: i64,
    ) -> Result<Event> {
        let now = self.clock.now();
        if !self.store.set_event_status(event_id, expected, target, now).await? {
            log_transition_conflict(event_id, expected.as_str(), target.as_str());
            return Err(EventDeskError::state(format!(
                "Event status is no longer {}; transition to {} was not applied",
                expected, target
            )));
        }
        log_status_transition(event_id, expected.as_str(), target.as_str(), Some(actor));

        self.store
            .find_event(event_id)
            .await?
            .map(|aggregate| aggregate.event)
            .ok_or_else(|| EventDeskError::not_found(format!("Event {} not found", event_id)))
    }

    fn ensure_manager(&self, principal: &Principal, event: &Event) -> Result<()> {
        if principal.can_manage(event) {
            return Ok(());
        }
        Err(EventDeskError::forbidden("Caller cannot manage this event"))
    }
}

fn normalize_title(title: &str) -> Result<String> {
    let title = normalize_whitespace(title);
    if title.is_empty() {
        return Err(EventDeskError::validation("Event title is required"));
    }
    Ok(title)
}

/// registration_start <= registration_end <= start_time <= end_time, and an
/// optional check-in window that is not inverted
fn validate_schedule(
    registration_start: DateTime<Utc>,
    registration_end: DateTime<Utc>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    checkin_start: Option<DateTime<Utc>>,
    checkin_end: Option<DateTime<Utc>>,
) -> Result<()> {
    let ordered = [
        ("registration start", registration_start, "registration end", registration_end),
        ("registration end", registration_end, "event start", start_time),
        ("event start", start_time, "event end", end_time),
    ];
    for (earlier_name, earlier, later_name, later) in ordered {
        if earlier > later {
            return Err(EventDeskError::validation(format!(
                "{} ({}) must not be after {} ({})",
                earlier_name,
                format_timestamp(earlier),
                later_name,
                format_timestamp(later)
            )));
        }
    }

    if let (Some(start), Some(end)) = (checkin_start, checkin_end) {
        if start > end {
            return Err(EventDeskError::validation("Check-in start must not be after check-in end"));
        }
    }
    Ok(())
}
