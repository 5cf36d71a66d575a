//! Registration workflow
//!
//! Create, cancel and check-in for event registrations. Preconditions are
//! checked against a snapshot, and every write is conditioned on the state it
//! was decided on: admission is one atomic store call, and cancel/check-in are
//! compare-and-set on the registration status.

use chrono::Duration;
use std::sync::Arc;
use crate::config::RegistrationConfig;
use crate::database::store::duplicate_registration;
use crate::database::EventStore;
use crate::models::{
    EventAggregate, EventStatus, NewRegistration, Principal, Registration, RegistrationStatus,
};
use crate::services::admission::CapacityValidator;
use crate::services::notification::{Notification, NotificationService};
use crate::services::token::CheckinTokenCodec;
use crate::utils::clock::Clock;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::helpers::{is_valid_email, normalize_email};
use crate::utils::logging::{log_registration_action, log_rejection};

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    codec: CheckinTokenCodec,
    notifications: NotificationService,
    cancel_cutoff: Duration,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        codec: CheckinTokenCodec,
        notifications: NotificationService,
        config: &RegistrationConfig,
    ) -> Result<Self> {
        Ok(Self {
            store,
            clock,
            codec,
            notifications,
            cancel_cutoff: config.cancel_cutoff()?,
        })
    }

    /// Register the caller for an event
    pub async fn register(&self, principal: &Principal, event_id: i64) -> Result<Registration> {
        let result = self.try_register(principal, event_id).await;
        match &result {
            Ok(registration) => {
                log_registration_action(event_id, principal.user_id, "register", Some(registration.role.as_str()))
            }
            Err(e) => log_rejection(event_id, principal.user_id, "register", e),
        }
        result
    }

    async fn try_register(&self, principal: &Principal, event_id: i64) -> Result<Registration> {
        let aggregate = self.load_event(event_id).await?;
        let event = &aggregate.event;
        let now = self.clock.now();

        ensure_published(event.status)?;
        if !event.registration_open_at(now) {
            return Err(EventDeskError::state("Registration window is not open"));
        }

        if let Some(existing) = self.store.find_registration(principal.user_id, event_id).await? {
            return Err(duplicate_registration(Some(existing.status)));
        }

        let role = principal.admission_role(event.audience).ok_or_else(|| {
            EventDeskError::forbidden(format!(
                "User holds no role admitted by audience {}",
                event.audience
            ))
        })?;

        let email = normalize_email(&principal.email);
        if !is_valid_email(&email) {
            return Err(EventDeskError::validation(format!("Invalid email: {}", principal.email)));
        }
        let checkin_code = self.codec.encode(&email, event_id)?;

        let new = NewRegistration {
            event_id,
            user_id: principal.user_id,
            user_email: email,
            role,
            checkin_code,
            created_at: now,
        };
        let limit = CapacityValidator::resolve_limit(&aggregate, role);
        let registration = self.store.admit_registration(new, limit).await?;

        self.notifications.dispatch(Notification::confirmed(&registration, event));
        Ok(registration)
    }

    /// Cancel the caller's registration for an event
    pub async fn cancel(&self, principal: &Principal, event_id: i64) -> Result<Registration> {
        let result = self.try_cancel(principal, event_id).await;
        match &result {
            Ok(_) => log_registration_action(event_id, principal.user_id, "cancel", None),
            Err(e) => log_rejection(event_id, principal.user_id, "cancel", e),
        }
        result
    }

    async fn try_cancel(&self, principal: &Principal, event_id: i64) -> Result<Registration> {
        let aggregate = self.load_event(event_id).await?;
        let event = &aggregate.event;
        let now = self.clock.now();

        let registration = self
            .store
            .find_registration(principal.user_id, event_id)
            .await?
            .ok_or_else(|| EventDeskError::not_found("No registration found for this event"))?;

        match registration.status {
            RegistrationStatus::Registered => {}
            RegistrationStatus::Canceled => return Err(EventDeskError::state("Registration is already canceled")),
            RegistrationStatus::Attended => {
                return Err(EventDeskError::state("Registration was already checked in"))
            }
            RegistrationStatus::Absent => return Err(EventDeskError::state("Registration is marked absent")),
        }

        ensure_published(event.status)?;
        if !event.registration_open_at(now) {
            return Err(EventDeskError::state("Registration window is not open"));
        }
        if now + self.cancel_cutoff > event.start_time {
            return Err(EventDeskError::state(format!(
                "Registrations must cancel at least {} before start",
                describe_cutoff(self.cancel_cutoff)
            )));
        }

        let canceled = self
            .store
            .set_registration_status(registration.id, RegistrationStatus::Registered, RegistrationStatus::Canceled, now)
            .await?
            .ok_or_else(|| EventDeskError::state("Registration changed concurrently and was not canceled"))?;

        self.notifications.dispatch(Notification::canceled(&canceled, event));
        Ok(canceled)
    }

    /// Check in the registration of `email` for an event
    pub async fn check_in(&self, principal: &Principal, event_id: i64, email: &str) -> Result<Registration> {
        let result = self.try_check_in(principal, event_id, email).await;
        match &result {
            Ok(registration) => log_registration_action(event_id, registration.user_id, "check_in", None),
            Err(e) => log_rejection(event_id, principal.user_id, "check_in", e),
        }
        result
    }

    /// Decode a check-in token and check in the registration it names
    pub async fn check_in_with_token(&self, principal: &Principal, token: &str) -> Result<Registration> {
        let (email, event_id) = self.codec.decode(token)?;
        self.check_in(principal, event_id, &email).await
    }

    async fn try_check_in(&self, principal: &Principal, event_id: i64, email: &str) -> Result<Registration> {
        if !principal.can_check_in(event_id) {
            return Err(EventDeskError::forbidden("Caller is not check-in staff for this event"));
        }

        let aggregate = self.load_event(event_id).await?;
        let event = &aggregate.event;
        let now = self.clock.now();

        let registration = self
            .store
            .find_registration_by_email(event_id, &normalize_email(email))
            .await?
            .ok_or_else(|| EventDeskError::not_found(format!("No registration for {} at this event", email)))?;

        match registration.status {
            RegistrationStatus::Registered => {}
            RegistrationStatus::Canceled => return Err(EventDeskError::state("Registration was canceled")),
            RegistrationStatus::Attended => {
                return Err(EventDeskError::state("Registration is already checked in"))
            }
            RegistrationStatus::Absent => return Err(EventDeskError::state("Registration is marked absent")),
        }

        if let Some(start) = event.checkin_start {
            if now < start {
                return Err(EventDeskError::state("Check-in has not started"));
            }
        }
        if let Some(end) = event.checkin_end {
            if now > end {
                return Err(EventDeskError::state("Check-in has ended"));
            }
        }

        self.store
            .set_registration_status(registration.id, RegistrationStatus::Registered, RegistrationStatus::Attended, now)
            .await?
            .ok_or_else(|| EventDeskError::state("Registration changed concurrently and was not checked in"))
    }

    /// The caller's registrations, newest first
    pub async fn my_registrations(&self, principal: &Principal) -> Result<Vec<Registration>> {
        self.store.list_user_registrations(principal.user_id).await
    }

    /// Every registration of an event; event managers and check-in staff only
    pub async fn event_registrations(&self, principal: &Principal, event_id: i64) -> Result<Vec<Registration>> {
        let aggregate = self.load_event(event_id).await?;
        if !principal.can_manage(&aggregate.event) && !principal.can_check_in(event_id) {
            return Err(EventDeskError::forbidden("Caller cannot view registrations of this event"));
        }
        self.store.list_event_registrations(event_id).await
    }

    /// Check-in token of the caller's active registration, for QR rendering
    pub async fn checkin_token(&self, principal: &Principal, event_id: i64) -> Result<String> {
        let registration = self
            .store
            .find_registration(principal.user_id, event_id)
            .await?
            .ok_or_else(|| EventDeskError::not_found("No registration found for this event"))?;

        if registration.status != RegistrationStatus::Registered {
            return Err(EventDeskError::state(format!(
                "Registration is {} and has no usable check-in token",
                registration.status
            )));
        }
        Ok(registration.checkin_code)
    }

    async fn load_event(&self, event_id: i64) -> Result<EventAggregate> {
        let aggregate = self
            .store
            .find_event(event_id)
            .await?
            .ok_or_else(|| EventDeskError::not_found(format!("Event {} not found", event_id)))?;
        if aggregate.event.status == EventStatus::Deleted {
            return Err(EventDeskError::not_found(format!("Event {} not found", event_id)));
        }
        Ok(aggregate)
    }
}

fn ensure_published(status: EventStatus) -> Result<()> {
    if status != EventStatus::Published {
        return Err(EventDeskError::state(format!(
            "Event is not open for registration (status {})",
            status
        )));
    }
    Ok(())
}

fn describe_cutoff(cutoff: Duration) -> String {
    let hours = cutoff.num_hours();
    match (hours % 24, hours / 24) {
        (0, 1) => "1 day".to_string(),
        (0, days) if days > 1 => format!("{} days", days),
        (_, _) if hours == 1 => "1 hour".to_string(),
        _ => format!("{} hours", hours),
    }
}
