//! Admission control
//!
//! Capacity rules checked when an event's capacities are authored or changed,
//! and the seat limit applied when a registration is admitted.

use std::collections::HashSet;
use crate::database::AdmissionLimit;
use crate::models::{Audience, CapacityEntry, EventAggregate, Role};
use crate::services::ledger::CapacityLedger;
use crate::utils::errors::{EventDeskError, Result};

#[derive(Clone)]
pub struct CapacityValidator {
    ledger: CapacityLedger,
}

impl CapacityValidator {
    pub fn new(ledger: CapacityLedger) -> Self {
        Self { ledger }
    }

    /// Check a declared capacity set against the audience and overall limit.
    ///
    /// - A single-role audience may omit capacities; if present they may only
    ///   name that role.
    /// - `BOTH` requires exactly one capacity per participant role.
    /// - Every capacity is positive, and when `max_capacity` is set the
    ///   per-role capacities add up to it exactly.
    pub fn validate_declaration(
        audience: Audience,
        max_capacity: Option<i32>,
        entries: &[CapacityEntry],
    ) -> Result<()> {
        if let Some(max) = max_capacity {
            if max <= 0 {
                return Err(EventDeskError::validation("Max capacity must be a positive integer"));
            }
        }

        let mut seen = HashSet::new();
        for entry in entries {
            if !entry.role.is_participant() {
                return Err(EventDeskError::validation(format!(
                    "Role {} cannot hold event capacity",
                    entry.role
                )));
            }
            if !seen.insert(entry.role) {
                return Err(EventDeskError::validation(format!(
                    "Capacity for role {} is declared more than once",
                    entry.role
                )));
            }
            if entry.capacity <= 0 {
                return Err(EventDeskError::validation(format!(
                    "Capacity for role {} must be a positive integer",
                    entry.role
                )));
            }
            if !audience.admits(entry.role) {
                return Err(EventDeskError::validation(format!(
                    "Capacity for role {} does not match audience {}",
                    entry.role, audience
                )));
            }
        }

        if audience == Audience::Both {
            if let Some(missing) = audience.roles().iter().find(|role| !seen.contains(*role)) {
                return Err(EventDeskError::validation(format!(
                    "Audience BOTH requires a capacity for role {}",
                    missing
                )));
            }
        }

        if let (Some(max), false) = (max_capacity, entries.is_empty()) {
            let sum: i64 = entries.iter().map(|e| i64::from(e.capacity)).sum();
            if sum != i64::from(max) {
                return Err(EventDeskError::validation(format!(
                    "Role capacities add up to {} but max capacity is {}",
                    sum, max
                )));
            }
        }

        Ok(())
    }

    /// Check a change to an existing event against its live registrations.
    ///
    /// Rejects dropping a role that still has live registrations from the
    /// audience, lowering a role capacity below its live count and lowering the
    /// overall limit below the total live count.
    pub async fn validate_change(
        &self,
        current: &EventAggregate,
        audience: Audience,
        max_capacity: Option<i32>,
        entries: &[CapacityEntry],
    ) -> Result<()> {
        let event_id = current.event.id;

        for role in current.event.audience.roles() {
            if audience.admits(*role) {
                continue;
            }
            let live = self.ledger.live_count(event_id, Some(*role)).await?;
            if live > 0 {
                return Err(EventDeskError::conflict(format!(
                    "Cannot switch audience to {}: role {} has {} live registrations",
                    audience, role, live
                )));
            }
        }

        for entry in entries {
            let live = self.ledger.live_count(event_id, Some(entry.role)).await?;
            if i64::from(entry.capacity) < live {
                return Err(EventDeskError::conflict(format!(
                    "Capacity for role {} cannot be below its {} live registrations",
                    entry.role, live
                )));
            }
        }

        if let Some(max) = max_capacity {
            let live = self.ledger.live_count(event_id, None).await?;
            if i64::from(max) < live {
                return Err(EventDeskError::conflict(format!(
                    "Max capacity cannot be below the {} live registrations",
                    live
                )));
            }
        }

        Ok(())
    }

    /// Seat limit that applies to a registrant admitted under `role`
    pub fn resolve_limit(aggregate: &EventAggregate, role: Role) -> AdmissionLimit {
        if let Some(capacity) = aggregate.capacity_for(role) {
            return AdmissionLimit::Role { role, capacity };
        }
        match aggregate.event.max_capacity {
            Some(capacity) => AdmissionLimit::Overall { capacity },
            None => AdmissionLimit::Unlimited,
        }
    }
}
