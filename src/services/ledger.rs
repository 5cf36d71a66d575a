//! Capacity ledger
//!
//! Answers how many seats an event declares per role and how many of them are
//! taken by live (REGISTERED or ATTENDED) registrations.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::database::EventStore;
use crate::models::{EventAggregate, RegistrationStatus, Role};
use crate::utils::errors::Result;

/// Seat usage for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUsage {
    pub role: Role,
    pub capacity: i32,
    pub registered: i64,
    pub remaining: i64,
}

/// Seat usage for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub event_id: i64,
    pub max_capacity: Option<i32>,
    pub roles: Vec<RoleUsage>,
    pub total_registered: i64,
    /// `None` when the event has no overall limit
    pub total_remaining: Option<i64>,
}

#[derive(Clone)]
pub struct CapacityLedger {
    store: Arc<dyn EventStore>,
}

impl CapacityLedger {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Live registrations for an event, optionally limited to one role
    pub async fn live_count(&self, event_id: i64, role: Option<Role>) -> Result<i64> {
        self.store
            .count_registrations(event_id, role, &RegistrationStatus::LIVE)
            .await
    }

    pub async fn report(&self, aggregate: &EventAggregate) -> Result<CapacityReport> {
        let event_id = aggregate.event.id;

        let mut roles = Vec::with_capacity(aggregate.capacities.len());
        for entry in &aggregate.capacities {
            let registered = self.live_count(event_id, Some(entry.role)).await?;
            roles.push(RoleUsage {
                role: entry.role,
                capacity: entry.capacity,
                registered,
                remaining: (i64::from(entry.capacity) - registered).max(0),
            });
        }

        let total_registered = self.live_count(event_id, None).await?;
        let max_capacity = aggregate.event.max_capacity;

        Ok(CapacityReport {
            event_id,
            max_capacity,
            roles,
            total_registered,
            total_remaining: max_capacity.map(|max| (i64::from(max) - total_registered).max(0)),
        })
    }
}
