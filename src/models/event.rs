//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use crate::models::role::Role;
use crate::utils::errors::EventDeskError;

/// Lifecycle status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    Closed,
    Blocked,
    Canceled,
    Completed,
    /// Soft-delete marker, never reached through the transition table
    Deleted,
}

impl EventStatus {
    pub const ALL: [EventStatus; 7] = [
        EventStatus::Draft,
        EventStatus::Published,
        EventStatus::Closed,
        EventStatus::Blocked,
        EventStatus::Canceled,
        EventStatus::Completed,
        EventStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Closed => "CLOSED",
            EventStatus::Blocked => "BLOCKED",
            EventStatus::Canceled => "CANCELED",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Deleted => "DELETED",
        }
    }

    /// Statuses in which authoring changes are accepted
    pub fn is_editable(&self) -> bool {
        matches!(self, EventStatus::Draft | EventStatus::Blocked)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = EventDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EventDeskError::validation(format!("Unknown event status: {}", s)))
    }
}

impl TryFrom<String> for EventStatus {
    type Error = EventDeskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Who an event is open to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Audience {
    Student,
    Lecturer,
    Both,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Student => "STUDENT",
            Audience::Lecturer => "LECTURER",
            Audience::Both => "BOTH",
        }
    }

    /// Participant roles this audience admits
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Audience::Student => &[Role::Student],
            Audience::Lecturer => &[Role::Lecturer],
            Audience::Both => &Role::PARTICIPANTS,
        }
    }

    pub fn admits(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = EventDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Audience::Student),
            "LECTURER" => Ok(Audience::Lecturer),
            "BOTH" => Ok(Audience::Both),
            other => Err(EventDeskError::validation(format!("Unknown audience: {}", other))),
        }
    }
}

impl TryFrom<String> for Audience {
    type Error = EventDeskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventMode {
    Online,
    Offline,
    Hybrid,
}

impl EventMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventMode::Online => "ONLINE",
            EventMode::Offline => "OFFLINE",
            EventMode::Hybrid => "HYBRID",
        }
    }
}

impl FromStr for EventMode {
    type Err = EventDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONLINE" => Ok(EventMode::Online),
            "OFFLINE" => Ok(EventMode::Offline),
            "HYBRID" => Ok(EventMode::Hybrid),
            other => Err(EventDeskError::validation(format!("Unknown event mode: {}", other))),
        }
    }
}

impl TryFrom<String> for EventMode {
    type Error = EventDeskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub department_id: Option<i64>,
    pub created_by: i64,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    #[sqlx(try_from = "String")]
    pub audience: Audience,
    #[sqlx(try_from = "String")]
    pub mode: EventMode,
    pub max_capacity: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub checkin_start: Option<DateTime<Utc>>,
    pub checkin_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether `now` falls inside the registration window (bounds inclusive)
    pub fn registration_open_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.registration_start && now <= self.registration_end
    }
}

/// Capacity for one (event, role) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventCapacity {
    pub event_id: i64,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub capacity: i32,
}

/// Capacity declaration as supplied by an author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub role: Role,
    pub capacity: i32,
}

impl CapacityEntry {
    pub fn new(role: Role, capacity: i32) -> Self {
        Self { role, capacity }
    }
}

/// An event together with the capacity set it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAggregate {
    pub event: Event,
    pub capacities: Vec<EventCapacity>,
}

impl EventAggregate {
    pub fn capacity_for(&self, role: Role) -> Option<i32> {
        self.capacities
            .iter()
            .find(|c| c.role == role)
            .map(|c| c.capacity)
    }

    pub fn capacity_entries(&self) -> Vec<CapacityEntry> {
        self.capacities
            .iter()
            .map(|c| CapacityEntry::new(c.role, c.capacity))
            .collect()
    }
}

/// Fully validated event ready to be inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub department_id: Option<i64>,
    pub created_by: i64,
    pub audience: Audience,
    pub mode: EventMode,
    pub max_capacity: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub checkin_start: Option<DateTime<Utc>>,
    pub checkin_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub department_id: Option<i64>,
    pub audience: Audience,
    pub mode: EventMode,
    pub max_capacity: Option<i32>,
    pub capacities: Vec<CapacityEntry>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub checkin_start: Option<DateTime<Utc>>,
    pub checkin_end: Option<DateTime<Utc>>,
}

/// Partial update; `capacities`, when present, replaces the whole set.
///
/// Nullable fields are doubly optional: absent leaves the value alone,
/// `Some(None)` (JSON `null`) clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    pub audience: Option<Audience>,
    pub mode: Option<EventMode>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<Option<i32>>,
    pub capacities: Option<Vec<CapacityEntry>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub checkin_start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub checkin_end: Option<Option<DateTime<Utc>>>,
}

/// A field that appears in the payload, even as `null`, is `Some`
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
