//! Registration model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use crate::models::role::Role;
use crate::utils::errors::EventDeskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Registered,
    Canceled,
    Attended,
    Absent,
}

impl RegistrationStatus {
    /// Statuses that occupy a seat
    pub const LIVE: [RegistrationStatus; 2] = [RegistrationStatus::Registered, RegistrationStatus::Attended];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "REGISTERED",
            RegistrationStatus::Canceled => "CANCELED",
            RegistrationStatus::Attended => "ATTENDED",
            RegistrationStatus::Absent => "ABSENT",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = EventDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REGISTERED" => Ok(RegistrationStatus::Registered),
            "CANCELED" => Ok(RegistrationStatus::Canceled),
            "ATTENDED" => Ok(RegistrationStatus::Attended),
            "ABSENT" => Ok(RegistrationStatus::Absent),
            other => Err(EventDeskError::validation(format!("Unknown registration status: {}", other))),
        }
    }
}

impl TryFrom<String> for RegistrationStatus {
    type Error = EventDeskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub user_email: String,
    /// Role the seat was admitted under
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(try_from = "String")]
    pub status: RegistrationStatus,
    pub checkin_code: String,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub checkin_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
    pub event_id: i64,
    pub user_id: i64,
    pub user_email: String,
    pub role: Role,
    pub checkin_code: String,
    pub created_at: DateTime<Utc>,
}
