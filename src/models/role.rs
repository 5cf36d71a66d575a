//! Role model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::utils::errors::EventDeskError;

/// Roles a caller can hold. Student and lecturer double as capacity partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
}

impl Role {
    /// Roles that can register for events, in admission preference order
    pub const PARTICIPANTS: [Role; 2] = [Role::Student, Role::Lecturer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Lecturer => "LECTURER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_participant(&self) -> bool {
        matches!(self, Role::Student | Role::Lecturer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = EventDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "LECTURER" => Ok(Role::Lecturer),
            "ADMIN" => Ok(Role::Admin),
            other => Err(EventDeskError::validation(format!("Unknown role: {}", other))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = EventDeskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
