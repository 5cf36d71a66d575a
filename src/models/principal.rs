//! Caller identity
//!
//! A `Principal` is handed to every workflow call by whatever verified the
//! caller. Nothing in this crate looks identity up on its own.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use crate::models::event::{Audience, Event};
use crate::models::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub roles: HashSet<Role>,
    /// Departments this caller is HEAD of
    pub headed_departments: HashSet<i64>,
    /// Events this caller is check-in staff for
    pub checkin_events: HashSet<i64>,
}

impl Principal {
    pub fn new(user_id: i64, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            roles: HashSet::new(),
            headed_departments: HashSet::new(),
            checkin_events: HashSet::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn heading(mut self, department_id: i64) -> Self {
        self.headed_departments.insert(department_id);
        self
    }

    pub fn checkin_staff_for(mut self, event_id: i64) -> Self {
        self.checkin_events.insert(event_id);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Admins manage everything; a department HEAD manages its department's events
    pub fn can_manage(&self, event: &Event) -> bool {
        self.is_admin()
            || event
                .department_id
                .map(|id| self.headed_departments.contains(&id))
                .unwrap_or(false)
    }

    /// Admins may author events anywhere, heads only inside their department
    pub fn can_author_in(&self, department_id: Option<i64>) -> bool {
        self.is_admin()
            || department_id
                .map(|id| self.headed_departments.contains(&id))
                .unwrap_or(false)
    }

    pub fn can_check_in(&self, event_id: i64) -> bool {
        self.checkin_events.contains(&event_id)
    }

    /// First participant role matching the audience, students before lecturers
    pub fn admission_role(&self, audience: Audience) -> Option<Role> {
        Role::PARTICIPANTS
            .iter()
            .copied()
            .find(|role| self.has_role(*role) && audience.admits(*role))
    }
}
