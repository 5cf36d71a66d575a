//! Test data helpers for creating principals and event requests

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Once;
use EventDesk::models::{Audience, CapacityEntry, CreateEventRequest, EventMode, Principal, Role};

static INIT: Once = Once::new();

/// Initialize logging for tests (called once)
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_DEPARTMENT: i64 = 7;

/// Time every test clock starts at
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

pub fn admin() -> Principal {
    Principal::new(1, "admin@uni.edu").with_role(Role::Admin)
}

pub fn department_head(department_id: i64) -> Principal {
    Principal::new(100 + department_id, format!("head{}@uni.edu", department_id)).heading(department_id)
}

pub fn student(n: i64) -> Principal {
    Principal::new(1000 + n, format!("student{}@uni.edu", n)).with_role(Role::Student)
}

pub fn lecturer(n: i64) -> Principal {
    Principal::new(2000 + n, format!("lecturer{}@uni.edu", n)).with_role(Role::Lecturer)
}

pub fn checkin_staff(event_id: i64) -> Principal {
    Principal::new(3000, "staff@uni.edu").checkin_staff_for(event_id)
}

/// Event request with the registration window open at [`base_time`] and the
/// event three days later
pub fn event_request(audience: Audience, max_capacity: Option<i32>, capacities: &[(Role, i32)]) -> CreateEventRequest {
    let base = base_time();
    CreateEventRequest {
        title: "Distributed Systems Seminar".to_string(),
        description: Some("Weekly seminar".to_string()),
        location: Some("Room 101".to_string()),
        department_id: Some(TEST_DEPARTMENT),
        audience,
        mode: EventMode::Offline,
        max_capacity,
        capacities: capacities
            .iter()
            .map(|(role, capacity)| CapacityEntry::new(*role, *capacity))
            .collect(),
        start_time: base + Duration::days(3),
        end_time: base + Duration::days(3) + Duration::hours(2),
        registration_start: base - Duration::days(1),
        registration_end: base + Duration::days(2),
        checkin_start: None,
        checkin_end: None,
    }
}

/// Student-only event without seat limits
pub fn open_student_event() -> CreateEventRequest {
    event_request(Audience::Student, None, &[])
}
