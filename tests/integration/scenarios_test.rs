//! End-to-end acceptance scenarios

use assert_matches::assert_matches;
use chrono::Duration;
use EventDesk::models::{Audience, EventStatus, RegistrationStatus, Role};
use EventDesk::{ErrorKind, EventDeskError};

use crate::helpers::*;

#[tokio::test]
async fn test_role_capacities_fill_independently() {
    let ctx = TestContext::new();
    let event_id = ctx
        .published_event(event_request(Audience::Both, Some(10), &[(Role::Student, 6), (Role::Lecturer, 4)]))
        .await;

    for n in 1..=6 {
        ctx.registrations().register(&student(n), event_id).await.unwrap();
    }
    let err = ctx.registrations().register(&student(7), event_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("STUDENT"));

    for n in 1..=4 {
        ctx.registrations().register(&lecturer(n), event_id).await.unwrap();
    }
    let err = ctx.registrations().register(&lecturer(5), event_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("LECTURER"));

    let report = ctx.events().capacity_report(event_id).await.unwrap();
    assert_eq!(report.total_registered, 10);
    assert_eq!(report.total_remaining, Some(0));
    assert!(report.roles.iter().all(|usage| usage.remaining == 0));
}

#[tokio::test]
async fn test_cancellation_cutoff() {
    let ctx = TestContext::new();
    let base = base_time();

    let mut soon = open_student_event();
    soon.registration_end = base + Duration::hours(6);
    soon.start_time = base + Duration::hours(12);
    soon.end_time = base + Duration::hours(14);
    let soon_id = ctx.published_event(soon).await;

    let later_id = ctx.published_event(open_student_event()).await;

    let alice = student(1);
    ctx.registrations().register(&alice, soon_id).await.unwrap();
    ctx.registrations().register(&alice, later_id).await.unwrap();

    let err = ctx.registrations().cancel(&alice, soon_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(err.to_string().contains("must cancel at least 1 day before start"));
    let kept = ctx.store_registration(alice.user_id, soon_id).await;
    assert_eq!(kept.status, RegistrationStatus::Registered);

    let canceled = ctx.registrations().cancel(&alice, later_id).await.unwrap();
    assert_eq!(canceled.status, RegistrationStatus::Canceled);
    assert_eq!(canceled.canceled_at, Some(base));
}

#[tokio::test]
async fn test_sweep_closes_then_completes() {
    let ctx = TestContext::new();
    let request = open_student_event();
    let (registration_end, end_time) = (request.registration_end, request.end_time);
    let event_id = ctx.published_event(request).await;
    let sweep = ctx.services.lifecycle_sweep();

    ctx.clock.set(registration_end + Duration::hours(1));
    let report = sweep.run_once().await.unwrap();
    assert_eq!(report.closed, 1);
    assert_eq!(ctx.event_status(event_id).await, EventStatus::Closed);

    let report = sweep.run_once().await.unwrap();
    assert_eq!(report.closed + report.completed, 0);
    assert_eq!(ctx.event_status(event_id).await, EventStatus::Closed);

    ctx.clock.set(end_time + Duration::minutes(1));
    let report = sweep.run_once().await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(ctx.event_status(event_id).await, EventStatus::Completed);
}

#[tokio::test]
async fn test_checkin_window() {
    let ctx = TestContext::new();
    let mut request = open_student_event();
    let checkin_start = request.start_time - Duration::minutes(30);
    let checkin_end = request.end_time;
    request.checkin_start = Some(checkin_start);
    request.checkin_end = Some(checkin_end);
    let event_id = ctx.published_event(request).await;

    let alice = student(1);
    ctx.registrations().register(&alice, event_id).await.unwrap();
    let staff = checkin_staff(event_id);

    ctx.clock.set(checkin_start - Duration::minutes(1));
    let err = ctx.registrations().check_in(&staff, event_id, &alice.email).await.unwrap_err();
    assert_matches!(err, EventDeskError::State(ref message) if message.contains("not started"));

    ctx.clock.set(checkin_end + Duration::minutes(1));
    let err = ctx.registrations().check_in(&staff, event_id, &alice.email).await.unwrap_err();
    assert_matches!(err, EventDeskError::State(ref message) if message.contains("has ended"));

    let inside = checkin_start + Duration::minutes(45);
    ctx.clock.set(inside);
    let attended = ctx.registrations().check_in(&staff, event_id, &alice.email).await.unwrap();
    assert_eq!(attended.status, RegistrationStatus::Attended);
    assert_eq!(attended.checkin_at, Some(inside));
}

#[tokio::test]
async fn test_invalid_transition_leaves_status() {
    let ctx = TestContext::new();
    let event_id = ctx.published_event(open_student_event()).await;
    ctx.events().close(&admin(), event_id).await.unwrap();

    let err = ctx.events().publish(&admin(), event_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_matches!(
        err,
        EventDeskError::InvalidStateTransition { ref from, ref to, ref allowed }
            if from == "CLOSED" && to == "PUBLISHED" && allowed.len() == 2
    );
    assert_eq!(ctx.event_status(event_id).await, EventStatus::Closed);
}
