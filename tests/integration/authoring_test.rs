//! Event authoring, capacity changes and manual status changes

use EventDesk::models::{
    Audience, CapacityEntry, EventStatus, RegistrationStatus, Role, UpdateEventRequest,
};
use EventDesk::ErrorKind;

use crate::helpers::*;

#[tokio::test]
async fn test_authoring_permissions() {
    let ctx = TestContext::new();

    let head = department_head(TEST_DEPARTMENT);
    let created = ctx.events().create_event(&head, open_student_event()).await.unwrap();
    assert_eq!(created.event.status, EventStatus::Draft);
    assert_eq!(created.event.created_by, head.user_id);

    let other_head = department_head(TEST_DEPARTMENT + 1);
    let err = ctx.events().create_event(&other_head, open_student_event()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    let err = ctx.events().publish(&other_head, created.event.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let err = ctx.events().create_event(&student(1), open_student_event()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let published = ctx.events().publish(&head, created.event.id).await.unwrap();
    assert_eq!(published.status, EventStatus::Published);
}

#[tokio::test]
async fn test_create_validates_request() {
    let ctx = TestContext::new();

    let missing_lecturer = event_request(Audience::Both, None, &[(Role::Student, 5)]);
    let err = ctx.events().create_event(&admin(), missing_lecturer).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let uneven = event_request(Audience::Both, Some(12), &[(Role::Student, 6), (Role::Lecturer, 4)]);
    let err = ctx.events().create_event(&admin(), uneven).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut inverted = open_student_event();
    inverted.registration_end = inverted.start_time + chrono::Duration::hours(1);
    let err = ctx.events().create_event(&admin(), inverted).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut untitled = open_student_event();
    untitled.title = "   ".to_string();
    let err = ctx.events().create_event(&admin(), untitled).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let created = ctx
        .events()
        .create_event(&admin(), event_request(Audience::Both, Some(10), &[(Role::Student, 6), (Role::Lecturer, 4)]))
        .await
        .unwrap();
    assert_eq!(created.capacity_for(Role::Student), Some(6));
    assert_eq!(created.capacity_for(Role::Lecturer), Some(4));
}

#[tokio::test]
async fn test_updates_only_while_draft_or_blocked() {
    let ctx = TestContext::new();
    let event_id = ctx.published_event(open_student_event()).await;

    let rename = || UpdateEventRequest {
        title: Some("Renamed seminar".to_string()),
        ..UpdateEventRequest::default()
    };

    let err = ctx.events().update_event(&admin(), event_id, rename()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    ctx.events().block(&admin(), event_id).await.unwrap();
    let updated = ctx.events().update_event(&admin(), event_id, rename()).await.unwrap();
    assert_eq!(updated.event.title, "Renamed seminar");
    assert_eq!(updated.event.status, EventStatus::Blocked);

    let unblocked = ctx.events().unblock(&admin(), event_id).await.unwrap();
    assert_eq!(unblocked.status, EventStatus::Published);
}

#[tokio::test]
async fn test_capacity_cannot_drop_below_live_registrations() {
    let ctx = TestContext::new();
    let event_id = ctx
        .published_event(event_request(Audience::Student, None, &[(Role::Student, 5)]))
        .await;
    ctx.registrations().register(&student(1), event_id).await.unwrap();
    ctx.registrations().register(&student(2), event_id).await.unwrap();
    ctx.events().block(&admin(), event_id).await.unwrap();

    let err = ctx
        .events()
        .replace_capacities(&admin(), event_id, vec![CapacityEntry::new(Role::Student, 1)])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let shrink_overall = UpdateEventRequest {
        max_capacity: Some(Some(1)),
        capacities: Some(Vec::new()),
        ..UpdateEventRequest::default()
    };
    let err = ctx.events().update_event(&admin(), event_id, shrink_overall).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let updated = ctx
        .events()
        .replace_capacities(&admin(), event_id, vec![CapacityEntry::new(Role::Student, 2)])
        .await
        .unwrap();
    assert_eq!(updated.capacity_for(Role::Student), Some(2));

    let report = ctx.events().capacity_report(event_id).await.unwrap();
    assert_eq!(report.roles.len(), 1);
    assert_eq!(report.roles[0].registered, 2);
    assert_eq!(report.roles[0].remaining, 0);
    assert_eq!(report.total_remaining, None);
}

#[tokio::test]
async fn test_update_can_clear_optional_fields() {
    let ctx = TestContext::new();
    let mut request = event_request(Audience::Student, Some(5), &[(Role::Student, 5)]);
    request.checkin_start = Some(request.start_time - chrono::Duration::hours(1));
    request.location = Some("Hall B".to_string());
    let created = ctx.events().create_event(&admin(), request).await.unwrap();
    assert_eq!(created.event.max_capacity, Some(5));

    let untouched = ctx
        .events()
        .update_event(&admin(), created.event.id, UpdateEventRequest::default())
        .await
        .unwrap();
    assert_eq!(untouched.event.max_capacity, Some(5));
    assert_eq!(untouched.event.location.as_deref(), Some("Hall B"));

    let cleared = ctx
        .events()
        .update_event(
            &admin(),
            created.event.id,
            UpdateEventRequest {
                max_capacity: Some(None),
                location: Some(None),
                checkin_start: Some(None),
                ..UpdateEventRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.event.max_capacity, None);
    assert_eq!(cleared.event.location, None);
    assert_eq!(cleared.event.checkin_start, None);
    assert_eq!(cleared.capacity_for(Role::Student), Some(5));
}

#[tokio::test]
async fn test_audience_switch_away_from_live_role() {
    let ctx = TestContext::new();
    let event_id = ctx
        .published_event(event_request(Audience::Both, Some(10), &[(Role::Student, 6), (Role::Lecturer, 4)]))
        .await;
    let alice = student(1);
    ctx.registrations().register(&alice, event_id).await.unwrap();
    ctx.events().block(&admin(), event_id).await.unwrap();

    let lecturers_only = || UpdateEventRequest {
        audience: Some(Audience::Lecturer),
        max_capacity: Some(Some(4)),
        capacities: Some(vec![CapacityEntry::new(Role::Lecturer, 4)]),
        ..UpdateEventRequest::default()
    };
    let err = ctx
        .events()
        .update_event(&admin(), event_id, lecturers_only())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    ctx.events().unblock(&admin(), event_id).await.unwrap();
    ctx.registrations().cancel(&alice, event_id).await.unwrap();
    ctx.events().block(&admin(), event_id).await.unwrap();

    let updated = ctx
        .events()
        .update_event(&admin(), event_id, lecturers_only())
        .await
        .unwrap();
    assert_eq!(updated.event.audience, Audience::Lecturer);
    assert_eq!(updated.capacity_for(Role::Student), None);
    assert_eq!(
        ctx.store_registration(alice.user_id, event_id).await.status,
        RegistrationStatus::Canceled
    );
}

#[tokio::test]
async fn test_soft_delete_only_from_draft() {
    let ctx = TestContext::new();

    let draft = ctx.events().create_event(&admin(), open_student_event()).await.unwrap();
    let deleted = ctx.events().delete_event(&admin(), draft.event.id).await.unwrap();
    assert_eq!(deleted.status, EventStatus::Deleted);
    let err = ctx.events().get_event(draft.event.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let published = ctx.published_event(open_student_event()).await;
    let err = ctx.events().delete_event(&admin(), published).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}

#[tokio::test]
async fn test_manual_status_changes_follow_table() {
    let ctx = TestContext::new();
    let event_id = ctx.published_event(open_student_event()).await;

    ctx.events().close(&admin(), event_id).await.unwrap();
    let err = ctx.events().block(&admin(), event_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    let canceled = ctx.events().cancel(&admin(), event_id).await.unwrap();
    assert_eq!(canceled.status, EventStatus::Canceled);

    for target in EventStatus::ALL {
        let err = ctx.events().change_status(&admin(), event_id, target).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }
}
