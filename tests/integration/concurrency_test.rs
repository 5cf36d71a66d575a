//! Concurrent admission, cancel and check-in

use futures::future::join_all;
use EventDesk::database::EventStore;
use EventDesk::models::{Audience, RegistrationStatus, Role};
use EventDesk::{ErrorKind, Result};

use crate::helpers::*;

/// Fire `attempts` registrations for distinct students at once and split the
/// outcomes into (admitted, conflicts)
async fn register_concurrently(ctx: &TestContext, event_id: i64, attempts: i64) -> (usize, usize) {
    let tasks = (1..=attempts).map(|n| {
        let service = ctx.registrations().clone();
        tokio::spawn(async move { service.register(&student(n), event_id).await })
    });

    let results: Vec<Result<_>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("Registration task panicked"))
        .collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::Conflict))
        .count();
    (admitted, conflicts)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_role_capacity_never_overrun() {
    let ctx = TestContext::new();

    for _ in 0..10 {
        let event_id = ctx
            .published_event(event_request(Audience::Student, None, &[(Role::Student, 3)]))
            .await;

        let (admitted, conflicts) = register_concurrently(&ctx, event_id, 10).await;
        assert_eq!(admitted, 3);
        assert_eq!(conflicts, 7);

        let live = ctx
            .store
            .count_registrations(event_id, Some(Role::Student), &RegistrationStatus::LIVE)
            .await
            .unwrap();
        assert_eq!(live, 3);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overall_capacity_never_overrun() {
    let ctx = TestContext::new();
    let event_id = ctx
        .published_event(event_request(Audience::Student, Some(3), &[]))
        .await;

    let (admitted, conflicts) = register_concurrently(&ctx, event_id, 10).await;
    assert_eq!(admitted, 3);
    assert_eq!(conflicts, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_apply_once() {
    let ctx = TestContext::new();
    let event_id = ctx.published_event(open_student_event()).await;
    let alice = student(1);
    ctx.registrations().register(&alice, event_id).await.unwrap();

    let tasks = (0..5).map(|_| {
        let service = ctx.registrations().clone();
        let alice = alice.clone();
        tokio::spawn(async move { service.cancel(&alice, event_id).await })
    });
    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::State));
    assert_eq!(ctx.store_registration(alice.user_id, event_id).await.status, RegistrationStatus::Canceled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_token_and_email_checkin_race() {
    let ctx = TestContext::new();
    let event_id = ctx.published_event(open_student_event()).await;
    let alice = student(1);
    let registration = ctx.registrations().register(&alice, event_id).await.unwrap();
    let staff = checkin_staff(event_id);

    let by_token = {
        let service = ctx.registrations().clone();
        let staff = staff.clone();
        let token = registration.checkin_code.clone();
        tokio::spawn(async move { service.check_in_with_token(&staff, &token).await })
    };
    let by_email = {
        let service = ctx.registrations().clone();
        let email = alice.email.clone();
        tokio::spawn(async move { service.check_in(&staff, event_id, &email).await })
    };

    let results = [by_token.await.unwrap(), by_email.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::State));
}
