//! In-memory test context
//!
//! Wires every service over an [`InMemoryStore`], a [`ManualClock`] pinned to
//! [`base_time`](super::base_time) and a sink that records notifications.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use EventDesk::config::{CheckinConfig, Settings};
use EventDesk::database::{EventStore, InMemoryStore};
use EventDesk::models::{CreateEventRequest, EventStatus, Registration};
use EventDesk::services::{
    EventService, Notification, NotificationSink, RegistrationService, ServiceFactory,
};
use EventDesk::utils::clock::ManualClock;
use EventDesk::Result;

use super::{admin, base_time, init_test_logging, TEST_SECRET};

/// Sink that keeps every delivered notification
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn test_settings() -> Settings {
    Settings {
        checkin: CheckinConfig {
            secret: TEST_SECRET.to_string(),
        },
        ..Settings::default()
    }
}

pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
    pub services: ServiceFactory,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        init_test_logging();

        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(base_time()));
        let sink = Arc::new(RecordingSink::default());
        let services = ServiceFactory::new(settings, store.clone(), clock.clone(), sink.clone())
            .expect("Failed to build services");

        Self {
            store,
            clock,
            sink,
            services,
        }
    }

    pub fn events(&self) -> &EventService {
        &self.services.event_service
    }

    pub fn registrations(&self) -> &RegistrationService {
        &self.services.registration_service
    }

    /// Create an event as admin and publish it
    pub async fn published_event(&self, request: CreateEventRequest) -> i64 {
        let aggregate = self
            .events()
            .create_event(&admin(), request)
            .await
            .expect("Failed to create event");
        let event = self
            .events()
            .publish(&admin(), aggregate.event.id)
            .await
            .expect("Failed to publish event");
        assert_eq!(event.status, EventStatus::Published);
        event.id
    }

    pub async fn event_status(&self, event_id: i64) -> EventStatus {
        self.events()
            .get_event(event_id)
            .await
            .expect("Event should exist")
            .event
            .status
    }

    /// Registration read straight from the store
    pub async fn store_registration(&self, user_id: i64, event_id: i64) -> Registration {
        self.store
            .find_registration(user_id, event_id)
            .await
            .expect("Store read failed")
            .expect("Registration should exist")
    }

    /// Wait until the sink has seen at least `count` notifications
    pub async fn wait_for_notifications(&self, count: usize) -> Vec<Notification> {
        for _ in 0..100 {
            let delivered = self.sink.delivered();
            if delivered.len() >= count {
                return delivered;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sink.delivered()
    }
}
