//! Registration notifications
//!
//! Delivery is handed to a [`NotificationSink`] on a spawned task. A slow or
//! failing sink never delays or fails the registration call that triggered it;
//! failures are logged and dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::config::NotificationsConfig;
use crate::models::{Event, Registration};
use crate::utils::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    RegistrationConfirmed {
        registration_id: i64,
        event_id: i64,
        event_title: String,
        user_id: i64,
        email: String,
        checkin_token: String,
    },
    RegistrationCanceled {
        registration_id: i64,
        event_id: i64,
        event_title: String,
        user_id: i64,
        email: String,
    },
}

impl Notification {
    pub fn confirmed(registration: &Registration, event: &Event) -> Self {
        Notification::RegistrationConfirmed {
            registration_id: registration.id,
            event_id: event.id,
            event_title: event.title.clone(),
            user_id: registration.user_id,
            email: registration.user_email.clone(),
            checkin_token: registration.checkin_code.clone(),
        }
    }

    pub fn canceled(registration: &Registration, event: &Event) -> Self {
        Notification::RegistrationCanceled {
            registration_id: registration.id,
            event_id: event.id,
            event_title: event.title.clone(),
            user_id: registration.user_id,
            email: registration.user_email.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::RegistrationConfirmed { .. } => "registration_confirmed",
            Notification::RegistrationCanceled { .. } => "registration_canceled",
        }
    }

    pub fn registration_id(&self) -> i64 {
        match self {
            Notification::RegistrationConfirmed { registration_id, .. }
            | Notification::RegistrationCanceled { registration_id, .. } => *registration_id,
        }
    }
}

/// Outbound delivery channel (email, push, ...)
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Sink that only writes the notification to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        info!(
            kind = notification.kind(),
            registration_id = notification.registration_id(),
            "Notification delivered"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationService {
    sink: Arc<dyn NotificationSink>,
    enabled: bool,
}

impl NotificationService {
    pub fn new(sink: Arc<dyn NotificationSink>, config: &NotificationsConfig) -> Self {
        Self {
            sink,
            enabled: config.enabled,
        }
    }

    /// Service that drops every notification
    pub fn disabled() -> Self {
        Self {
            sink: Arc::new(LoggingNotificationSink),
            enabled: false,
        }
    }

    /// Hand a notification to the sink without waiting for delivery
    pub fn dispatch(&self, notification: Notification) -> Option<JoinHandle<()>> {
        if !self.enabled {
            debug!(kind = notification.kind(), "Notifications disabled, dropping");
            return None;
        }

        let sink = Arc::clone(&self.sink);
        Some(tokio::spawn(async move {
            if let Err(e) = sink.deliver(&notification).await {
                warn!(
                    kind = notification.kind(),
                    registration_id = notification.registration_id(),
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }))
    }
}
