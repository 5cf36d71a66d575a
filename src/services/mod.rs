//! Services module
//!
//! This module contains the business logic: event authoring, admission
//! control, the registration workflow and its collaborators.

pub mod admission;
pub mod event;
pub mod ledger;
pub mod notification;
pub mod registration;
pub mod token;

// Re-export commonly used services
pub use admission::CapacityValidator;
pub use event::EventService;
pub use ledger::{CapacityLedger, CapacityReport, RoleUsage};
pub use notification::{LoggingNotificationSink, Notification, NotificationService, NotificationSink};
pub use registration::RegistrationService;
pub use token::CheckinTokenCodec;

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::EventStore;
use crate::state::sweep::{LifecycleSweep, SweepRunner};
use crate::utils::clock::Clock;
use crate::utils::errors::Result;

/// Service factory for creating and wiring all services over one store
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub capacity_ledger: CapacityLedger,
    pub notification_service: NotificationService,
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        settings: Settings,
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let codec = CheckinTokenCodec::new(&settings.checkin.secret)?;
        let notification_service = NotificationService::new(sink, &settings.notifications);
        let registration_service = RegistrationService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            codec,
            notification_service.clone(),
            &settings.registration,
        )?;
        let event_service = EventService::new(Arc::clone(&store), Arc::clone(&clock));
        let capacity_ledger = CapacityLedger::new(Arc::clone(&store));

        Ok(Self {
            event_service,
            registration_service,
            capacity_ledger,
            notification_service,
            store,
            clock,
            settings,
        })
    }

    pub fn lifecycle_sweep(&self) -> LifecycleSweep {
        LifecycleSweep::new(Arc::clone(&self.store), Arc::clone(&self.clock), &self.settings.sweep)
    }

    /// Sweep runner on the configured interval; not started
    pub fn sweep_runner(&self) -> SweepRunner {
        SweepRunner::new(self.lifecycle_sweep(), self.settings.sweep.interval())
    }
}
