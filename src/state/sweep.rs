//! Lifecycle sweep
//!
//! One pass closes PUBLISHED events whose registration window has ended, then
//! completes CLOSED events that have ended. Every write is a compare-and-set on
//! the status the event was selected with, so an operator change made between
//! selection and update wins and the sweep skips that event.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use crate::config::SweepConfig;
use crate::database::{EventStore, SweepCriteria};
use crate::state::machine::validate_transition;
use crate::utils::clock::Clock;
use crate::utils::errors::Result;
use crate::utils::logging::{log_status_transition, log_sweep_report, log_transition_conflict};

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub closed: usize,
    pub completed: usize,
    pub absent_marked: u64,
    /// Events that moved concurrently or failed to update
    pub skipped: usize,
}

pub struct LifecycleSweep {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    mark_absentees: bool,
}

impl LifecycleSweep {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>, config: &SweepConfig) -> Self {
        Self {
            store,
            clock,
            mark_absentees: config.mark_absentees,
        }
    }

    /// Run one idempotent pass
    pub async fn run_once(&self) -> Result<SweepReport> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        let closed = self.advance(SweepCriteria::RegistrationEnded { now }, &mut report).await?;
        report.closed = closed.len();

        let completed = self.advance(SweepCriteria::EventEnded { now }, &mut report).await?;
        report.completed = completed.len();

        if self.mark_absentees {
            for event_id in completed {
                match self.store.mark_absentees(event_id).await {
                    Ok(count) => report.absent_marked += count,
                    Err(e) => error!(event_id = event_id, error = %e, "Failed to mark absentees"),
                }
            }
        }

        log_sweep_report(report.closed, report.completed, report.absent_marked, report.skipped);
        Ok(report)
    }

    /// Move every event selected by `criteria` to its target status.
    /// Returns the ids that were moved.
    async fn advance(&self, criteria: SweepCriteria, report: &mut SweepReport) -> Result<Vec<i64>> {
        let expected = criteria.status();
        let target = criteria.target();
        let now = self.clock.now();
        let mut moved = Vec::new();

        for event in self.store.find_events_needing_sweep(criteria).await? {
            if let Err(e) = validate_transition(event.status, target) {
                warn!(event_id = event.id, error = %e, "Sweep selected an event it cannot move");
                report.skipped += 1;
                continue;
            }

            match self.store.set_event_status(event.id, expected, target, now).await {
                Ok(true) => {
                    log_status_transition(event.id, expected.as_str(), target.as_str(), None);
                    moved.push(event.id);
                }
                Ok(false) => {
                    log_transition_conflict(event.id, expected.as_str(), target.as_str());
                    report.skipped += 1;
                }
                Err(e) => {
                    error!(event_id = event.id, error = %e, "Sweep failed to update event status");
                    report.skipped += 1;
                }
            }
        }

        Ok(moved)
    }
}

/// Runs a [`LifecycleSweep`] on a fixed interval
pub struct SweepRunner {
    sweep: Arc<LifecycleSweep>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl SweepRunner {
    pub fn new(sweep: LifecycleSweep, interval: Duration) -> Self {
        Self {
            sweep: Arc::new(sweep),
            interval,
            handle: None,
        }
    }

    /// Start the periodic task; the first pass runs immediately
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Lifecycle sweep is already running");
            return;
        }

        let sweep = Arc::clone(&self.sweep);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if let Err(e) = sweep.run_once().await {
                    error!("Lifecycle sweep failed: {}", e);
                }
            }
        });

        self.handle = Some(handle);
        info!("Started lifecycle sweep with interval {:?}", self.interval);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Stopped lifecycle sweep");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for SweepRunner {
    fn drop(&mut self) {
        self.stop();
    }
}
