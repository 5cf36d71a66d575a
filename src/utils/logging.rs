//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the EventDesk application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{ErrorSeverity, EventDeskError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop, so hold it for the
/// lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| EventDeskError::Config(format!("Failed to install subscriber: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration workflow actions
pub fn log_registration_action(event_id: i64, user_id: i64, action: &str, details: Option<&str>) {
    info!(
        event_id = event_id,
        user_id = user_id,
        action = action,
        details = details,
        "Registration action performed"
    );
}

/// Log a rejected workflow call at the level its severity calls for
pub fn log_rejection(event_id: i64, user_id: i64, action: &str, error: &EventDeskError) {
    let kind = error.kind();
    let outcome = kind.outcome();
    match error.severity() {
        ErrorSeverity::Info => debug!(
            event_id = event_id,
            user_id = user_id,
            action = action,
            kind = %kind,
            outcome = ?outcome,
            error = %error,
            "Request rejected"
        ),
        ErrorSeverity::Warning => warn!(
            event_id = event_id,
            user_id = user_id,
            action = action,
            kind = %kind,
            outcome = ?outcome,
            error = %error,
            "Request refused"
        ),
        ErrorSeverity::Error | ErrorSeverity::Critical => error!(
            event_id = event_id,
            user_id = user_id,
            action = action,
            severity = %error.severity(),
            error = %error,
            "Request failed"
        ),
    }
}

/// Log event status changes
pub fn log_status_transition(event_id: i64, from: &str, to: &str, actor: Option<i64>) {
    info!(
        event_id = event_id,
        from = from,
        to = to,
        actor = actor,
        "Event status changed"
    );
}

/// Log a lost compare-and-set on an event status
pub fn log_transition_conflict(event_id: i64, expected: &str, target: &str) {
    warn!(
        event_id = event_id,
        expected = expected,
        target = target,
        "Event status moved concurrently, transition skipped"
    );
}

/// Log sweep results
pub fn log_sweep_report(closed: usize, completed: usize, absent_marked: u64, skipped: usize) {
    if closed + completed + skipped > 0 || absent_marked > 0 {
        info!(
            closed = closed,
            completed = completed,
            absent_marked = absent_marked,
            skipped = skipped,
            "Lifecycle sweep completed"
        );
    } else {
        debug!("Lifecycle sweep completed with nothing to do");
    }
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
