//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub checkin: CheckinConfig,
    pub registration: RegistrationConfig,
    pub sweep: SweepConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Check-in token configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckinConfig {
    /// Secret the token cipher key is derived from
    pub secret: String,
}

/// Registration workflow configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Cancellation must happen at least this many hours before start
    pub cancel_cutoff_hours: i64,
}

/// Lifecycle sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    /// Move REGISTERED rows to ABSENT when their event completes
    pub mark_absentees: bool,
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("EVENTDESK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load settings from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("EVENTDESK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventDeskError> {
        super::validation::validate_settings(self)
    }
}

impl SweepConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl RegistrationConfig {
    /// Longest accepted cancellation cutoff, one year
    pub const MAX_CANCEL_CUTOFF_HOURS: i64 = 24 * 365;

    pub fn cancel_cutoff(&self) -> crate::utils::errors::Result<chrono::Duration> {
        chrono::Duration::try_hours(self.cancel_cutoff_hours).ok_or_else(|| {
            crate::utils::errors::EventDeskError::Config(format!(
                "Cancellation cutoff of {} hours is out of range",
                self.cancel_cutoff_hours
            ))
        })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/eventdesk".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { cancel_cutoff_hours: 24 }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 300,
            mark_absentees: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "eventdesk.log".to_string(),
        }
    }
}
