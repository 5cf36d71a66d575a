//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{EventDeskError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_checkin_config(&settings.checkin)?;
    validate_registration_config(&settings.registration)?;
    validate_sweep_config(&settings.sweep)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventDeskError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(EventDeskError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(EventDeskError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate check-in token configuration
fn validate_checkin_config(config: &super::CheckinConfig) -> Result<()> {
    if config.secret.trim().is_empty() {
        return Err(EventDeskError::Config(
            "Check-in token secret is required".to_string()
        ));
    }

    Ok(())
}

fn validate_registration_config(config: &super::RegistrationConfig) -> Result<()> {
    if config.cancel_cutoff_hours < 0 {
        return Err(EventDeskError::Config(
            "Cancellation cutoff cannot be negative".to_string()
        ));
    }

    if config.cancel_cutoff_hours > super::RegistrationConfig::MAX_CANCEL_CUTOFF_HOURS {
        return Err(EventDeskError::Config(format!(
            "Cancellation cutoff cannot exceed {} hours",
            super::RegistrationConfig::MAX_CANCEL_CUTOFF_HOURS
        )));
    }

    Ok(())
}

/// Validate sweep configuration
fn validate_sweep_config(config: &super::SweepConfig) -> Result<()> {
    if config.interval_seconds == 0 {
        return Err(EventDeskError::Config(
            "Sweep interval must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventDeskError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventDeskError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
