//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{TeachersPetError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_school_config(&settings.school)?;
    validate_pass_config(&settings.passes)?;
    validate_integrations_config(&settings.integrations)?;
    validate_scheduler_config(&settings.scheduler)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(TeachersPetError::Config(
            "Server host is required".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(TeachersPetError::Config(
            "Database URL is required".to_string()
        ));
    }

    let supported = ["memory://", "postgres://", "postgresql://"];
    if !supported.iter().any(|scheme| config.url.starts_with(scheme)) {
        return Err(TeachersPetError::Config(
            format!("Unsupported database URL: {}", config.url)
        ));
    }

    if config.max_connections == 0 {
        return Err(TeachersPetError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(TeachersPetError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(TeachersPetError::Config(
            "JWT secret is required".to_string()
        ));
    }

    if config.elevation_attempts_per_minute == 0 {
        return Err(TeachersPetError::Config(
            "Elevation attempts per minute must be greater than 0".to_string()
        ));
    }

    if matches!(config.teacher_code.as_deref(), Some("")) {
        return Err(TeachersPetError::Config(
            "Teacher code cannot be empty when set".to_string()
        ));
    }

    Ok(())
}

fn validate_school_config(config: &super::SchoolConfig) -> Result<()> {
    if config.utc_offset_minutes.abs() > 14 * 60 {
        return Err(TeachersPetError::Config(
            format!("UTC offset out of range: {} minutes", config.utc_offset_minutes)
        ));
    }

    if config.default_monthly_allowance < 0 {
        return Err(TeachersPetError::Config(
            "Default monthly allowance cannot be negative".to_string()
        ));
    }

    if !(1..=10).contains(&config.default_reminder_minutes) {
        return Err(TeachersPetError::Config(
            "Default reminder minutes must be between 1 and 10".to_string()
        ));
    }

    Ok(())
}

fn validate_pass_config(config: &super::PassConfig) -> Result<()> {
    if config.auto_close_after_minutes < crate::pass::OVERTIME_MINUTES {
        return Err(TeachersPetError::Config(
            "Auto-close threshold must not be shorter than the overtime ceiling".to_string()
        ));
    }

    if config.feed_capacity == 0 {
        return Err(TeachersPetError::Config(
            "Feed capacity must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate integration endpoints
fn validate_integrations_config(config: &super::IntegrationsConfig) -> Result<()> {
    if let Some(ref url) = config.email_api_url {
        url::Url::parse(url)?;
    }

    if let Some(ref url) = config.llm_api_url {
        url::Url::parse(url)?;
    }

    if !crate::utils::helpers::is_valid_email(&config.email_from) {
        return Err(TeachersPetError::Config(
            format!("Invalid sender address: {}", config.email_from)
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(TeachersPetError::Config(
            "Integration timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_scheduler_config(config: &super::SchedulerConfig) -> Result<()> {
    if config.enabled
        && (config.message_sweep_interval_seconds == 0 || config.auto_close_interval_seconds == 0)
    {
        return Err(TeachersPetError::Config(
            "Scheduler intervals must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(TeachersPetError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(TeachersPetError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_memory_database_accepted() {
        let mut settings = Settings::default();
        settings.database.url = "memory://".to_string();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_rejects_unknown_database_scheme() {
        let mut settings = Settings::default();
        settings.database.url = "mysql://localhost/db".to_string();
        assert_matches!(validate_settings(&settings), Err(TeachersPetError::Config(_)));
    }

    #[test]
    fn test_rejects_reminder_out_of_range() {
        let mut settings = Settings::default();
        settings.school.default_reminder_minutes = 11;
        assert_matches!(validate_settings(&settings), Err(TeachersPetError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_integration_url() {
        let mut settings = Settings::default();
        settings.integrations.llm_api_url = Some("not a url".to_string());
        assert_matches!(validate_settings(&settings), Err(TeachersPetError::UrlParse(_)));
    }

    #[test]
    fn test_rejects_invalid_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert_matches!(validate_settings(&settings), Err(TeachersPetError::Config(_)));
    }

    #[test]
    fn test_rejects_short_auto_close() {
        let mut settings = Settings::default();
        settings.passes.auto_close_after_minutes = 5;
        assert_matches!(validate_settings(&settings), Err(TeachersPetError::Config(_)));
    }
}
