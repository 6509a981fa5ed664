//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub school: SchoolConfig,
    pub passes: PassConfig,
    pub integrations: IntegrationsConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// `postgres://...` or `memory://` for the in-process store
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Identity and role elevation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Shared secret used to verify identity-provider tokens (HS256)
    pub jwt_secret: String,
    /// Code that elevates a user to the teacher role
    pub teacher_code: Option<String>,
    pub elevation_attempts_per_minute: u32,
}

/// School-wide defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchoolConfig {
    pub name: String,
    /// Offset of the school's local time from UTC, in minutes
    pub utc_offset_minutes: i32,
    pub default_monthly_allowance: i32,
    pub default_reminder_minutes: i32,
}

/// Pass monitoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PassConfig {
    pub auto_close_after_minutes: i64,
    pub feed_capacity: usize,
}

/// Email and LLM integration endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntegrationsConfig {
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub llm_api_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub timeout_seconds: u64,
}

/// Background job configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub message_sweep_interval_seconds: u64,
    pub auto_close_interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file; empty disables file output
    pub directory: String,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub ai_assistant: bool,
    pub scheduled_messages: bool,
    pub auto_close: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load settings from the given file stem, layered over the defaults
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("TEACHERS_PET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::TeachersPetError> {
        super::validation::validate_settings(self)
    }

    /// The school's local time zone
    pub fn school_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.school.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/teachers_pet".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "change-me".to_string(),
                teacher_code: None,
                elevation_attempts_per_minute: 5,
            },
            school: SchoolConfig {
                name: "Teacher's Pet".to_string(),
                utc_offset_minutes: 0,
                default_monthly_allowance: 4,
                default_reminder_minutes: 8,
            },
            passes: PassConfig {
                auto_close_after_minutes: 90,
                feed_capacity: 256,
            },
            integrations: IntegrationsConfig {
                email_api_url: None,
                email_api_key: None,
                email_from: "no-reply@teacherspet.local".to_string(),
                llm_api_url: None,
                llm_api_key: None,
                llm_model: "gpt-4o-mini".to_string(),
                timeout_seconds: 30,
            },
            scheduler: SchedulerConfig {
                enabled: true,
                message_sweep_interval_seconds: 60,
                auto_close_interval_seconds: 300,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                json: false,
            },
            features: FeaturesConfig {
                ai_assistant: true,
                scheduled_messages: true,
                auto_close: true,
            },
        }
    }
}
