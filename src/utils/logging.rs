//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Teacher's Pet application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| crate::utils::errors::TeachersPetError::Config(e.to_string()))?;

    let stdout_layer = output_layer(config.json, true, std::io::stdout);

    let (file_layer, guard) = if config.directory.is_empty() {
        (None, None)
    } else {
        let file_appender = tracing_appender::rolling::daily(&config.directory, "teachers-pet.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(output_layer(config.json, false, non_blocking)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::utils::errors::TeachersPetError::Config(e.to_string()))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Formatting layer for one output; `json` selects structured lines
fn output_layer<S, W>(json: bool, ansi: bool, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_ansi(ansi).with_writer(writer);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// Log pass lifecycle events with structured data
pub fn log_pass_event(student: &str, session_id: &str, event: &str, details: Option<&str>) {
    info!(
        student = student,
        session_id = session_id,
        event = event,
        details = details,
        "Pass event"
    );
}

/// Log allowance and points changes
pub fn log_allowance_change(student: &str, action: &str, points_delta: i32, balance: i32) {
    info!(
        student = student,
        action = action,
        points_delta = points_delta,
        balance = balance,
        "Allowance changed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin: &str, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin = admin,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log integration errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log store operations
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
