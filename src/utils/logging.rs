//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the SkiClub application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = match &config.file_path {
        Some(path) => {
            let file_appender = tracing_appender::rolling::daily(path, "skiclub.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log parent actions with structured data
pub fn log_parent_action(profile_id: Uuid, action: &str, details: Option<&str>) {
    info!(
        profile_id = %profile_id,
        action = action,
        details = details,
        "Parent action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: Uuid, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = %admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log a single email delivery attempt
pub fn log_email_delivery(recipient: &str, subject: &str, error: Option<&str>) {
    match error {
        None => debug!(recipient = recipient, subject = subject, "Email delivered"),
        Some(error) => warn!(recipient = recipient, subject = subject, error = error, "Email delivery failed"),
    }
}

/// Log the outcome of one staged import row
pub fn log_import_row(kind: &str, row_id: Uuid, error: Option<&str>) {
    match error {
        None => debug!(kind = kind, row_id = %row_id, "Import row imported"),
        Some(error) => warn!(kind = kind, row_id = %row_id, error = error, "Import row failed"),
    }
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
