//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{SkiClubError, Result};
use super::settings::{EmailProvider, Settings};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_email_config(&settings.email)?;
    validate_ai_config(&settings.ai)?;
    validate_logging_config(&settings.logging)?;
    settings.timezone()?;

    if settings.payments.reminder_days_before < 0 {
        return Err(SkiClubError::Config(
            "Reminder days before due date cannot be negative".to_string()
        ));
    }

    Ok(())
}

fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(SkiClubError::Config("Server host is required".to_string()));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(SkiClubError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(SkiClubError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(SkiClubError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(SkiClubError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(SkiClubError::Config("JWT secret is required".to_string()));
    }

    if config.cron_secret.is_empty() {
        return Err(SkiClubError::Config("Cron secret is required".to_string()));
    }

    Ok(())
}

/// Validate email configuration against the selected provider
fn validate_email_config(config: &super::EmailConfig) -> Result<()> {
    if config.batch_size == 0 {
        return Err(SkiClubError::Config(
            "Email batch size must be greater than 0".to_string()
        ));
    }

    if !config.from_address.contains('@') {
        return Err(SkiClubError::Config(
            format!("Invalid sender address: {}", config.from_address)
        ));
    }

    match config.provider {
        EmailProvider::Smtp => {
            let smtp = config.smtp.as_ref().ok_or_else(|| {
                SkiClubError::Config("SMTP provider selected but [email.smtp] is missing".to_string())
            })?;
            if smtp.host.is_empty() {
                return Err(SkiClubError::Config("SMTP host is required".to_string()));
            }
        }
        EmailProvider::Oauth2 => {
            let oauth2 = config.oauth2.as_ref().ok_or_else(|| {
                SkiClubError::Config("OAuth2 provider selected but [email.oauth2] is missing".to_string())
            })?;
            url::Url::parse(&oauth2.token_url)?;
            if oauth2.client_id.is_empty() || oauth2.client_secret.is_empty() {
                return Err(SkiClubError::Config(
                    "OAuth2 client id and secret are required".to_string()
                ));
            }
        }
        EmailProvider::Disabled => {}
    }

    Ok(())
}

fn validate_ai_config(config: &super::AiConfig) -> Result<()> {
    url::Url::parse(&config.api_url)?;

    if config.timeout_seconds == 0 {
        return Err(SkiClubError::Config(
            "AI timeout must be greater than 0".to_string()
        ));
    }

    if config.requests_per_minute == 0 {
        return Err(SkiClubError::Config(
            "AI requests per minute must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(SkiClubError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(SkiClubError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::SmtpConfig;

    #[test]
    fn rejects_min_connections_above_max() {
        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn rejects_smtp_without_section() {
        let mut settings = Settings::default();
        settings.email.provider = EmailProvider::Smtp;
        assert!(validate_settings(&settings).is_err());

        settings.email.smtp = Some(SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: "klub@gmail.com".to_string(),
            password: "app-password".to_string(),
        });
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut settings = Settings::default();
        settings.email.batch_size = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
