//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub ai: AiConfig,
    pub payments: PaymentsConfig,
    pub club: ClubConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_permissive: bool,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Token verification and cron guard
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub cron_secret: String,
}

/// Which transport delivers outgoing mail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    Smtp,
    Oauth2,
    Disabled,
}

/// Outgoing email configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    pub from_address: String,
    pub from_name: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub smtp: Option<SmtpConfig>,
    pub oauth2: Option<OAuth2MailConfig>,
}

/// SMTP relay with app-password credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Mail API authenticated with the OAuth2 client-credentials flow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OAuth2MailConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    /// Base URL of the send endpoint; `{sender}` is replaced by the from address
    pub send_url: String,
}

/// Generative text endpoint used to parse trip descriptions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
    pub requests_per_minute: u32,
}

/// Payment reminder settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    pub reminder_days_before: i64,
}

/// Club-wide settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClubConfig {
    /// IANA zone used for dates and times shown to people, e.g. `Europe/Warsaw`
    pub timezone: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let defaults = config::Config::try_from(&Settings::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("SKICLUB")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SkiClubError> {
        super::validation::validate_settings(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Club timezone parsed from `club.timezone`
    pub fn timezone(&self) -> Result<Tz, crate::utils::errors::SkiClubError> {
        self.club.timezone.parse::<Tz>().map_err(|e| {
            crate::utils::errors::SkiClubError::Config(format!("Invalid timezone {}: {}", self.club.timezone, e))
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_permissive: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/skiclub".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "skiclub:".to_string(),
                ttl_seconds: 3600,
            },
            auth: AuthConfig {
                jwt_secret: "dev-jwt-secret".to_string(),
                cron_secret: "dev-cron-secret".to_string(),
            },
            email: EmailConfig {
                provider: EmailProvider::Disabled,
                from_address: "biuro@skiclub.local".to_string(),
                from_name: "Klub Narciarski".to_string(),
                batch_size: 10,
                batch_delay_ms: 1000,
                smtp: None,
                oauth2: None,
            },
            ai: AiConfig {
                api_url: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_seconds: 30,
                requests_per_minute: 10,
            },
            payments: PaymentsConfig {
                reminder_days_before: 3,
            },
            club: ClubConfig {
                timezone: "Europe/Warsaw".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.timezone().unwrap(), chrono_tz::Europe::Warsaw);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut settings = Settings::default();
        settings.club.timezone = "Europe/Atlantis".to_string();
        assert!(settings.timezone().is_err());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn email_provider_deserializes_lowercase() {
        let provider: EmailProvider = serde_json::from_str("\"oauth2\"").unwrap();
        assert_eq!(provider, EmailProvider::Oauth2);
    }
}
