//! Services module
//!
//! This module contains business logic services

pub mod ai;
pub mod auth;
pub mod contract;
pub mod email;
pub mod import;
pub mod notification;
pub mod payment_status;
pub mod payments;
pub mod redis;
pub mod registration;
pub mod reminders;
pub mod trip;

// Re-export commonly used services
pub use ai::{AiService, ParsedTrip};
pub use auth::{AuthService, Claims};
pub use contract::{ContractService, GenerationSummary};
pub use email::{build_sender, EmailSender, OutgoingEmail};
pub use import::{Importer, ImportStore, PgImportStore};
pub use notification::NotificationService;
pub use payment_status::PaymentSummary;
pub use payments::PaymentService;
pub use redis::RedisService;
pub use registration::{RegistrationOutcome, RegistrationService};
pub use reminders::{ReminderRunResult, ReminderService};
pub use trip::TripService;

use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::middleware::rate_limit::UserRateLimiter;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub trip_service: TripService,
    pub registration_service: RegistrationService,
    pub payment_service: PaymentService,
    pub contract_service: ContractService,
    pub notification_service: NotificationService,
    pub reminder_service: ReminderService,
    pub ai_service: AiService,
    pub import_service: Arc<Importer<PgImportStore>>,
    pub ai_rate_limiter: UserRateLimiter,
    pub redis_service: Option<RedisService>,
    pub timezone: Tz,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized.
    ///
    /// `redis` is optional; without it the reminder job runs unlocked.
    pub fn new(db: DatabaseService, settings: &Settings, redis: Option<RedisService>) -> Result<Self> {
        let sender = build_sender(&settings.email)?;
        Self::with_sender(db, settings, redis, sender)
    }

    /// Same as [`ServiceFactory::new`] with an explicit email transport
    pub fn with_sender(
        db: DatabaseService,
        settings: &Settings,
        redis: Option<RedisService>,
        sender: Arc<dyn EmailSender>,
    ) -> Result<Self> {
        let timezone = settings.timezone()?;

        Ok(Self {
            auth_service: AuthService::new(db.clone(), &settings.auth),
            trip_service: TripService::new(db.clone()),
            registration_service: RegistrationService::new(db.clone(), timezone),
            payment_service: PaymentService::new(db.clone(), timezone),
            contract_service: ContractService::new(db.clone(), timezone),
            notification_service: NotificationService::new(db.clone(), sender.clone(), &settings.email),
            reminder_service: ReminderService::new(
                db.clone(),
                redis.clone(),
                sender,
                settings.payments.reminder_days_before,
                settings.email.batch_size,
                settings.email.batch_delay_ms,
            ),
            ai_service: AiService::new(settings.ai.clone())?,
            import_service: Arc::new(Importer::new(PgImportStore::new(db), timezone)),
            ai_rate_limiter: UserRateLimiter::per_minute(settings.ai.requests_per_minute),
            redis_service: redis,
            timezone,
        })
    }

    /// Health check for optional services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let redis_healthy = match &self.redis_service {
            Some(redis) => Some(redis.health_check().await),
            None => None,
        };

        ServiceHealthStatus {
            redis_healthy,
            ai_enabled: self.ai_service.is_enabled(),
        }
    }
}

/// Health status for optional services; `None` means not configured
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub redis_healthy: Option<bool>,
    pub ai_enabled: bool,
}

impl ServiceHealthStatus {
    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.redis_healthy == Some(false) {
            issues.push("Redis connection failed".to_string());
        }
        if !self.ai_enabled {
            issues.push("Trip parsing not configured".to_string());
        }

        issues
    }
}
