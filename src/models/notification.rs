//! Notification and delivery log models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

text_enum! {
    /// Who a notification goes to
    pub enum TargetType {
        All => "all",
        Group => "group",
        Trip => "trip",
        Individual => "individual",
    }
}

text_enum! {
    pub enum DeliveryStatus {
        Sent => "sent",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub target_type: TargetType,
    pub target_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub sent_at: Option<DateTime<Utc>>,
    pub recipients_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationLog {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub recipient_email: String,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDetails {
    #[serde(flatten)]
    pub notification: Notification,
    pub logs: Vec<NotificationLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub body: String,
    pub target_type: TargetType,
    pub target_id: Option<Uuid>,
}
