//! Notification repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::notification::{Notification, NotificationLog, DeliveryStatus, CreateNotificationRequest};
use crate::utils::errors::SkiClubError;

const NOTIFICATION_COLUMNS: &str = "id, subject, body, target_type, target_id, created_by, sent_at, recipients_count, sent_count, failed_count, created_at";

/// A resolved recipient: email plus the first name used for personalisation
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RecipientRow {
    pub email: String,
    pub first_name: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a composed notification (not sent yet)
    pub async fn create(&self, created_by: Uuid, request: CreateNotificationRequest) -> Result<Notification, SkiClubError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (subject, body, target_type, target_id, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(request.subject.trim())
        .bind(request.body)
        .bind(request.target_type)
        .bind(request.target_id)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, SkiClubError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Most recent notifications first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Notification>, SkiClubError> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn logs(&self, notification_id: Uuid) -> Result<Vec<NotificationLog>, SkiClubError> {
        let logs = sqlx::query_as::<_, NotificationLog>(
            r#"
            SELECT id, notification_id, recipient_email, status, error, created_at
            FROM notification_logs
            WHERE notification_id = $1
            ORDER BY created_at ASC
            "#
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    pub async fn insert_log(&self, notification_id: Uuid, recipient_email: &str, status: DeliveryStatus, error: Option<&str>) -> Result<(), SkiClubError> {
        sqlx::query(
            r#"
            INSERT INTO notification_logs (notification_id, recipient_email, status, error, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#
        )
        .bind(notification_id)
        .bind(recipient_email)
        .bind(status)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Claim the notification for sending. Returns false if it was sent already.
    pub async fn claim_for_send(&self, id: Uuid) -> Result<bool, SkiClubError> {
        let result = sqlx::query("UPDATE notifications SET sent_at = $2 WHERE id = $1 AND sent_at IS NULL")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record final delivery counts
    pub async fn mark_sent(&self, id: Uuid, recipients: i32, sent: i32, failed: i32) -> Result<Notification, SkiClubError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET recipients_count = $2, sent_count = $3, failed_count = $4, sent_at = COALESCE(sent_at, $5)
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(recipients)
        .bind(sent)
        .bind(failed)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Parents with at least one participant
    pub async fn recipients_all(&self) -> Result<Vec<RecipientRow>, SkiClubError> {
        let rows = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT pr.email, pr.first_name
            FROM profiles pr
            WHERE EXISTS (SELECT 1 FROM participants p WHERE p.parent_id = pr.id)
            ORDER BY pr.last_name, pr.first_name
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Parents of participants in a group
    pub async fn recipients_for_group(&self, group_id: Uuid) -> Result<Vec<RecipientRow>, SkiClubError> {
        let rows = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT pr.email, pr.first_name
            FROM participant_groups pg
            INNER JOIN participants p ON p.id = pg.participant_id
            INNER JOIN profiles pr ON pr.id = p.parent_id
            WHERE pg.group_id = $1
            ORDER BY pr.last_name, pr.first_name
            "#
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Parents of participants registered for a trip
    pub async fn recipients_for_trip(&self, trip_id: Uuid) -> Result<Vec<RecipientRow>, SkiClubError> {
        let rows = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT pr.email, pr.first_name
            FROM trip_registrations r
            INNER JOIN participants p ON p.id = r.participant_id
            INNER JOIN profiles pr ON pr.id = p.parent_id
            WHERE r.trip_id = $1
            ORDER BY pr.last_name, pr.first_name
            "#
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn recipient_profile(&self, profile_id: Uuid) -> Result<Vec<RecipientRow>, SkiClubError> {
        let rows = sqlx::query_as::<_, RecipientRow>(
            "SELECT email, first_name FROM profiles WHERE id = $1"
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
