//! Notification service implementation
//!
//! Resolves the recipients of a bulk notification, renders it per recipient
//! and sends it in fixed-size batches. Every delivery attempt is logged.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;
use crate::config::settings::EmailConfig;
use crate::database::{DatabaseService, RecipientRow};
use crate::models::{
    CreateNotificationRequest, DeliveryStatus, Notification, NotificationDetails, TargetType,
};
use crate::services::email::{escape_html, render_template, send_logged, EmailSender, OutgoingEmail};
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::helpers::normalize_email;

/// Trim, lowercase and drop duplicates and blanks, keeping first-seen order
pub fn dedupe_emails<I, S>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    emails
        .into_iter()
        .map(|email| normalize_email(email.as_ref()))
        .filter(|email| !email.is_empty() && seen.insert(email.clone()))
        .collect()
}

/// Same as [`dedupe_emails`] but keeps the first name seen for each address
pub fn dedupe_recipients(rows: Vec<RecipientRow>) -> Vec<RecipientRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|row| {
            let email = normalize_email(&row.email);
            (!email.is_empty() && seen.insert(email.clone())).then(|| RecipientRow { email, first_name: row.first_name })
        })
        .collect()
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        self.error.is_none()
    }
}

/// Send messages in batches of `batch_size`, concurrently within a batch,
/// pausing `batch_delay` between batches. Failures do not stop the run.
pub async fn send_batched<S>(sender: &S, emails: &[OutgoingEmail], batch_size: usize, batch_delay: Duration) -> Vec<DeliveryOutcome>
where
    S: EmailSender + ?Sized,
{
    let mut outcomes = Vec::with_capacity(emails.len());
    let batch_size = batch_size.max(1);

    for (index, batch) in emails.chunks(batch_size).enumerate() {
        if index > 0 && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }

        let results = join_all(batch.iter().map(|email| send_logged(sender, email))).await;
        outcomes.extend(batch.iter().zip(results).map(|(email, result)| DeliveryOutcome {
            recipient: email.to.clone(),
            error: result.err(),
        }));
    }

    outcomes
}

/// Render the notification for a single recipient
pub fn personalize(notification: &Notification, recipient: &RecipientRow) -> OutgoingEmail {
    let plain_vars = HashMap::from([
        ("first_name", recipient.first_name.clone()),
        ("email", recipient.email.clone()),
    ]);
    let html_vars: HashMap<&str, String> = plain_vars
        .iter()
        .map(|(key, value)| (*key, escape_html(value)))
        .collect();

    OutgoingEmail {
        to: recipient.email.clone(),
        to_name: Some(recipient.first_name.clone()).filter(|name| !name.trim().is_empty()),
        subject: render_template(&notification.subject, &plain_vars),
        html_body: render_template(&notification.body, &html_vars),
    }
}

#[derive(Clone)]
pub struct NotificationService {
    db: DatabaseService,
    sender: Arc<dyn EmailSender>,
    batch_size: usize,
    batch_delay: Duration,
}

impl NotificationService {
    pub fn new(db: DatabaseService, sender: Arc<dyn EmailSender>, config: &EmailConfig) -> Self {
        Self {
            db,
            sender,
            batch_size: config.batch_size,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }

    /// Store a new notification after checking its target exists
    pub async fn create(&self, admin_id: Uuid, request: CreateNotificationRequest) -> Result<Notification> {
        match (request.target_type, request.target_id) {
            (TargetType::All, _) => {}
            (_, None) => {
                return Err(SkiClubError::Validation(format!("target_id is required for target type {}", request.target_type)));
            }
            (TargetType::Group, Some(id)) => {
                self.db.groups.find_by_id(id).await?.ok_or_else(|| SkiClubError::not_found("group", id))?;
            }
            (TargetType::Trip, Some(id)) => {
                self.db.trips.find_by_id(id).await?.ok_or_else(|| SkiClubError::not_found("trip", id))?;
            }
            (TargetType::Individual, Some(id)) => {
                self.db.profiles.find_by_id(id).await?.ok_or_else(|| SkiClubError::not_found("profile", id))?;
            }
        }

        let request = CreateNotificationRequest {
            target_id: if request.target_type == TargetType::All { None } else { request.target_id },
            ..request
        };
        self.db.notifications.create(admin_id, request).await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Notification>> {
        self.db.notifications.list(limit, offset).await
    }

    pub async fn details(&self, id: Uuid) -> Result<NotificationDetails> {
        let notification = self.find(id).await?;
        let logs = self.db.notifications.logs(id).await?;
        Ok(NotificationDetails { notification, logs })
    }

    /// Recipients of a notification, deduplicated
    pub async fn resolve_recipients(&self, notification: &Notification) -> Result<Vec<RecipientRow>> {
        let rows = match (notification.target_type, notification.target_id) {
            (TargetType::All, _) => self.db.notifications.recipients_all().await?,
            (TargetType::Group, Some(id)) => self.db.notifications.recipients_for_group(id).await?,
            (TargetType::Trip, Some(id)) => self.db.notifications.recipients_for_trip(id).await?,
            (TargetType::Individual, Some(id)) => self.db.notifications.recipient_profile(id).await?,
            (target, None) => {
                return Err(SkiClubError::Validation(format!("Notification targets {target} without target_id")));
            }
        };

        Ok(dedupe_recipients(rows))
    }

    /// Send a composed notification to all its recipients
    pub async fn send(&self, id: Uuid) -> Result<Notification> {
        let notification = self.find(id).await?;
        if notification.sent_at.is_some() {
            return Err(SkiClubError::Conflict("Notification has already been sent".to_string()));
        }

        let recipients = self.resolve_recipients(&notification).await?;
        if recipients.is_empty() {
            return Err(SkiClubError::Validation("Notification has no recipients".to_string()));
        }

        if !self.db.notifications.claim_for_send(id).await? {
            return Err(SkiClubError::Conflict("Notification has already been sent".to_string()));
        }

        let emails: Vec<OutgoingEmail> = recipients.iter().map(|r| personalize(&notification, r)).collect();
        info!(notification_id = %id, recipients = emails.len(), batch_size = self.batch_size, "Sending notification");

        let outcomes = send_batched(self.sender.as_ref(), &emails, self.batch_size, self.batch_delay).await;

        // Log write failures are not fatal; the notification is always marked sent
        for outcome in &outcomes {
            let status = if outcome.is_sent() { DeliveryStatus::Sent } else { DeliveryStatus::Failed };
            if let Err(e) = self.db.notifications
                .insert_log(id, &outcome.recipient, status, outcome.error.as_deref())
                .await
            {
                warn!(notification_id = %id, recipient = %outcome.recipient, error = %e, "Failed to write notification log");
            }
        }

        let sent = outcomes.iter().filter(|o| o.is_sent()).count();
        let failed = outcomes.len() - sent;
        info!(notification_id = %id, sent = sent, failed = failed, "Notification sent");

        self.db.notifications
            .mark_sent(id, outcomes.len() as i32, sent as i32, failed as i32)
            .await
    }

    async fn find(&self, id: Uuid) -> Result<Notification> {
        self.db.notifications.find_by_id(id).await?
            .ok_or_else(|| SkiClubError::not_found("notification", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use crate::utils::errors::{EmailError, EmailResult};

    #[test]
    fn test_dedupe_emails_keeps_first_seen_order() {
        let emails = dedupe_emails([" Anna@Example.pl", "jan@example.pl", "anna@example.pl ", "", "  ", "JAN@example.pl", "ola@example.pl"]);
        assert_eq!(emails, vec!["anna@example.pl", "jan@example.pl", "ola@example.pl"]);
    }

    #[test]
    fn test_dedupe_recipients_keeps_first_name() {
        let rows = vec![
            RecipientRow { email: "Anna@example.pl".to_string(), first_name: "Anna".to_string() },
            RecipientRow { email: "anna@example.pl".to_string(), first_name: "Other".to_string() },
        ];
        let deduped = dedupe_recipients(rows);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].first_name, "Anna");
        assert_eq!(deduped[0].email, "anna@example.pl");
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, email: &OutgoingEmail) -> EmailResult<()> {
            self.sent.lock().unwrap().push(email.to.clone());
            if self.fail_for.as_deref() == Some(email.to.as_str()) {
                return Err(EmailError::Api("mailbox unavailable".to_string()));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            to_name: None,
            subject: "Hello".to_string(),
            html_body: "<p>Hello</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_batched_sends_once_per_recipient() {
        let sender = RecordingSender { fail_for: Some("c@example.pl".to_string()), ..Default::default() };
        let emails: Vec<_> = ["a@example.pl", "b@example.pl", "c@example.pl", "d@example.pl", "e@example.pl"]
            .into_iter()
            .map(email)
            .collect();

        let outcomes = send_batched(&sender, &emails, 2, Duration::from_millis(1)).await;

        assert_eq!(outcomes.len(), 5);
        assert_eq!(sender.sent.lock().unwrap().len(), 5);
        assert_eq!(outcomes.iter().filter(|o| !o.is_sent()).count(), 1);
        assert_eq!(outcomes[2].recipient, "c@example.pl");
        assert!(outcomes[2].error.as_deref().unwrap().contains("mailbox unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_batched_waits_between_batches() {
        let sender = RecordingSender::default();
        let emails: Vec<_> = (0..5).map(|i| email(&format!("p{i}@example.pl"))).collect();

        let started = tokio::time::Instant::now();
        send_batched(&sender, &emails, 2, Duration::from_secs(1)).await;

        // three batches, two pauses
        assert_eq!(started.elapsed().as_secs(), 2);
    }

    #[test]
    fn test_personalize_escapes_variables_in_body() {
        let notification = Notification {
            id: Uuid::new_v4(),
            subject: "Hi {{first_name}}".to_string(),
            body: "<p>Dear {{first_name}}</p>".to_string(),
            target_type: TargetType::All,
            target_id: None,
            created_by: None,
            sent_at: None,
            recipients_count: 0,
            sent_count: 0,
            failed_count: 0,
            created_at: Utc::now(),
        };
        let recipient = RecipientRow { email: "a@example.pl".to_string(), first_name: "<Ola>".to_string() };

        let email = personalize(&notification, &recipient);
        assert_eq!(email.subject, "Hi <Ola>");
        assert_eq!(email.html_body, "<p>Dear &lt;Ola&gt;</p>");
    }
}
