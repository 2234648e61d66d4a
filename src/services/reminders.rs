//! Daily payment reminders
//!
//! Triggered by an external scheduler. Unsettled payments due within the
//! configured window (or already overdue) are grouped per parent and each
//! parent gets one email listing them.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use crate::database::DatabaseService;
use crate::models::PaymentView;
use crate::services::email::{escape_html, EmailSender, OutgoingEmail};
use crate::services::notification::send_batched;
use crate::services::payment_status::outstanding;
use crate::services::payments::transfer_title;
use crate::services::redis::RedisService;
use crate::utils::errors::Result;
use crate::utils::helpers::{format_amount, format_date, normalize_email};

/// Lock lifetime; longer than a day so a slow run cannot overlap the next
const LOCK_TTL_SECONDS: u64 = 26 * 60 * 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRunResult {
    pub parents: usize,
    pub payments: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped_locked: bool,
}

/// Payments of one parent that need a reminder
#[derive(Debug, Clone)]
pub struct ParentReminder {
    pub email: String,
    pub items: Vec<PaymentView>,
}

/// Group payment views per parent email, keeping first-seen order
pub fn group_by_parent(views: Vec<PaymentView>) -> Vec<ParentReminder> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut reminders: Vec<ParentReminder> = Vec::new();

    for view in views {
        let email = normalize_email(&view.parent_email);
        if email.is_empty() {
            continue;
        }
        match index.get(&email) {
            Some(&position) => reminders[position].items.push(view),
            None => {
                index.insert(email.clone(), reminders.len());
                reminders.push(ParentReminder { email, items: vec![view] });
            }
        }
    }

    reminders
}

/// Render the reminder email for one parent
pub fn build_reminder_email(reminder: &ParentReminder, today: NaiveDate) -> OutgoingEmail {
    let mut rows = String::new();

    for item in &reminder.items {
        let payment = &item.payment;
        let label = item.label.as_deref().unwrap_or("Płatność");
        let due = if payment.due_date < today {
            format!("{} (po terminie)", format_date(payment.due_date))
        } else {
            format_date(payment.due_date)
        };
        let account = item.bank_account.as_deref().unwrap_or("-");
        let title = transfer_title(&item.participant_name, &item.trip_title, item.label.as_deref());

        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&item.participant_name),
            escape_html(&item.trip_title),
            escape_html(label),
            format_amount(outstanding(payment.amount, payment.amount_paid), &payment.currency),
            due,
            escape_html(account),
            escape_html(&title),
        ));
    }

    let html_body = format!(
        "<p>Dzień dobry,</p>\n\
         <p>przypominamy o zbliżających się lub zaległych płatnościach:</p>\n\
         <table>\n<tr><th>Uczestnik</th><th>Wyjazd</th><th>Płatność</th><th>Do zapłaty</th><th>Termin</th><th>Konto</th><th>Tytuł przelewu</th></tr>\n\
         {rows}</table>\n\
         <p>Jeśli płatność została już wykonana, prosimy zignorować tę wiadomość.</p>"
    );

    OutgoingEmail {
        to: reminder.email.clone(),
        to_name: None,
        subject: format!("Przypomnienie o płatnościach ({})", reminder.items.len()),
        html_body,
    }
}

#[derive(Clone)]
pub struct ReminderService {
    db: DatabaseService,
    redis: Option<RedisService>,
    sender: Arc<dyn EmailSender>,
    days_before: i64,
    batch_size: usize,
    batch_delay: std::time::Duration,
}

impl ReminderService {
    pub fn new(
        db: DatabaseService,
        redis: Option<RedisService>,
        sender: Arc<dyn EmailSender>,
        days_before: i64,
        batch_size: usize,
        batch_delay_ms: u64,
    ) -> Self {
        Self {
            db,
            redis,
            sender,
            days_before,
            batch_size,
            batch_delay: std::time::Duration::from_millis(batch_delay_ms),
        }
    }

    fn lock_key(today: NaiveDate) -> String {
        format!("reminders:{}", today.format("%Y-%m-%d"))
    }

    /// Run the reminder job for `today`, at most once per day
    pub async fn run(&self, today: NaiveDate) -> Result<ReminderRunResult> {
        let lock_key = Self::lock_key(today);
        let mut locked = false;

        if let Some(redis) = &self.redis {
            match redis.acquire_lock(&lock_key, LOCK_TTL_SECONDS).await {
                Ok(true) => locked = true,
                Ok(false) => {
                    info!(date = %today, "Payment reminders already ran today");
                    return Ok(ReminderRunResult { skipped_locked: true, ..Default::default() });
                }
                Err(e) => warn!(error = %e, "Redis unavailable, running reminders without lock"),
            }
        }

        let result = self.send_reminders(today).await;

        if result.is_err() && locked {
            if let Some(redis) = &self.redis {
                if let Err(e) = redis.release_lock(&lock_key).await {
                    warn!(error = %e, "Failed to release reminder lock");
                }
            }
        }

        result
    }

    async fn send_reminders(&self, today: NaiveDate) -> Result<ReminderRunResult> {
        let until = today + Duration::days(self.days_before.max(0));
        let mut views = self.db.payments.list_due_for_reminders(until).await?;

        for view in views.iter_mut() {
            let status = view.payment.effective_status(today);
            if status != view.payment.status {
                self.db.payments.set_status(view.payment.id, status).await?;
                view.payment.status = status;
            }
        }
        views.retain(|view| !view.payment.status.is_settled());

        let payments = views.len();
        let reminders = group_by_parent(views);
        let emails: Vec<OutgoingEmail> = reminders.iter().map(|r| build_reminder_email(r, today)).collect();

        let outcomes = send_batched(self.sender.as_ref(), &emails, self.batch_size, self.batch_delay).await;
        let sent = outcomes.iter().filter(|o| o.is_sent()).count();

        let result = ReminderRunResult {
            parents: reminders.len(),
            payments,
            sent,
            failed: outcomes.len() - sent,
            skipped_locked: false,
        };

        info!(
            date = %today,
            parents = result.parents,
            payments = result.payments,
            sent = result.sent,
            failed = result.failed,
            "Payment reminders finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use crate::models::{Payment, PaymentStatus};

    fn view(parent_email: &str, child: &str, due: NaiveDate) -> PaymentView {
        PaymentView {
            payment: Payment {
                id: Uuid::new_v4(),
                registration_id: Uuid::new_v4(),
                template_id: None,
                amount: 80_000,
                amount_paid: 30_000,
                currency: "PLN".to_string(),
                due_date: due,
                status: PaymentStatus::PartiallyPaid,
                admin_notes: None,
                marked_by: None,
                paid_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            trip_id: Uuid::new_v4(),
            trip_title: "Zakopane".to_string(),
            participant_id: Uuid::new_v4(),
            participant_name: child.to_string(),
            parent_id: Uuid::new_v4(),
            parent_email: parent_email.to_string(),
            label: Some("Rata 2".to_string()),
            bank_account: Some("PL61 1090 1014 0000 0712 1981 2874".to_string()),
            transfer_title: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn test_group_by_parent_merges_case_insensitive() {
        let grouped = group_by_parent(vec![
            view("Anna@example.pl", "Jan", day(12)),
            view("ola@example.pl", "Zosia", day(12)),
            view("anna@example.pl", "Kasia", day(14)),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].email, "anna@example.pl");
        assert_eq!(grouped[0].items.len(), 2);
        assert_eq!(grouped[1].items.len(), 1);
    }

    #[test]
    fn test_reminder_email_lists_items() {
        let reminder = ParentReminder {
            email: "anna@example.pl".to_string(),
            items: vec![view("anna@example.pl", "Jan Nowak", day(5)), view("anna@example.pl", "Kasia Nowak", day(20))],
        };

        let email = build_reminder_email(&reminder, day(10));

        assert_eq!(email.to, "anna@example.pl");
        assert!(email.subject.contains("(2)"));
        assert!(email.html_body.contains("500.00 PLN"));
        assert!(email.html_body.contains("05.01.2026 (po terminie)"));
        assert!(email.html_body.contains("Jan Nowak - Zakopane - Rata 2"));
        assert!(email.html_body.contains("20.01.2026</td>"));
    }

    #[test]
    fn test_lock_key_is_per_day() {
        assert_eq!(ReminderService::lock_key(day(7)), "reminders:2026-01-07");
    }
}
