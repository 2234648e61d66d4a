//! Payment and payment template models
//!
//! Amounts are integer minor units (grosze for PLN, cents for EUR).

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

text_enum! {
    /// Payment status; all but `cancelled` and `waived` are derived from amounts and due date
    pub enum PaymentStatus {
        Pending => "pending",
        PartiallyPaid => "partially_paid",
        Paid => "paid",
        Overdue => "overdue",
        PartiallyPaidOverdue => "partially_paid_overdue",
        Cancelled => "cancelled",
        Waived => "waived",
    }
}

text_enum! {
    pub enum PaymentType {
        Installment => "installment",
        SeasonPass => "season_pass",
    }
}

text_enum! {
    /// Statuses an admin may pin on a payment; `none` returns it to derivation
    pub enum ManualStatus {
        Cancelled => "cancelled",
        Waived => "waived",
        None => "none",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentTemplate {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub payment_type: PaymentType,
    pub installment_number: Option<i32>,
    pub amount: i64,
    pub currency: String,
    pub due_date: NaiveDate,
    pub birth_year_from: Option<i32>,
    pub birth_year_to: Option<i32>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentTemplate {
    /// Label used in transfer titles and reminders
    pub fn label(&self) -> String {
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            return description.to_string();
        }
        match self.payment_type {
            PaymentType::Installment => format!("Rata {}", self.installment_number.unwrap_or(1)),
            PaymentType::SeasonPass => "Karnet".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub template_id: Option<Uuid>,
    pub amount: i64,
    pub amount_paid: i64,
    pub currency: String,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    pub admin_notes: Option<String>,
    pub marked_by: Option<Uuid>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment joined with the context a parent or admin needs to act on it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub trip_id: Uuid,
    pub trip_title: String,
    pub participant_id: Uuid,
    pub participant_name: String,
    pub parent_id: Uuid,
    pub parent_email: String,
    pub label: Option<String>,
    pub bank_account: Option<String>,
    #[sqlx(skip)]
    pub transfer_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePaymentTemplateRequest {
    pub payment_type: PaymentType,
    #[validate(range(min = 1, max = 24))]
    pub installment_number: Option<i32>,
    #[validate(range(min = 0))]
    pub amount: i64,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub due_date: NaiveDate,
    pub birth_year_from: Option<i32>,
    pub birth_year_to: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub amount: i64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub amount_paid: Option<i64>,
    pub admin_notes: Option<String>,
    pub manual_status: Option<ManualStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub trip_id: Option<Uuid>,
    pub status: Option<PaymentStatus>,
}
