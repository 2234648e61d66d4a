//! Payment obligations and admin payment actions

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::info;
use uuid::Uuid;
use crate::database::{DatabaseService, NewPayment};
use crate::models::{
    ManualStatus, Participant, Payment, PaymentFilter, PaymentStatus, PaymentTemplate, PaymentType,
    PaymentView, UpdatePaymentRequest,
};
use crate::services::payment_status::{derive_status, PaymentSummary};
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::helpers::local_today;
use crate::utils::logging::log_admin_action;

/// Templates that apply to a participant born on `birth_date`.
///
/// Every installment applies; a season pass applies only when the birth year
/// falls inside its range (open ends allowed).
pub fn applicable_templates(templates: &[PaymentTemplate], birth_date: NaiveDate) -> Vec<&PaymentTemplate> {
    let year = birth_date.year();

    templates
        .iter()
        .filter(|template| match template.payment_type {
            PaymentType::Installment => true,
            PaymentType::SeasonPass => {
                template.birth_year_from.map_or(true, |from| year >= from)
                    && template.birth_year_to.map_or(true, |to| year <= to)
            }
        })
        .collect()
}

/// Payments to create for a fresh registration
pub fn payments_for(templates: &[PaymentTemplate], birth_date: NaiveDate, today: NaiveDate) -> Vec<NewPayment> {
    applicable_templates(templates, birth_date)
        .into_iter()
        .map(|template| NewPayment {
            template_id: template.id,
            amount: template.amount,
            currency: template.currency.clone(),
            due_date: template.due_date,
            status: derive_status(template.amount, 0, template.due_date, today),
        })
        .collect()
}

/// Title a parent writes on the bank transfer
pub fn transfer_title(participant_name: &str, trip_title: &str, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.trim().is_empty() => format!("{participant_name} - {trip_title} - {label}"),
        _ => format!("{participant_name} - {trip_title}"),
    }
}

/// Largest amount in minor units accepted for a single payment (10 million)
pub const MAX_AMOUNT: i64 = 1_000_000_000;

/// Amount and status after adding `amount` to a payment
pub fn apply_payment(payment: &Payment, amount: i64, today: NaiveDate) -> Result<(i64, PaymentStatus)> {
    if amount <= 0 {
        return Err(SkiClubError::Validation("Amount must be greater than zero".to_string()));
    }
    if payment.status.is_manual() {
        return Err(SkiClubError::Validation(format!(
            "Payment is {}; clear the manual status before recording money",
            payment.status
        )));
    }

    let amount_paid = payment.amount_paid
        .checked_add(amount)
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or_else(|| SkiClubError::Validation("Amount is too large".to_string()))?;
    Ok((amount_paid, derive_status(payment.amount, amount_paid, payment.due_date, today)))
}

/// Fill in derived status and transfer instructions for display
fn present(mut view: PaymentView, today: NaiveDate) -> PaymentView {
    view.payment.status = view.payment.effective_status(today);
    view.transfer_title = Some(transfer_title(&view.participant_name, &view.trip_title, view.label.as_deref()));
    view
}

#[derive(Clone)]
pub struct PaymentService {
    db: DatabaseService,
    timezone: Tz,
}

impl PaymentService {
    pub fn new(db: DatabaseService, timezone: Tz) -> Self {
        Self { db, timezone }
    }

    /// Create the payments of a registration from the trip's templates
    pub async fn create_for_registration(&self, registration_id: Uuid, trip_id: Uuid, participant: &Participant) -> Result<Vec<Payment>> {
        let templates = self.db.trips.list_templates(trip_id).await?;
        let new_payments = payments_for(&templates, participant.birth_date, local_today(self.timezone));

        let created = self.db.payments.create_for_registration(registration_id, &new_payments).await?;
        info!(registration_id = %registration_id, payments = created.len(), "Payments created for registration");
        Ok(created)
    }

    /// Payments of all children of a parent
    pub async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<PaymentView>> {
        let today = local_today(self.timezone);
        let views = self.db.payments.list_views(None, Some(parent_id)).await?;
        Ok(views.into_iter().map(|view| present(view, today)).collect())
    }

    /// Admin listing with optional trip and status filters
    pub async fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentView>> {
        let today = local_today(self.timezone);
        let views = self.db.payments.list_views(filter.trip_id, None).await?;

        Ok(views
            .into_iter()
            .map(|view| present(view, today))
            .filter(|view| filter.status.map_or(true, |status| view.payment.status == status))
            .collect())
    }

    pub async fn summary(&self, trip_id: Uuid) -> Result<PaymentSummary> {
        self.db.trips.find_by_id(trip_id).await?
            .ok_or_else(|| SkiClubError::not_found("trip", trip_id))?;

        let views = self.db.payments.list_views(Some(trip_id), None).await?;
        let payments: Vec<Payment> = views.into_iter().map(|view| view.payment).collect();
        Ok(PaymentSummary::from_payments(&payments, local_today(self.timezone)))
    }

    /// Add money received to a payment
    pub async fn record_payment(&self, payment_id: Uuid, amount: i64, admin_id: Uuid, note: Option<&str>) -> Result<PaymentView> {
        let payment = self.find(payment_id).await?;
        let today = local_today(self.timezone);
        let (amount_paid, status) = apply_payment(&payment, amount, today)?;

        let paid_at = match status {
            PaymentStatus::Paid => payment.paid_at.or_else(|| Some(Utc::now())),
            _ => None,
        };
        self.db.payments.update_state(payment_id, amount_paid, status, paid_at, Some(admin_id)).await?;

        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            let notes = match payment.admin_notes.as_deref() {
                Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
                _ => note.to_string(),
            };
            self.db.payments.set_admin_notes(payment_id, Some(&notes)).await?;
        }

        log_admin_action(admin_id, "record_payment", Some(&payment_id.to_string()), Some(&amount.to_string()));
        self.view(payment_id).await
    }

    /// Admin edit: amount paid, notes and manual status
    pub async fn update(&self, payment_id: Uuid, request: UpdatePaymentRequest, admin_id: Uuid) -> Result<PaymentView> {
        let payment = self.find(payment_id).await?;
        let today = local_today(self.timezone);

        if request.amount_paid.is_some() || request.manual_status.is_some() {
            let amount_paid = request.amount_paid.unwrap_or(payment.amount_paid);
            if amount_paid < 0 {
                return Err(SkiClubError::Validation("Amount paid cannot be negative".to_string()));
            }

            let status = match request.manual_status {
                Some(ManualStatus::Cancelled) => PaymentStatus::Cancelled,
                Some(ManualStatus::Waived) => PaymentStatus::Waived,
                Some(ManualStatus::None) => derive_status(payment.amount, amount_paid, payment.due_date, today),
                None if payment.status.is_manual() => payment.status,
                None => derive_status(payment.amount, amount_paid, payment.due_date, today),
            };
            let paid_at = match status {
                PaymentStatus::Paid => payment.paid_at.or_else(|| Some(Utc::now())),
                _ => None,
            };

            self.db.payments.update_state(payment_id, amount_paid, status, paid_at, Some(admin_id)).await?;
        }

        if let Some(notes) = request.admin_notes.as_deref() {
            let notes = Some(notes.trim()).filter(|n| !n.is_empty());
            self.db.payments.set_admin_notes(payment_id, notes).await?;
        }

        log_admin_action(admin_id, "update_payment", Some(&payment_id.to_string()), None);
        self.view(payment_id).await
    }

    async fn find(&self, payment_id: Uuid) -> Result<Payment> {
        self.db.payments.find_by_id(payment_id).await?
            .ok_or_else(|| SkiClubError::not_found("payment", payment_id))
    }

    async fn view(&self, payment_id: Uuid) -> Result<PaymentView> {
        let view = self.db.payments.find_view(payment_id).await?
            .ok_or_else(|| SkiClubError::not_found("payment", payment_id))?;
        Ok(present(view, local_today(self.timezone)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template(payment_type: PaymentType, number: Option<i32>, years: (Option<i32>, Option<i32>)) -> PaymentTemplate {
        PaymentTemplate {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            payment_type,
            installment_number: number,
            amount: 50_000,
            currency: "PLN".to_string(),
            due_date: day(2026, 1, 15),
            birth_year_from: years.0,
            birth_year_to: years.1,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_installments_always_apply() {
        let templates = vec![
            template(PaymentType::Installment, Some(1), (None, None)),
            template(PaymentType::Installment, Some(2), (None, None)),
        ];
        assert_eq!(applicable_templates(&templates, day(2012, 6, 1)).len(), 2);
    }

    #[test]
    fn test_season_pass_respects_birth_year_range() {
        let templates = vec![
            template(PaymentType::Installment, Some(1), (None, None)),
            template(PaymentType::SeasonPass, None, (Some(2010), Some(2014))),
            template(PaymentType::SeasonPass, None, (Some(2015), Some(2020))),
        ];

        let for_2012 = applicable_templates(&templates, day(2012, 6, 1));
        assert_eq!(for_2012.len(), 2);
        assert!(for_2012.iter().any(|t| t.birth_year_to == Some(2014)));

        let for_2014 = applicable_templates(&templates, day(2014, 12, 31));
        assert!(for_2014.iter().any(|t| t.birth_year_to == Some(2014)));

        let for_2021 = applicable_templates(&templates, day(2021, 1, 1));
        assert_eq!(for_2021.len(), 1);
    }

    #[test]
    fn test_new_payments_copy_template_and_derive_status() {
        let templates = vec![template(PaymentType::Installment, Some(1), (None, None))];
        let payments = payments_for(&templates, day(2012, 1, 1), day(2026, 2, 1));

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 50_000);
        assert_eq!(payments[0].due_date, day(2026, 1, 15));
        assert_eq!(payments[0].status, PaymentStatus::Overdue);
    }

    #[test]
    fn test_transfer_title() {
        assert_eq!(transfer_title("Jan Kowalski", "Zakopane", Some("Rata 1")), "Jan Kowalski - Zakopane - Rata 1");
        assert_eq!(transfer_title("Jan Kowalski", "Zakopane", None), "Jan Kowalski - Zakopane");
    }

    fn payment(amount: i64, paid: i64, status: PaymentStatus) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
            template_id: None,
            amount,
            amount_paid: paid,
            currency: "PLN".to_string(),
            due_date: day(2026, 1, 15),
            status,
            admin_notes: None,
            marked_by: None,
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_payment() {
        let today = day(2026, 1, 10);
        let p = payment(100_000, 20_000, PaymentStatus::PartiallyPaid);

        assert_eq!(apply_payment(&p, 30_000, today).unwrap(), (50_000, PaymentStatus::PartiallyPaid));
        assert_eq!(apply_payment(&p, 80_000, today).unwrap(), (100_000, PaymentStatus::Paid));
        assert!(matches!(apply_payment(&p, 0, today), Err(SkiClubError::Validation(_))));

        let waived = payment(100_000, 0, PaymentStatus::Waived);
        assert!(apply_payment(&waived, 10, today).is_err());
    }

    #[test]
    fn test_apply_payment_rejects_overflowing_amount() {
        let today = day(2026, 1, 10);
        let p = payment(100_000, 20_000, PaymentStatus::PartiallyPaid);

        assert!(matches!(apply_payment(&p, i64::MAX, today), Err(SkiClubError::Validation(_))));
        assert!(matches!(apply_payment(&p, MAX_AMOUNT, today), Err(SkiClubError::Validation(_))));
        assert_eq!(apply_payment(&p, MAX_AMOUNT - 20_000, today).unwrap().0, MAX_AMOUNT);
    }

    #[test]
    fn test_record_request_caps_amount() {
        use crate::models::RecordPaymentRequest;
        use validator::Validate;

        let request = RecordPaymentRequest { amount: i64::MAX, note: None };
        assert!(request.validate().is_err());

        let request = RecordPaymentRequest { amount: 50_000, note: None };
        assert!(request.validate().is_ok());
    }
}
