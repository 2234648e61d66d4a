//! Payment status derivation
//!
//! Status is a pure function of amount, amount paid, due date and today's
//! date. Only `cancelled` and `waived` are set by hand and kept as they are.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use crate::models::payment::{Payment, PaymentStatus};

/// Derive the status of a payment from its amounts and due date
pub fn derive_status(amount: i64, amount_paid: i64, due_date: NaiveDate, today: NaiveDate) -> PaymentStatus {
    if amount_paid >= amount {
        return PaymentStatus::Paid;
    }

    let partial = amount_paid > 0;
    if due_date < today {
        if partial {
            PaymentStatus::PartiallyPaidOverdue
        } else {
            PaymentStatus::Overdue
        }
    } else if partial {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Pending
    }
}

/// Status to report for a stored payment; manual statuses are sticky
pub fn effective_status(current: PaymentStatus, amount: i64, amount_paid: i64, due_date: NaiveDate, today: NaiveDate) -> PaymentStatus {
    if current.is_manual() {
        current
    } else {
        derive_status(amount, amount_paid, due_date, today)
    }
}

/// Remaining amount to pay, never negative
pub fn outstanding(amount: i64, amount_paid: i64) -> i64 {
    (amount - amount_paid).max(0)
}

impl PaymentStatus {
    /// Set by an admin rather than derived
    pub fn is_manual(&self) -> bool {
        matches!(self, PaymentStatus::Cancelled | PaymentStatus::Waived)
    }

    /// Nothing more is expected from the parent
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Cancelled | PaymentStatus::Waived)
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, PaymentStatus::Overdue | PaymentStatus::PartiallyPaidOverdue)
    }
}

impl Payment {
    pub fn effective_status(&self, today: NaiveDate) -> PaymentStatus {
        effective_status(self.status, self.amount, self.amount_paid, self.due_date, today)
    }

    pub fn outstanding(&self) -> i64 {
        if self.status.is_manual() {
            0
        } else {
            outstanding(self.amount, self.amount_paid)
        }
    }
}

/// Per-currency totals for a list of payments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrencySummary {
    pub total_due: i64,
    pub total_paid: i64,
    pub outstanding: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub payments: usize,
    pub by_currency: BTreeMap<String, CurrencySummary>,
    pub by_status: BTreeMap<String, usize>,
}

impl PaymentSummary {
    /// Aggregate payments using their effective status on `today`
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a Payment>, today: NaiveDate) -> Self {
        let mut summary = PaymentSummary::default();

        for payment in payments {
            let status = payment.effective_status(today);
            summary.payments += 1;
            *summary.by_status.entry(status.as_str().to_string()).or_insert(0) += 1;

            if status.is_manual() {
                continue;
            }
            let totals = summary.by_currency.entry(payment.currency.clone()).or_default();
            totals.total_due += payment.amount;
            totals.total_paid += payment.amount_paid;
            totals.outstanding += payment.outstanding();
        }

        summary
    }
}
