//! Payment repository implementation

use sqlx::PgPool;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use crate::models::payment::{Payment, PaymentStatus, PaymentView};
use crate::utils::errors::SkiClubError;

const PAYMENT_COLUMNS: &str = "pay.id, pay.registration_id, pay.template_id, pay.amount, pay.amount_paid, pay.currency, pay.due_date, pay.status, pay.admin_notes, pay.marked_by, pay.paid_at, pay.created_at, pay.updated_at";

/// Payment row joined with trip, participant, parent and template label
const VIEW_SELECT: &str = r#"
    SELECT pay.id, pay.registration_id, pay.template_id, pay.amount, pay.amount_paid, pay.currency, pay.due_date,
           pay.status, pay.admin_notes, pay.marked_by, pay.paid_at, pay.created_at, pay.updated_at,
           t.id AS trip_id,
           t.title AS trip_title,
           p.id AS participant_id,
           (p.first_name || ' ' || p.last_name) AS participant_name,
           pr.id AS parent_id,
           pr.email AS parent_email,
           CASE
               WHEN pt.id IS NULL THEN NULL
               WHEN COALESCE(TRIM(pt.description), '') <> '' THEN pt.description
               WHEN pt.payment_type = 'installment' THEN 'Rata ' || COALESCE(pt.installment_number, 1)
               ELSE 'Karnet'
           END AS label,
           CASE WHEN pay.currency = 'EUR' THEN t.bank_account_eur ELSE t.bank_account_pln END AS bank_account
    FROM payments pay
    INNER JOIN trip_registrations r ON r.id = pay.registration_id
    INNER JOIN trips t ON t.id = r.trip_id
    INNER JOIN participants p ON p.id = r.participant_id
    INNER JOIN profiles pr ON pr.id = p.parent_id
    LEFT JOIN payment_templates pt ON pt.id = pay.template_id
"#;

/// Values for a payment materialized from a template
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub template_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the payments of a registration; an existing (registration, template) pair is left alone
    pub async fn create_for_registration(&self, registration_id: Uuid, payments: &[NewPayment]) -> Result<Vec<Payment>, SkiClubError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(payments.len());
        let now = Utc::now();

        for new_payment in payments {
            let payment = sqlx::query_as::<_, Payment>(&format!(
                r#"
                INSERT INTO payments AS pay (registration_id, template_id, amount, amount_paid, currency, due_date, status, created_at, updated_at)
                VALUES ($1, $2, $3, 0, $4, $5, $6, $7, $7)
                ON CONFLICT ON CONSTRAINT uq_payments_registration_template DO NOTHING
                RETURNING {PAYMENT_COLUMNS}
                "#
            ))
            .bind(registration_id)
            .bind(new_payment.template_id)
            .bind(new_payment.amount)
            .bind(&new_payment.currency)
            .bind(new_payment.due_date)
            .bind(new_payment.status)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(payment) = payment {
                created.push(payment);
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Find payment by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, SkiClubError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments pay WHERE pay.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn list_for_registration(&self, registration_id: Uuid) -> Result<Vec<Payment>, SkiClubError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments pay WHERE pay.registration_id = $1 ORDER BY pay.due_date ASC"
        ))
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Whether any payment of the registration has money recorded against it
    pub async fn any_paid_for_registration(&self, registration_id: Uuid) -> Result<bool, SkiClubError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE registration_id = $1 AND amount_paid > 0)"
        )
        .bind(registration_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Payment views, optionally restricted to one trip and/or one parent
    pub async fn list_views(&self, trip_id: Option<Uuid>, parent_id: Option<Uuid>) -> Result<Vec<PaymentView>, SkiClubError> {
        let payments = sqlx::query_as::<_, PaymentView>(&format!(
            r#"
            {VIEW_SELECT}
            WHERE ($1::uuid IS NULL OR t.id = $1)
              AND ($2::uuid IS NULL OR pr.id = $2)
            ORDER BY pay.due_date ASC, p.last_name, p.first_name
            "#
        ))
        .bind(trip_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn find_view(&self, id: Uuid) -> Result<Option<PaymentView>, SkiClubError> {
        let payment = sqlx::query_as::<_, PaymentView>(&format!("{VIEW_SELECT} WHERE pay.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Unsettled payments due on or before `until`, skipping cancelled trips
    pub async fn list_due_for_reminders(&self, until: NaiveDate) -> Result<Vec<PaymentView>, SkiClubError> {
        let payments = sqlx::query_as::<_, PaymentView>(&format!(
            r#"
            {VIEW_SELECT}
            WHERE pay.due_date <= $1
              AND pay.amount_paid < pay.amount
              AND pay.status NOT IN ('cancelled', 'waived')
              AND t.status <> 'cancelled'
            ORDER BY pr.email, pay.due_date ASC
            "#
        ))
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Persist new amount and status after an admin change
    pub async fn update_state(
        &self,
        id: Uuid,
        amount_paid: i64,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
        marked_by: Option<Uuid>,
    ) -> Result<Payment, SkiClubError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments AS pay
            SET amount_paid = $2,
                status = $3,
                paid_at = $4,
                marked_by = COALESCE($5, marked_by),
                updated_at = $6
            WHERE pay.id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(amount_paid)
        .bind(status)
        .bind(paid_at)
        .bind(marked_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn set_admin_notes(&self, id: Uuid, notes: Option<&str>) -> Result<Payment, SkiClubError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments AS pay SET admin_notes = $2, updated_at = $3 WHERE pay.id = $1 RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Store a recomputed status without touching amounts
    pub async fn set_status(&self, id: Uuid, status: PaymentStatus) -> Result<(), SkiClubError> {
        sqlx::query("UPDATE payments SET status = $2, updated_at = $3 WHERE id = $1 AND status <> $2")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
