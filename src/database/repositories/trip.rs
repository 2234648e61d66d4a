//! Trip and payment template repository implementation

use sqlx::{PgPool, Postgres, Transaction};
use chrono::Utc;
use uuid::Uuid;
use crate::models::trip::{Trip, TripStatus, CreateTripRequest, UpdateTripRequest};
use crate::models::payment::{PaymentTemplate, CreatePaymentTemplateRequest};
use crate::utils::errors::SkiClubError;

const TRIP_COLUMNS: &str = "t.id, t.title, t.description, t.departure_datetime, t.departure_location, t.departure_stop2_datetime, t.departure_stop2_location, t.return_datetime, t.return_location, t.return_stop2_datetime, t.return_stop2_location, t.bank_account_pln, t.bank_account_eur, t.status, t.created_at, t.updated_at";

const TEMPLATE_COLUMNS: &str = "id, trip_id, payment_type, installment_number, amount, currency, due_date, birth_year_from, birth_year_to, description, created_at";

#[derive(Debug, Clone)]
pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a trip and link it to its groups
    pub async fn create(&self, request: CreateTripRequest) -> Result<Trip, SkiClubError> {
        let mut tx = self.pool.begin().await?;

        let trip = sqlx::query_as::<_, Trip>(&format!(
            r#"
            INSERT INTO trips AS t (title, description, departure_datetime, departure_location, departure_stop2_datetime, departure_stop2_location,
                               return_datetime, return_location, return_stop2_datetime, return_stop2_location,
                               bank_account_pln, bank_account_eur, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING {TRIP_COLUMNS}
            "#
        ))
        .bind(request.title.trim())
        .bind(request.description)
        .bind(request.departure_datetime)
        .bind(request.departure_location.trim())
        .bind(request.departure_stop2_datetime)
        .bind(request.departure_stop2_location)
        .bind(request.return_datetime)
        .bind(request.return_location.trim())
        .bind(request.return_stop2_datetime)
        .bind(request.return_stop2_location)
        .bind(request.bank_account_pln)
        .bind(request.bank_account_eur)
        .bind(request.status.unwrap_or(TripStatus::Draft))
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_groups(&mut tx, trip.id, &request.group_ids).await?;
        tx.commit().await?;

        Ok(trip)
    }

    /// Find trip by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, SkiClubError> {
        let trip = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(trip)
    }

    /// Update trip; `group_ids` replaces the group links when present
    pub async fn update(&self, id: Uuid, request: UpdateTripRequest) -> Result<Trip, SkiClubError> {
        let mut tx = self.pool.begin().await?;

        let trip = sqlx::query_as::<_, Trip>(&format!(
            r#"
            UPDATE trips AS t
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                departure_datetime = COALESCE($4, departure_datetime),
                departure_location = COALESCE($5, departure_location),
                departure_stop2_datetime = CASE WHEN $16 THEN NULL ELSE COALESCE($6, departure_stop2_datetime) END,
                departure_stop2_location = CASE WHEN $16 THEN NULL ELSE COALESCE($7, departure_stop2_location) END,
                return_datetime = COALESCE($8, return_datetime),
                return_location = COALESCE($9, return_location),
                return_stop2_datetime = CASE WHEN $17 THEN NULL ELSE COALESCE($10, return_stop2_datetime) END,
                return_stop2_location = CASE WHEN $17 THEN NULL ELSE COALESCE($11, return_stop2_location) END,
                bank_account_pln = COALESCE($12, bank_account_pln),
                bank_account_eur = COALESCE($13, bank_account_eur),
                status = COALESCE($14, status),
                updated_at = $15
            WHERE t.id = $1
            RETURNING {TRIP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.departure_datetime)
        .bind(request.departure_location)
        .bind(request.departure_stop2_datetime)
        .bind(request.departure_stop2_location)
        .bind(request.return_datetime)
        .bind(request.return_location)
        .bind(request.return_stop2_datetime)
        .bind(request.return_stop2_location)
        .bind(request.bank_account_pln)
        .bind(request.bank_account_eur)
        .bind(request.status)
        .bind(Utc::now())
        .bind(request.clear_departure_stop2)
        .bind(request.clear_return_stop2)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(group_ids) = request.group_ids.as_deref() {
            Self::replace_groups(&mut tx, id, group_ids).await?;
        }
        tx.commit().await?;

        Ok(trip)
    }

    async fn replace_groups(tx: &mut Transaction<'_, Postgres>, trip_id: Uuid, group_ids: &[Uuid]) -> Result<(), SkiClubError> {
        sqlx::query("DELETE FROM trip_groups WHERE trip_id = $1")
            .bind(trip_id)
            .execute(&mut **tx)
            .await?;

        for group_id in group_ids {
            sqlx::query("INSERT INTO trip_groups (trip_id, group_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(trip_id)
                .bind(group_id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    /// Delete trip
    pub async fn delete(&self, id: Uuid) -> Result<bool, SkiClubError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Groups linked to a trip
    pub async fn group_ids(&self, trip_id: Uuid) -> Result<Vec<Uuid>, SkiClubError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT group_id FROM trip_groups WHERE trip_id = $1")
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// All trips, newest departure first
    pub async fn list(&self) -> Result<Vec<Trip>, SkiClubError> {
        let trips = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips t ORDER BY t.departure_datetime DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    /// Published trips linked to any of the given groups
    pub async fn list_published_for_groups(&self, group_ids: &[Uuid]) -> Result<Vec<Trip>, SkiClubError> {
        let trips = sqlx::query_as::<_, Trip>(&format!(
            r#"
            SELECT DISTINCT {TRIP_COLUMNS}
            FROM trips t
            INNER JOIN trip_groups tg ON tg.trip_id = t.id
            WHERE t.status = 'published' AND tg.group_id = ANY($1)
            ORDER BY t.departure_datetime ASC
            "#
        ))
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    /// Find a trip by its exact title and departure day, used by the importer
    pub async fn find_by_title_and_departure(&self, title: &str, departure: chrono::DateTime<Utc>) -> Result<Option<Trip>, SkiClubError> {
        let trip = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips t WHERE LOWER(t.title) = LOWER($1) AND t.departure_datetime = $2"
        ))
        .bind(title.trim())
        .bind(departure)
        .fetch_optional(&self.pool)
        .await?;

        Ok(trip)
    }

    /// Count trips
    pub async fn count(&self) -> Result<i64, SkiClubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trips")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Add a payment template to a trip
    pub async fn create_template(&self, trip_id: Uuid, request: CreatePaymentTemplateRequest) -> Result<PaymentTemplate, SkiClubError> {
        let template = sqlx::query_as::<_, PaymentTemplate>(&format!(
            r#"
            INSERT INTO payment_templates (trip_id, payment_type, installment_number, amount, currency, due_date, birth_year_from, birth_year_to, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(trip_id)
        .bind(request.payment_type)
        .bind(request.installment_number)
        .bind(request.amount)
        .bind(request.currency.unwrap_or_else(|| "PLN".to_string()).to_uppercase())
        .bind(request.due_date)
        .bind(request.birth_year_from)
        .bind(request.birth_year_to)
        .bind(request.description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(template)
    }

    /// Payment templates of a trip, installments first
    pub async fn list_templates(&self, trip_id: Uuid) -> Result<Vec<PaymentTemplate>, SkiClubError> {
        let templates = sqlx::query_as::<_, PaymentTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM payment_templates WHERE trip_id = $1 ORDER BY payment_type ASC, installment_number ASC NULLS LAST, due_date ASC"
        ))
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    pub async fn find_template(&self, id: Uuid) -> Result<Option<PaymentTemplate>, SkiClubError> {
        let template = sqlx::query_as::<_, PaymentTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM payment_templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    pub async fn delete_template(&self, id: Uuid) -> Result<bool, SkiClubError> {
        let result = sqlx::query("DELETE FROM payment_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
