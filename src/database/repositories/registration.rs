//! Trip registration repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::registration::{TripRegistration, RegistrationView, ParticipationStatus};
use crate::utils::errors::SkiClubError;

const REGISTRATION_COLUMNS: &str = "r.id, r.trip_id, r.participant_id, r.registered_by, r.participation_status, r.is_outside_group, r.created_at";

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a participant for a trip
    pub async fn create(&self, trip_id: Uuid, participant_id: Uuid, registered_by: Uuid, is_outside_group: bool) -> Result<TripRegistration, SkiClubError> {
        let registration = sqlx::query_as::<_, TripRegistration>(&format!(
            r#"
            INSERT INTO trip_registrations AS r (trip_id, participant_id, registered_by, participation_status, is_outside_group, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(trip_id)
        .bind(participant_id)
        .bind(registered_by)
        .bind(ParticipationStatus::Unconfirmed)
        .bind(is_outside_group)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TripRegistration>, SkiClubError> {
        let registration = sqlx::query_as::<_, TripRegistration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM trip_registrations r WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    pub async fn find_by_trip_participant(&self, trip_id: Uuid, participant_id: Uuid) -> Result<Option<TripRegistration>, SkiClubError> {
        let registration = sqlx::query_as::<_, TripRegistration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM trip_registrations r WHERE r.trip_id = $1 AND r.participant_id = $2"
        ))
        .bind(trip_id)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Registrations of a trip with participant, parent and group data
    pub async fn list_by_trip(&self, trip_id: Uuid) -> Result<Vec<RegistrationView>, SkiClubError> {
        let registrations = sqlx::query_as::<_, RegistrationView>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS},
                   p.first_name AS participant_first_name,
                   p.last_name AS participant_last_name,
                   p.birth_date AS participant_birth_date,
                   p.parent_id,
                   pr.email AS parent_email,
                   g.name AS group_name
            FROM trip_registrations r
            INNER JOIN participants p ON p.id = r.participant_id
            INNER JOIN profiles pr ON pr.id = p.parent_id
            LEFT JOIN participant_groups pg ON pg.participant_id = p.id
            LEFT JOIN groups g ON g.id = pg.group_id
            WHERE r.trip_id = $1
            ORDER BY p.last_name, p.first_name
            "#
        ))
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// Registrations of all children belonging to one parent
    pub async fn list_by_parent(&self, parent_id: Uuid) -> Result<Vec<TripRegistration>, SkiClubError> {
        let registrations = sqlx::query_as::<_, TripRegistration>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM trip_registrations r
            INNER JOIN participants p ON p.id = r.participant_id
            WHERE p.parent_id = $1
            ORDER BY r.created_at DESC
            "#
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    pub async fn update_participation(&self, id: Uuid, status: ParticipationStatus) -> Result<TripRegistration, SkiClubError> {
        let registration = sqlx::query_as::<_, TripRegistration>(&format!(
            "UPDATE trip_registrations AS r SET participation_status = $2 WHERE r.id = $1 RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Delete registration; its payments and contract cascade
    pub async fn delete(&self, id: Uuid) -> Result<bool, SkiClubError> {
        let result = sqlx::query("DELETE FROM trip_registrations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count registrations
    pub async fn count(&self) -> Result<i64, SkiClubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trip_registrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
