//! Participant repository implementation

use sqlx::PgPool;
use sqlx::types::Json;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use crate::models::participant::{Participant, ParticipantWithGroup, CreateParticipantRequest, UpdateParticipantRequest};
use crate::utils::errors::SkiClubError;

const PARTICIPANT_COLUMNS: &str = "p.id, p.parent_id, p.first_name, p.last_name, p.birth_date, p.notes, p.custom_fields, p.created_at, p.updated_at";

#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a participant owned by `parent_id`
    pub async fn create(&self, parent_id: Uuid, request: CreateParticipantRequest) -> Result<Participant, SkiClubError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            r#"
            INSERT INTO participants AS p (parent_id, first_name, last_name, birth_date, notes, custom_fields, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(parent_id)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(request.birth_date)
        .bind(request.notes)
        .bind(Json(request.custom_fields))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Find participant by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>, SkiClubError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Find participant by ID together with its group
    pub async fn find_with_group(&self, id: Uuid) -> Result<Option<ParticipantWithGroup>, SkiClubError> {
        let participant = sqlx::query_as::<_, ParticipantWithGroup>(&format!(
            r#"
            SELECT {PARTICIPANT_COLUMNS}, g.id AS group_id, g.name AS group_name
            FROM participants p
            LEFT JOIN participant_groups pg ON pg.participant_id = p.id
            LEFT JOIN groups g ON g.id = pg.group_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Find the participant an import row refers to
    pub async fn find_by_identity(&self, parent_id: Uuid, first_name: &str, last_name: &str, birth_date: NaiveDate) -> Result<Option<Participant>, SkiClubError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            r#"
            SELECT {PARTICIPANT_COLUMNS} FROM participants p
            WHERE p.parent_id = $1 AND LOWER(p.first_name) = LOWER($2) AND LOWER(p.last_name) = LOWER($3) AND p.birth_date = $4
            "#
        ))
        .bind(parent_id)
        .bind(first_name.trim())
        .bind(last_name.trim())
        .bind(birth_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// List participants, optionally only those of one parent
    pub async fn list(&self, parent_id: Option<Uuid>) -> Result<Vec<ParticipantWithGroup>, SkiClubError> {
        let participants = sqlx::query_as::<_, ParticipantWithGroup>(&format!(
            r#"
            SELECT {PARTICIPANT_COLUMNS}, g.id AS group_id, g.name AS group_name
            FROM participants p
            LEFT JOIN participant_groups pg ON pg.participant_id = p.id
            LEFT JOIN groups g ON g.id = pg.group_id
            WHERE ($1::uuid IS NULL OR p.parent_id = $1)
            ORDER BY p.last_name, p.first_name
            "#
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Update participant
    pub async fn update(&self, id: Uuid, request: UpdateParticipantRequest) -> Result<Participant, SkiClubError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            r#"
            UPDATE participants AS p
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                birth_date = COALESCE($4, birth_date),
                notes = COALESCE($5, notes),
                custom_fields = COALESCE($6, custom_fields),
                updated_at = $7
            WHERE p.id = $1
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.birth_date)
        .bind(request.notes)
        .bind(request.custom_fields.map(Json))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(participant)
    }

    /// Delete participant
    pub async fn delete(&self, id: Uuid) -> Result<(), SkiClubError> {
        sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Put the participant into a group, or remove it from any group
    pub async fn assign_group(&self, participant_id: Uuid, group_id: Option<Uuid>) -> Result<(), SkiClubError> {
        match group_id {
            Some(group_id) => {
                sqlx::query(
                    r#"
                    INSERT INTO participant_groups (participant_id, group_id, assigned_at)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (participant_id) DO UPDATE SET group_id = EXCLUDED.group_id, assigned_at = EXCLUDED.assigned_at
                    "#
                )
                .bind(participant_id)
                .bind(group_id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM participant_groups WHERE participant_id = $1")
                    .bind(participant_id)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }

    /// Group the participant belongs to, if any
    pub async fn group_id(&self, participant_id: Uuid) -> Result<Option<Uuid>, SkiClubError> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT group_id FROM participant_groups WHERE participant_id = $1")
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.0))
    }

    /// Number of trip registrations referencing the participant
    pub async fn count_registrations(&self, participant_id: Uuid) -> Result<i64, SkiClubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trip_registrations WHERE participant_id = $1")
            .bind(participant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Count total participants
    pub async fn count(&self) -> Result<i64, SkiClubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participants")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
