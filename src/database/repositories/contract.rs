//! Contract template and contract repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::contract::{TripContract, TripContractTemplate, ContractView};
use crate::utils::errors::SkiClubError;

const CONTRACT_COLUMNS: &str = "c.id, c.trip_id, c.participant_id, c.registration_id, c.content, c.accepted_at, c.accepted_by_name, c.created_at";

#[derive(Debug, Clone)]
pub struct ContractRepository {
    pool: PgPool,
}

impl ContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_template(&self, trip_id: Uuid) -> Result<Option<TripContractTemplate>, SkiClubError> {
        let template = sqlx::query_as::<_, TripContractTemplate>(
            "SELECT trip_id, content, updated_at FROM trip_contract_templates WHERE trip_id = $1"
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    /// Create or replace the contract template of a trip
    pub async fn upsert_template(&self, trip_id: Uuid, content: &str) -> Result<TripContractTemplate, SkiClubError> {
        let template = sqlx::query_as::<_, TripContractTemplate>(
            r#"
            INSERT INTO trip_contract_templates (trip_id, content, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (trip_id) DO UPDATE SET content = EXCLUDED.content, updated_at = EXCLUDED.updated_at
            RETURNING trip_id, content, updated_at
            "#
        )
        .bind(trip_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(template)
    }

    /// Store a materialized contract. Returns `None` when one already exists.
    pub async fn create(&self, trip_id: Uuid, participant_id: Uuid, registration_id: Uuid, content: &str) -> Result<Option<TripContract>, SkiClubError> {
        let contract = sqlx::query_as::<_, TripContract>(&format!(
            r#"
            INSERT INTO trip_contracts AS c (trip_id, participant_id, registration_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT uq_contracts_trip_participant DO NOTHING
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(trip_id)
        .bind(participant_id)
        .bind(registration_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    /// Participant ids of a trip that already have a contract
    pub async fn participants_with_contract(&self, trip_id: Uuid) -> Result<Vec<Uuid>, SkiClubError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT participant_id FROM trip_contracts WHERE trip_id = $1")
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn find_view(&self, id: Uuid) -> Result<Option<ContractView>, SkiClubError> {
        let contract = sqlx::query_as::<_, ContractView>(&format!(
            r#"
            SELECT {CONTRACT_COLUMNS}, t.title AS trip_title, (p.first_name || ' ' || p.last_name) AS participant_name, p.parent_id
            FROM trip_contracts c
            INNER JOIN trips t ON t.id = c.trip_id
            INNER JOIN participants p ON p.id = c.participant_id
            WHERE c.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    /// Contracts, optionally restricted to one trip and/or one parent
    pub async fn list_views(&self, trip_id: Option<Uuid>, parent_id: Option<Uuid>) -> Result<Vec<ContractView>, SkiClubError> {
        let contracts = sqlx::query_as::<_, ContractView>(&format!(
            r#"
            SELECT {CONTRACT_COLUMNS}, t.title AS trip_title, (p.first_name || ' ' || p.last_name) AS participant_name, p.parent_id
            FROM trip_contracts c
            INNER JOIN trips t ON t.id = c.trip_id
            INNER JOIN participants p ON p.id = c.participant_id
            WHERE ($1::uuid IS NULL OR c.trip_id = $1)
              AND ($2::uuid IS NULL OR p.parent_id = $2)
            ORDER BY t.departure_datetime DESC, p.last_name, p.first_name
            "#
        ))
        .bind(trip_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }

    /// Mark the contract accepted. Returns `None` if it was accepted already.
    pub async fn accept(&self, id: Uuid, accepted_by_name: &str) -> Result<Option<TripContract>, SkiClubError> {
        let contract = sqlx::query_as::<_, TripContract>(&format!(
            r#"
            UPDATE trip_contracts AS c
            SET accepted_at = $2, accepted_by_name = $3
            WHERE c.id = $1 AND c.accepted_at IS NULL
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Utc::now())
        .bind(accepted_by_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }
}
