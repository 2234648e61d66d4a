//! Group repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::group::{Group, CreateGroupRequest, UpdateGroupRequest};
use crate::utils::errors::SkiClubError;

#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new group
    pub async fn create(&self, request: CreateGroupRequest) -> Result<Group, SkiClubError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, description, sort_order, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, sort_order, created_at
            "#
        )
        .bind(request.name.trim())
        .bind(request.description)
        .bind(request.sort_order.unwrap_or(0))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find group by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, SkiClubError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, description, sort_order, created_at FROM groups WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find group by name (case-insensitive)
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Group>, SkiClubError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, description, sort_order, created_at FROM groups WHERE LOWER(name) = LOWER($1)"
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Update group
    pub async fn update(&self, id: Uuid, request: UpdateGroupRequest) -> Result<Group, SkiClubError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                sort_order = COALESCE($4, sort_order)
            WHERE id = $1
            RETURNING id, name, description, sort_order, created_at
            "#
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.sort_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Delete group
    pub async fn delete(&self, id: Uuid) -> Result<bool, SkiClubError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List all groups in display order
    pub async fn list(&self) -> Result<Vec<Group>, SkiClubError> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, name, description, sort_order, created_at FROM groups ORDER BY sort_order ASC, name ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// Count total groups
    pub async fn count(&self) -> Result<i64, SkiClubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
