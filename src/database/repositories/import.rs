//! Staged import row repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::import::{ImportChildRow, ImportTripRow, ImportStatus};
use crate::utils::errors::SkiClubError;

#[derive(Debug, Clone)]
pub struct ImportRepository {
    pool: PgPool,
}

impl ImportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All staged child rows in insertion order
    pub async fn child_rows(&self) -> Result<Vec<ImportChildRow>, SkiClubError> {
        let rows = sqlx::query_as::<_, ImportChildRow>(
            r#"
            SELECT id, parent_email, parent_first_name, parent_last_name, parent_phone,
                   child_first_name, child_last_name, child_birth_date, group_name,
                   status, error_message, imported_at
            FROM import_children
            ORDER BY created_at ASC, id ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All staged trip rows in insertion order
    pub async fn trip_rows(&self) -> Result<Vec<ImportTripRow>, SkiClubError> {
        let rows = sqlx::query_as::<_, ImportTripRow>(
            r#"
            SELECT id, title, departure_date, departure_time, departure_location,
                   return_date, return_time, return_location, group_names,
                   status, error_message, imported_at
            FROM import_trips
            ORDER BY created_at ASC, id ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn mark_child_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<(), SkiClubError> {
        let imported_at = (status == ImportStatus::Imported).then(Utc::now);

        sqlx::query("UPDATE import_children SET status = $2, error_message = $3, imported_at = $4 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(error)
            .bind(imported_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn mark_trip_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<(), SkiClubError> {
        let imported_at = (status == ImportStatus::Imported).then(Utc::now);

        sqlx::query("UPDATE import_trips SET status = $2, error_message = $3, imported_at = $4 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(error)
            .bind(imported_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
