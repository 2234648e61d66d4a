//! Admin dashboard statistics

use sqlx::PgPool;
use serde::Serialize;
use crate::utils::errors::SkiClubError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CurrencyTotal {
    pub currency: String,
    pub outstanding: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemStats {
    pub parents: i64,
    pub admins: i64,
    pub participants: i64,
    pub groups: i64,
    pub trips: i64,
    pub published_trips: i64,
    pub registrations: i64,
    pub overdue_payments: i64,
    pub outstanding: Vec<CurrencyTotal>,
    pub contracts_total: i64,
    pub contracts_accepted: i64,
    pub pending_import_rows: i64,
}

#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get system statistics
    pub async fn get_stats(&self) -> Result<SystemStats, SkiClubError> {
        let profiles: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE role = 'parent'), COUNT(*) FILTER (WHERE role = 'admin') FROM profiles"
        )
        .fetch_one(&self.pool)
        .await?;

        let participants: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participants")
            .fetch_one(&self.pool)
            .await?;

        let groups: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await?;

        let trips: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'published') FROM trips"
        )
        .fetch_one(&self.pool)
        .await?;

        let registrations: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trip_registrations")
            .fetch_one(&self.pool)
            .await?;

        let overdue: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM payments
            WHERE amount_paid < amount AND due_date < CURRENT_DATE AND status NOT IN ('cancelled', 'waived')
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        let outstanding: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT currency, COALESCE(SUM(amount - amount_paid), 0)::BIGINT
            FROM payments
            WHERE amount_paid < amount AND status NOT IN ('cancelled', 'waived')
            GROUP BY currency
            ORDER BY currency
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        let contracts: (i64, i64) = sqlx::query_as("SELECT COUNT(*), COUNT(accepted_at) FROM trip_contracts")
            .fetch_one(&self.pool)
            .await?;

        let pending_imports: (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM import_children WHERE status <> 'zaimportowano')
                 + (SELECT COUNT(*) FROM import_trips WHERE status <> 'zaimportowano')
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SystemStats {
            parents: profiles.0,
            admins: profiles.1,
            participants: participants.0,
            groups: groups.0,
            trips: trips.0,
            published_trips: trips.1,
            registrations: registrations.0,
            overdue_payments: overdue.0,
            outstanding: outstanding
                .into_iter()
                .map(|(currency, outstanding)| CurrencyTotal { currency, outstanding })
                .collect(),
            contracts_total: contracts.0,
            contracts_accepted: contracts.1,
            pending_import_rows: pending_imports.0,
        })
    }
}
