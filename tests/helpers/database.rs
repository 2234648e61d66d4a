//! Test database helper
//!
//! Database-backed tests run only when `TEST_DATABASE_URL` points at a
//! Postgres instance; otherwise they return early. Every test starts from
//! empty tables and should be marked `#[serial]`.

use axum::Router;
use skiclub::database::{run_migrations, DatabasePool};
use skiclub::build_router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Once;
use uuid::Uuid;

use super::app::{app_state, test_settings};

static INIT: Once = Once::new();

const TABLES: &str = "notification_logs, notifications, trip_contracts, trip_contract_templates, \
    payments, trip_registrations, payment_templates, trip_groups, participant_groups, trips, \
    participants, groups, profiles, import_children, import_trips";

pub struct TestDatabase {
    pub pool: DatabasePool,
}

impl TestDatabase {
    /// Connect, migrate and clear all tables; `None` without `TEST_DATABASE_URL`
    pub async fn from_env() -> Option<Self> {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        });

        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set, skipping database test");
                return None;
            }
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let db = Self { pool };
        db.cleanup().await;
        Some(db)
    }

    pub async fn cleanup(&self) {
        sqlx::query(&format!("TRUNCATE {TABLES} CASCADE"))
            .execute(&self.pool)
            .await
            .expect("Failed to truncate tables");
    }

    pub fn router(&self) -> Router {
        build_router(app_state(self.pool.clone(), test_settings()))
    }

    pub async fn promote_to_admin(&self, profile_id: Uuid) {
        sqlx::query("UPDATE profiles SET role = 'admin' WHERE id = $1")
            .bind(profile_id)
            .execute(&self.pool)
            .await
            .expect("Failed to promote profile");
    }

    pub async fn count_records(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count records")
    }
}
