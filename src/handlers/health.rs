//! Health check

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;
use crate::database::health_check;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
    pub redis: Option<bool>,
    pub ai_enabled: bool,
    pub issues: Vec<String>,
}

/// 200 while the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match health_check(&state.db.pool).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };
    let services = state.services.health_check().await;

    let mut issues = services.get_issues();
    if !database {
        issues.insert(0, "Database unreachable".to_string());
    }

    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = HealthResponse {
        status: if database { "ok" } else { "degraded" },
        version: crate::VERSION,
        database,
        redis: services.redis_healthy,
        ai_enabled: services.ai_enabled,
        issues,
    };

    (status, Json(body))
}
