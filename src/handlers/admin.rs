//! Admin dashboard handlers

use axum::extract::State;
use axum::Json;
use tracing::debug;
use crate::database::SystemStats;
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::utils::errors::Result;

/// Club-wide counters for the admin dashboard
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<SystemStats>> {
    let stats = state.db.get_system_stats().await?;
    debug!(admin_id = %admin.id, trips = stats.trips, registrations = stats.registrations, "Stats requested");
    Ok(Json(stats))
}
