//! Legacy import handlers (admin)

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use crate::middleware::RequireAdmin;
use crate::models::{ImportChildRow, ImportSummary, ImportTripRow};
use crate::state::AppState;
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::logging::log_admin_action;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ImportRows {
    Children(Vec<ImportChildRow>),
    Trips(Vec<ImportTripRow>),
}

fn summary_details(summary: &ImportSummary) -> String {
    format!(
        "processed={} imported={} failed={} skipped={}",
        summary.processed, summary.imported, summary.failed, summary.skipped
    )
}

pub async fn import_children(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<ImportSummary>> {
    let summary = state.services.import_service.run_children_import().await?;
    log_admin_action(admin.id, "import_children", None, Some(&summary_details(&summary)));
    Ok(Json(summary))
}

pub async fn import_trips(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<ImportSummary>> {
    let summary = state.services.import_service.run_trips_import().await?;
    log_admin_action(admin.id, "import_trips", None, Some(&summary_details(&summary)));
    Ok(Json(summary))
}

/// Staged rows with their status, `kind` is `children` or `trips`
pub async fn list_rows(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(kind): Path<String>,
) -> Result<Json<ImportRows>> {
    let rows = match kind.as_str() {
        "children" => ImportRows::Children(state.db.imports.child_rows().await?),
        "trips" => ImportRows::Trips(state.db.imports.trip_rows().await?),
        other => return Err(SkiClubError::not_found("import kind", other)),
    };
    Ok(Json(rows))
}
