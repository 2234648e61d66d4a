//! Group handlers (admin)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;
use crate::middleware::RequireAdmin;
use crate::models::{CreateGroupRequest, Group, UpdateGroupRequest};
use crate::state::AppState;
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::logging::log_admin_action;

pub async fn list_groups(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Group>>> {
    Ok(Json(state.db.groups.list().await?))
}

pub async fn create_group(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>)> {
    request.validate()?;

    if state.db.groups.find_by_name(request.name.trim()).await?.is_some() {
        return Err(SkiClubError::Conflict(format!("Group {} already exists", request.name.trim())));
    }

    let group = state.db.groups.create(request).await?;
    log_admin_action(admin.id, "create_group", Some(&group.id.to_string()), Some(&group.name));
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_group(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(group_id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<Group>> {
    request.validate()?;
    state.db.groups.find_by_id(group_id).await?
        .ok_or_else(|| SkiClubError::not_found("group", group_id))?;

    let group = state.db.groups.update(group_id, request).await?;
    log_admin_action(admin.id, "update_group", Some(&group_id.to_string()), None);
    Ok(Json(group))
}

/// Members lose their group; trips lose the link
pub async fn delete_group(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.db.groups.delete(group_id).await? {
        return Err(SkiClubError::not_found("group", group_id));
    }
    log_admin_action(admin.id, "delete_group", Some(&group_id.to_string()), None);
    Ok(StatusCode::NO_CONTENT)
}
