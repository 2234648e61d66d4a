//! Profile handlers (own profile and admin role management)

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::{Profile, Role, UpdateProfileRequest, UpdateRoleRequest};
use crate::state::AppState;
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::helpers::{is_valid_pesel, normalize_whitespace};
use crate::utils::logging::{log_admin_action, log_parent_action};

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| normalize_whitespace(&v))
}

/// Trim text fields and check the PESEL checksum when one is given
pub fn normalize_profile_update(request: UpdateProfileRequest) -> Result<UpdateProfileRequest> {
    let pesel = request.pesel.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
    if let Some(pesel) = pesel.as_deref() {
        if !is_valid_pesel(pesel) {
            return Err(SkiClubError::Validation("Invalid PESEL".to_string()));
        }
    }

    Ok(UpdateProfileRequest {
        first_name: trimmed(request.first_name),
        last_name: trimmed(request.last_name),
        phone: trimmed(request.phone),
        address_street: trimmed(request.address_street),
        address_city: trimmed(request.address_city),
        address_zip: trimmed(request.address_zip),
        pesel,
    })
}

pub async fn get_profile(AuthUser(profile): AuthUser) -> Json<Profile> {
    Json(profile)
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    request.validate()?;
    let request = normalize_profile_update(request)?;

    let updated = state.db.profiles.update(profile.id, request).await?;
    log_parent_action(profile.id, "update_profile", None);
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ProfileListQuery {
    pub role: Option<Role>,
}

pub async fn list_profiles(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ProfileListQuery>,
) -> Result<Json<Vec<Profile>>> {
    Ok(Json(state.db.profiles.list(query.role).await?))
}

pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(profile_id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<Profile>> {
    if profile_id == admin.id && request.role != Role::Admin {
        return Err(SkiClubError::Conflict("Admins cannot revoke their own role".to_string()));
    }

    state.db.profiles.find_by_id(profile_id).await?
        .ok_or_else(|| SkiClubError::not_found("profile", profile_id))?;

    let profile = state.db.profiles.set_role(profile_id, request.role).await?;
    log_admin_action(admin.id, "set_role", Some(&profile_id.to_string()), Some(request.role.as_str()));
    info!(profile_id = %profile_id, role = %request.role, "Profile role changed");
    Ok(Json(profile))
}
