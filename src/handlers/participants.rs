//! Participant (child) handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::{
    AssignGroupRequest, CreateParticipantRequest, Participant, ParticipantWithGroup, Profile,
    UpdateParticipantRequest,
};
use crate::services::auth::ensure_owner;
use crate::state::AppState;
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::logging::{log_admin_action, log_parent_action};

async fn owned(state: &AppState, actor: &Profile, participant_id: Uuid) -> Result<ParticipantWithGroup> {
    let participant = state.db.participants.find_with_group(participant_id).await?
        .ok_or_else(|| SkiClubError::not_found("participant", participant_id))?;
    ensure_owner(actor, participant.participant.parent_id)?;
    Ok(participant)
}

/// Own children for parents, everyone for admins
pub async fn list_participants(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
) -> Result<Json<Vec<ParticipantWithGroup>>> {
    let parent_filter = (!profile.is_admin()).then_some(profile.id);
    Ok(Json(state.db.participants.list(parent_filter).await?))
}

pub async fn create_participant(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Json(request): Json<CreateParticipantRequest>,
) -> Result<(StatusCode, Json<Participant>)> {
    request.validate()?;

    let participant = state.db.participants.create(profile.id, request).await?;
    log_parent_action(profile.id, "create_participant", Some(&participant.id.to_string()));
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn get_participant(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<ParticipantWithGroup>> {
    Ok(Json(owned(&state, &profile, participant_id).await?))
}

pub async fn update_participant(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(participant_id): Path<Uuid>,
    Json(request): Json<UpdateParticipantRequest>,
) -> Result<Json<Participant>> {
    request.validate()?;
    owned(&state, &profile, participant_id).await?;

    let participant = state.db.participants.update(participant_id, request).await?;
    log_parent_action(profile.id, "update_participant", Some(&participant_id.to_string()));
    Ok(Json(participant))
}

/// Refused while the child has trip registrations
pub async fn delete_participant(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(participant_id): Path<Uuid>,
) -> Result<StatusCode> {
    owned(&state, &profile, participant_id).await?;

    if state.db.participants.count_registrations(participant_id).await? > 0 {
        return Err(SkiClubError::Conflict("Participant has trip registrations".to_string()));
    }

    state.db.participants.delete(participant_id).await?;
    log_parent_action(profile.id, "delete_participant", Some(&participant_id.to_string()));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_group(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(participant_id): Path<Uuid>,
    Json(request): Json<AssignGroupRequest>,
) -> Result<Json<ParticipantWithGroup>> {
    state.db.participants.find_by_id(participant_id).await?
        .ok_or_else(|| SkiClubError::not_found("participant", participant_id))?;
    if let Some(group_id) = request.group_id {
        state.db.groups.find_by_id(group_id).await?
            .ok_or_else(|| SkiClubError::not_found("group", group_id))?;
    }

    state.db.participants.assign_group(participant_id, request.group_id).await?;
    log_admin_action(
        admin.id,
        "assign_group",
        Some(&participant_id.to_string()),
        request.group_id.map(|id| id.to_string()).as_deref(),
    );

    let participant = state.db.participants.find_with_group(participant_id).await?
        .ok_or_else(|| SkiClubError::not_found("participant", participant_id))?;
    Ok(Json(participant))
}
