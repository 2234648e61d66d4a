//! Trip registration handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::{CreateRegistrationRequest, RegistrationView, TripRegistration, UpdateParticipationRequest};
use crate::services::RegistrationOutcome;
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn register(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationOutcome>)> {
    let outcome = state.services.registration_service.register(&profile, trip_id, request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list_own(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
) -> Result<Json<Vec<TripRegistration>>> {
    Ok(Json(state.services.registration_service.list_for_parent(profile.id).await?))
}

pub async fn unregister(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(registration_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.services.registration_service.unregister(&profile, registration_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_participation(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(registration_id): Path<Uuid>,
    Json(request): Json<UpdateParticipationRequest>,
) -> Result<Json<TripRegistration>> {
    let registration = state.services.registration_service
        .set_participation(&profile, registration_id, request.status)
        .await?;
    Ok(Json(registration))
}

pub async fn list_for_trip(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<RegistrationView>>> {
    Ok(Json(state.services.registration_service.list_for_trip(trip_id).await?))
}
