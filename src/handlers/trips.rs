//! Trip, payment template and trip parsing handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::{
    CreatePaymentTemplateRequest, CreateTripRequest, PaymentTemplate, Trip, TripWithGroups,
    UpdateTripRequest,
};
use crate::services::ParsedTrip;
use crate::state::AppState;
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::logging::log_admin_action;

const MAX_PARSE_CHARS: usize = 20_000;

pub async fn list_trips(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
) -> Result<Json<Vec<Trip>>> {
    Ok(Json(state.services.trip_service.list_for(&profile).await?))
}

pub async fn get_trip(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripWithGroups>> {
    Ok(Json(state.services.trip_service.get_for(&profile, trip_id).await?))
}

pub async fn create_trip(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<TripWithGroups>)> {
    request.validate()?;
    let trip = state.services.trip_service.create(admin.id, request).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn update_trip(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<UpdateTripRequest>,
) -> Result<Json<TripWithGroups>> {
    request.validate()?;
    Ok(Json(state.services.trip_service.update(admin.id, trip_id, request).await?))
}

pub async fn delete_trip(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.services.trip_service.delete(admin.id, trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_templates(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentTemplate>>> {
    Ok(Json(state.services.trip_service.list_templates(trip_id).await?))
}

pub async fn create_template(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<CreatePaymentTemplateRequest>,
) -> Result<(StatusCode, Json<PaymentTemplate>)> {
    request.validate()?;
    let template = state.services.trip_service.create_template(admin.id, trip_id, request).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn delete_template(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(template_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.services.trip_service.delete_template(admin.id, template_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ParseTripRequest {
    pub text: String,
}

/// Suggest trip fields from a free-text announcement
pub async fn parse_trip(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<ParseTripRequest>,
) -> Result<Json<ParsedTrip>> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(SkiClubError::Validation("Text is required".to_string()));
    }
    if text.chars().count() > MAX_PARSE_CHARS {
        return Err(SkiClubError::Validation(format!("Text is longer than {MAX_PARSE_CHARS} characters")));
    }

    state.services.ai_rate_limiter.check(admin.id)?;

    let parsed = state.services.ai_service.parse_trip(text).await?;
    log_admin_action(admin.id, "parse_trip", None, parsed.title.as_deref());
    Ok(Json(parsed))
}
