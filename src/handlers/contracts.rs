//! Contract template, generation and acceptance handlers

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::{ContractView, TripContract, TripContractTemplate, UpsertContractTemplateRequest};
use crate::services::GenerationSummary;
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::{log_admin_action, log_parent_action};

pub async fn list_own(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
) -> Result<Json<Vec<ContractView>>> {
    Ok(Json(state.services.contract_service.list_for_parent(profile.id).await?))
}

pub async fn accept(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<TripContract>> {
    let contract = state.services.contract_service.accept(contract_id, &profile).await?;
    log_parent_action(profile.id, "accept_contract", Some(&contract_id.to_string()));
    Ok(Json(contract))
}

pub async fn get_template(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripContractTemplate>> {
    Ok(Json(state.services.contract_service.get_template(trip_id).await?))
}

pub async fn put_template(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<UpsertContractTemplateRequest>,
) -> Result<Json<TripContractTemplate>> {
    request.validate()?;
    let template = state.services.contract_service.upsert_template(trip_id, &request.content).await?;
    log_admin_action(admin.id, "update_contract_template", Some(&trip_id.to_string()), None);
    Ok(Json(template))
}

pub async fn generate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<GenerationSummary>> {
    let summary = state.services.contract_service.generate_for_trip(trip_id).await?;
    log_admin_action(
        admin.id,
        "generate_contracts",
        Some(&trip_id.to_string()),
        Some(&format!("generated={} skipped={}", summary.generated, summary.skipped)),
    );
    Ok(Json(summary))
}

pub async fn list_for_trip(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<ContractView>>> {
    Ok(Json(state.services.contract_service.list_for_trip(trip_id).await?))
}
