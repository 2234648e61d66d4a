//! Payment handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::{PaymentFilter, PaymentView, RecordPaymentRequest, UpdatePaymentRequest};
use crate::services::PaymentSummary;
use crate::state::AppState;
use crate::utils::errors::Result;

/// Payments of the caller's children with transfer instructions
pub async fn list_own(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
) -> Result<Json<Vec<PaymentView>>> {
    Ok(Json(state.services.payment_service.list_for_parent(profile.id).await?))
}

pub async fn list_payments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<Vec<PaymentView>>> {
    Ok(Json(state.services.payment_service.list(&filter).await?))
}

pub async fn record_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<PaymentView>> {
    request.validate()?;
    let view = state.services.payment_service
        .record_payment(payment_id, request.amount, admin.id, request.note.as_deref())
        .await?;
    Ok(Json(view))
}

pub async fn update_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<PaymentView>> {
    request.validate()?;
    Ok(Json(state.services.payment_service.update(payment_id, request, admin.id).await?))
}

pub async fn trip_summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<PaymentSummary>> {
    Ok(Json(state.services.payment_service.summary(trip_id).await?))
}
