//! Bulk email notification handlers (admin)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use crate::middleware::RequireAdmin;
use crate::models::{CreateNotificationRequest, Notification, NotificationDetails};
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::helpers::calculate_offset;
use crate::utils::logging::log_admin_action;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// `(limit, offset)` with the page size clamped
    pub fn limit_offset(&self) -> (i64, i64) {
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page_size, calculate_offset(self.page.unwrap_or(1), page_size))
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Notification>>> {
    let (limit, offset) = page.limit_offset();
    Ok(Json(state.services.notification_service.list(limit, offset).await?))
}

pub async fn create_notification(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>)> {
    request.validate()?;
    let notification = state.services.notification_service.create(admin.id, request).await?;
    log_admin_action(admin.id, "create_notification", Some(&notification.id.to_string()), Some(&notification.subject));
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn get_notification(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<NotificationDetails>> {
    Ok(Json(state.services.notification_service.details(notification_id).await?))
}

pub async fn send_notification(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>> {
    let notification = state.services.notification_service.send(notification_id).await?;
    log_admin_action(
        admin.id,
        "send_notification",
        Some(&notification_id.to_string()),
        Some(&format!("sent={} failed={}", notification.sent_count, notification.failed_count)),
    );
    Ok(Json(notification))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults_and_clamps() {
        assert_eq!(PageQuery::default().limit_offset(), (50, 0));
        assert_eq!(PageQuery { page: Some(3), page_size: Some(10) }.limit_offset(), (10, 20));
        assert_eq!(PageQuery { page: Some(0), page_size: Some(10_000) }.limit_offset(), (200, 0));
    }
}
