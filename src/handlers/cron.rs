//! Scheduler-triggered jobs

use axum::extract::State;
use axum::Json;
use crate::middleware::CronAuth;
use crate::services::ReminderRunResult;
use crate::state::AppState;
use crate::utils::helpers::local_today;
use crate::utils::errors::Result;

pub async fn payment_reminders(
    State(state): State<AppState>,
    _cron: CronAuth,
) -> Result<Json<ReminderRunResult>> {
    let today = local_today(state.services.timezone);
    Ok(Json(state.services.reminder_service.run(today).await?))
}
