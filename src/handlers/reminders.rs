use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::models::reminder::{ReminderKind, ScheduleReminderRequest, ScheduledReminderInfo};
use crate::AppState;

pub async fn schedule_reminder(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<ScheduleReminderRequest>,
) -> AppResult<Json<ScheduledReminderInfo>> {
    let schedule = body.into_schedule(
        state.config.default_reminder_hour,
        state.config.default_reminder_minute,
    );
    let info = state.reminders.schedule(auth_user.id, schedule).await?;
    Ok(Json(info))
}

pub async fn cancel_reminder(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(kind): AppPath<ReminderKind>,
) -> Json<Value> {
    let cancelled = state.reminders.cancel(&auth_user.id, kind).await;
    Json(json!({ "cancelled": cancelled }))
}
