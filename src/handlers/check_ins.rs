use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::models::check_in::{DailyCheckIn, MoodHistoryQuery, MoodSummary, SubmitCheckInRequest};
use crate::AppState;

/// Record today's check-in. A second submission on the same day replaces the
/// first.
pub async fn submit_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<SubmitCheckInRequest>,
) -> AppResult<Json<DailyCheckIn>> {
    let record = state.records.build_daily_check_in(body.emotions)?;
    state.gateway.put_daily_check_in(&auth_user.id, &record).await?;
    Ok(Json(record))
}

pub async fn list_check_ins(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<MoodHistoryQuery>,
) -> AppResult<Json<Vec<DailyCheckIn>>> {
    let (start, end) = history_window(&state, &query)?;
    let mut history = state.gateway.get_mood_history(&auth_user.id, start, end).await?;
    history.sort_by_key(|c| c.date);
    Ok(Json(history))
}

pub async fn today_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<DailyCheckIn>> {
    let today = state.records.today();
    state
        .gateway
        .get_daily_check_in(&auth_user.id, today)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No check-in for {}", today)))
}

pub async fn check_in_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<MoodHistoryQuery>,
) -> AppResult<Json<MoodSummary>> {
    let (start, end) = history_window(&state, &query)?;
    let history = state.gateway.get_mood_history(&auth_user.id, start, end).await?;
    Ok(Json(MoodSummary::from_history(start, end, &history)))
}

fn history_window(
    state: &AppState,
    query: &MoodHistoryQuery,
) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = query.window(state.records.now().with_timezone(&Utc));
    if start > end {
        return Err(AppError::BadRequest("start must not be after end".into()));
    }
    Ok((start, end))
}
