use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::identity::WeekId;
use crate::models::survey::{SubmitSurveyRequest, SurveyResponse};
use crate::AppState;

/// Record this ISO week's survey, replacing an earlier one from the same week.
pub async fn submit_survey(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<SubmitSurveyRequest>,
) -> AppResult<Json<SurveyResponse>> {
    let survey = state.records.build_weekly_survey(&body.phq9, &body.gad7)?;
    state.gateway.put_weekly_survey(&auth_user.id, &survey).await?;

    let response = SurveyResponse::new(survey, state.records.now());
    if response.scores.self_harm_flag {
        tracing::info!(
            user_id = %auth_user.id,
            week_id = %response.survey.week_id,
            "Survey flagged PHQ-9 item 9"
        );
    }
    Ok(Json(response))
}

pub async fn list_surveys(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<SurveyResponse>>> {
    let mut history = state.gateway.get_weekly_survey_history(&auth_user.id).await?;
    history.sort_by_key(|s| s.week_id);
    let now = state.records.now();
    Ok(Json(
        history
            .into_iter()
            .map(|s| SurveyResponse::new(s, now))
            .collect(),
    ))
}

pub async fn current_survey(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<SurveyResponse>> {
    find_survey(&state, &auth_user, state.records.current_week_id()).await
}

pub async fn get_survey(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(week_id): AppPath<String>,
) -> AppResult<Json<SurveyResponse>> {
    let week: WeekId = week_id.parse()?;
    find_survey(&state, &auth_user, week).await
}

async fn find_survey(
    state: &AppState,
    auth_user: &AuthUser,
    week: WeekId,
) -> AppResult<Json<SurveyResponse>> {
    state
        .gateway
        .get_weekly_survey(&auth_user.id, week)
        .await?
        .map(|s| Json(SurveyResponse::new(s, state.records.now())))
        .ok_or_else(|| AppError::NotFound(format!("No survey for {}", week)))
}
