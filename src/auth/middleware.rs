use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::models::user::UserId;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
}

/// Rejects the request before any handler (and so the store) is reached
/// unless it carries a valid bearer token with a usable subject.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let token_data = verify_token(token, &state.config)?;

    let id = UserId::parse(&token_data.claims.sub).ok_or_else(|| {
        tracing::warn!("Token subject is not a usable user id");
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(AuthUser { id });
    Ok(next.run(req).await)
}
