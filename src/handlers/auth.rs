use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::BearerRefreshToken,
    dto::auth::{LoginRequest, LoginResponse, RefreshResponse},
    errors::AuthError,
    state::AppState,
};

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let outcome = state.sessions.login(req).await?;
    Ok(Json(outcome.into()))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    BearerRefreshToken(token): BearerRefreshToken,
) -> Result<Json<RefreshResponse>, AuthError> {
    let token = state.sessions.refresh(&token).await?;
    Ok(Json(RefreshResponse { token }))
}

pub async fn revoke(
    State(state): State<Arc<AppState>>,
    BearerRefreshToken(token): BearerRefreshToken,
) -> Result<StatusCode, AuthError> {
    state.sessions.revoke(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
