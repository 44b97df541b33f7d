pub mod bearer;
pub mod jwt;
pub mod tokens;

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{errors::AuthError, state::AppState};

pub use bearer::bearer_token;

/// The raw bearer credential of a request, if it carries a well-formed one.
pub fn bearer_from_parts(parts: &Parts) -> Option<&str> {
    bearer_token(
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    )
}

/// Caller identity resolved from a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_from_parts(parts).ok_or(AuthError::Unauthorized)?;
        let user_id = state.sessions.authenticate_request(token)?;
        Ok(Self(user_id))
    }
}

/// Bearer refresh token; absent or malformed headers are an invalid token.
#[derive(Debug, Clone)]
pub struct BearerRefreshToken(pub String);

impl<S> FromRequestParts<S> for BearerRefreshToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_from_parts(parts).ok_or(AuthError::InvalidToken)?;
        Ok(Self(token.to_string()))
    }
}
