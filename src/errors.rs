use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::jwt::TokenError, password::HashError, store::StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timed out")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Timeout => AuthError::Timeout,
            StoreError::Conflict => AuthError::Storage("refresh token collision".into()),
            StoreError::Backend(detail) => AuthError::Storage(detail),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed
            | TokenError::BadSignature
            | TokenError::WrongIssuer
            | TokenError::Expired => AuthError::Unauthorized,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(e: HashError) -> Self {
        match e {
            HashError::EmptyInput => AuthError::Validation("password is empty or too long".into()),
            HashError::Internal(detail) => AuthError::Internal(detail),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AuthError::Validation(s) => (StatusCode::BAD_REQUEST, s.as_str()),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "incorrect email or password")
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage error"),
            AuthError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "request timed out"),
            AuthError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "request cancelled"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(json!({ "error": msg }))).into_response()
    }
}
