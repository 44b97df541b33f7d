use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::session_service::LoginOutcome;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub token: String,
    pub refresh_token: String,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(o: LoginOutcome) -> Self {
        Self {
            id: o.user.id,
            email: o.user.email,
            created_at: o.user.created_at,
            updated_at: o.user.updated_at,
            token: o.access_token,
            refresh_token: o.refresh_token,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub token: String,
}
