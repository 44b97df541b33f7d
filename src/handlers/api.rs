use axum::Json;

use crate::auth::AuthUser;

/// Liveness check, no credentials required.
pub async fn healthz() -> &'static str {
    "OK"
}

pub async fn ping(AuthUser(user_id): AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "user_id": user_id,
    }))
}
