use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    handlers::{api as api_handlers, auth as auth_handlers},
    state::AppState,
};

pub fn app_router(state: Arc<AppState>) -> Router {
    let auth = Router::new()
        .route("/login", post(auth_handlers::login))
        .route("/refresh", post(auth_handlers::refresh))
        .route("/revoke", post(auth_handlers::revoke));

    let api = Router::new()
        .route("/healthz", get(api_handlers::healthz))
        .route("/ping", get(api_handlers::ping));

    Router::new()
        .nest("/auth", auth)
        .nest("/api", api)
        .with_state(state)
}
