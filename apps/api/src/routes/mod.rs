pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Ranking API
        .route(
            "/api/v1/rankings",
            post(handlers::handle_rank).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
