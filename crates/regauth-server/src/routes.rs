//! Route definitions for the token service.

use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Create the token service router.
pub fn create_router(state: AppState) -> Router {
    let token_path = state.config().server.token_path.clone();

    Router::new()
        .route(&token_path, get(handlers::issue_token))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
