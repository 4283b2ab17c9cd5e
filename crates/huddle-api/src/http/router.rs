//! Axum router configuration with middleware.
//!
//! Routes: `/webhook` (GET handshake, POST deliveries) and `/health`.
//! Middleware: tracing.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(handlers::webhook::verify_webhook).post(handlers::webhook::receive_webhook),
        )
        .route("/health", get(handlers::health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
