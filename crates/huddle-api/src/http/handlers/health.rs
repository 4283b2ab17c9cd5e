//! Liveness probe reporting database connectivity.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use huddle_core::repository::session::SessionRepository;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /health - 200 when the database answers, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database_ok = state.coordinator.repo().health_check().await;

    let (status, label, database) = if database_ok {
        (StatusCode::OK, "healthy", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
    };

    (
        status,
        Json(json!({
            "status": label,
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
