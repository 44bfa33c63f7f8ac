//! Health check endpoints for Kubernetes liveness and readiness checks.
//!
//! - `/livez` - Basic liveness check (immediate 200, nothing else)
//! - `/healthz` - Storage round trip plus the configured backends

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::state::AppState;

/// GET /livez - Basic liveness check.
///
/// Returns 200 immediately. Used to check if the server is accepting connections.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Reads a nonexistent account to prove the relational store answers.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Response {
    match state.auth.accounts.get_account(Uuid::nil()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "UP",
                "storage": state.backends.storage,
                "sessions": state.backends.sessions,
                "route_preferences": state.backends.route_preferences,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check could not reach storage");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DOWN",
                    "error": "storage unavailable",
                })),
            )
                .into_response()
        }
    }
}
