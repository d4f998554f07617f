//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::{AppError, AppState};
use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check the database.
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: the todo store answers a ping.
///
/// - 200 OK with `{"status": "ready"}`
/// - 503 Service Unavailable when the store is unreachable
///
/// ```text
/// GET /ready
/// ```
///
/// # Errors
///
/// Returns a 503 [`AppError`] if the store ping fails.
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store().ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::unavailable("Todo store is unavailable")
    })?;

    Ok(Json(json!({ "status": "ready" })))
}
