//! Health Routes
//!
//! Health check endpoints for monitoring and container probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (data loaded at least once)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once every table has been loaded from the remote store.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.dashboard.is_closed() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    match state.dashboard.last_loaded().await {
        Some(_) => StatusCode::OK,
        None => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status. "degraded" while the store has not answered every
/// list request or recent requests produced notices.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let last_loaded = state.dashboard.last_loaded().await;
    let has_notices = !state.dashboard.notices().await.is_empty();

    let status = if last_loaded.is_some() && !has_notices {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        data_loaded: last_loaded.is_some(),
        last_loaded: last_loaded.map(|t| t.to_rfc3339()),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
