//! JSON Routes
//!
//! Machine-readable access to the same dashboard state the page shows.
//!
//! - GET /api/v1/dashboard - Derived view for `?site=&year=`
//! - GET /api/v1/sites - Loaded sites
//! - GET /api/v1/readings - Readings for `?site=&year=`
//! - GET /api/v1/thresholds - Loaded thresholds
//! - POST /api/v1/readings - Record a reading
//! - PUT /api/v1/thresholds - Create or update a site's thresholds
//! - POST /api/v1/refresh - Reload everything from the store
//! - GET/DELETE /api/v1/notices - Failure notices

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ReadingRequest, SelectionParams, ThresholdRequest};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{DashboardView, LoadReport, Notice, ThresholdOutcome};
use crate::model::{NewReading, Reading, Site, Threshold};

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Json<DashboardView>> {
    let selection = params.selection()?;
    Ok(Json(state.dashboard.view(selection).await))
}

/// GET /api/v1/sites
pub async fn list_sites(State(state): State<Arc<AppState>>) -> Json<Vec<Site>> {
    Json(state.dashboard.sites().await)
}

/// GET /api/v1/readings
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Json<Vec<Reading>>> {
    let selection = params.selection()?;
    Ok(Json(state.dashboard.readings(selection).await))
}

/// GET /api/v1/thresholds
pub async fn list_thresholds(State(state): State<Arc<AppState>>) -> Json<Vec<Threshold>> {
    Json(state.dashboard.thresholds().await)
}

/// POST /api/v1/readings
pub async fn create_reading(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReadingRequest>,
) -> ApiResult<(StatusCode, Json<NewReading>)> {
    let reading = state
        .dashboard
        .submit_reading(&request.into_form())
        .await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

/// PUT /api/v1/thresholds
///
/// 201 when a threshold record was created, 200 when an existing one was
/// updated.
pub async fn upsert_threshold(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ThresholdRequest>,
) -> ApiResult<(StatusCode, Json<ThresholdOutcome>)> {
    let outcome = state
        .dashboard
        .submit_threshold(&request.into_form())
        .await?;

    let status = match outcome {
        ThresholdOutcome::Created => StatusCode::CREATED,
        ThresholdOutcome::Updated { .. } => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

/// POST /api/v1/refresh
pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<LoadReport> {
    Json(state.dashboard.refresh().await)
}

/// GET /api/v1/notices
pub async fn list_notices(State(state): State<Arc<AppState>>) -> Json<Vec<Notice>> {
    Json(state.dashboard.notices().await)
}

/// DELETE /api/v1/notices
pub async fn clear_notices(State(state): State<Arc<AppState>>) -> StatusCode {
    state.dashboard.clear_notices().await;
    StatusCode::NO_CONTENT
}
