//! Export Routes
//!
//! CSV downloads with fixed filenames.
//!
//! - GET /export/thresholds.csv - All thresholds with site names
//! - GET /export/readings.csv - Readings for the current selection

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::dto::SelectionParams;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{READINGS_FILENAME, THRESHOLDS_FILENAME};

/// GET /export/thresholds.csv
pub async fn export_thresholds(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let body = state.dashboard.export_thresholds().await?;
    Ok(csv_attachment(body, THRESHOLDS_FILENAME))
}

/// GET /export/readings.csv
///
/// Honours the same `site`/`year` selection as the page.
pub async fn export_readings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Response> {
    let selection = params.selection()?;
    let body = state.dashboard.export_readings(selection).await?;

    tracing::debug!(?selection, bytes = body.len(), "Readings exported");
    Ok(csv_attachment(body, READINGS_FILENAME))
}

fn csv_attachment(body: String, filename: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response()
}
