//! Page Routes
//!
//! The HTML dashboard and its form posts. Posts redirect back to the page
//! with the selection preserved; validation failures re-render the page
//! with field-level messages instead.
//!
//! - GET / - Dashboard page for `?site=&year=`
//! - POST /readings - Record a reading
//! - POST /thresholds - Save the selected site's thresholds
//! - POST /refresh - Reload from the store
//! - POST /notices/clear - Dismiss notices

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;

use crate::api::dto::{selection_query, SelectionParams};
use crate::api::error::ApiResult;
use crate::api::html::Page;
use crate::api::state::AppState;
use crate::dashboard::{DashboardError, ReadingForm, Selection, ThresholdForm};

/// GET /
pub async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Html<String>> {
    let selection = params.selection()?;
    let view = state.dashboard.view(selection).await;
    Ok(Html(Page::new(&view).render()))
}

/// POST /readings
pub async fn submit_reading(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
    Form(form): Form<ReadingForm>,
) -> ApiResult<Response> {
    let selection = params.selection()?;

    match state.dashboard.submit_reading(&form).await {
        Ok(_) => Ok(back_to(&selection)),
        Err(DashboardError::Validation(errors)) => {
            let view = state.dashboard.view(selection).await;
            let html = Page::new(&view).with_reading_errors(&form, &errors).render();
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        // Store failures are already recorded as notices on the page
        Err(DashboardError::Store(_)) => Ok(back_to(&selection)),
        Err(e) => Err(e.into()),
    }
}

/// POST /thresholds
pub async fn submit_threshold(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
    Form(form): Form<ThresholdForm>,
) -> ApiResult<Response> {
    let selection = params.selection()?;

    match state.dashboard.submit_threshold(&form).await {
        Ok(_) => Ok(back_to(&selection)),
        Err(DashboardError::Validation(errors)) => {
            let view = state.dashboard.view(selection).await;
            let html = Page::new(&view)
                .with_threshold_errors(&form, &errors)
                .render();
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(DashboardError::Store(_)) => Ok(back_to(&selection)),
        Err(e) => Err(e.into()),
    }
}

/// POST /refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Response> {
    let selection = params.selection()?;
    state.dashboard.refresh().await;
    Ok(back_to(&selection))
}

/// POST /notices/clear
pub async fn clear_notices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Response> {
    let selection = params.selection()?;
    state.dashboard.clear_notices().await;
    Ok(back_to(&selection))
}

fn back_to(selection: &Selection) -> Response {
    Redirect::to(&format!("/{}", selection_query(selection))).into_response()
}
