//! Campmeter HTTP Server
//!
//! Serves the dashboard page and a JSON API over the same state, built
//! with Axum.
//!
//! # Endpoints
//!
//! ## Page
//! - `GET /` - Dashboard for `?site=&year=`
//! - `POST /readings` - Reading form
//! - `POST /thresholds` - Threshold form
//! - `POST /refresh` - Reload from the store
//! - `POST /notices/clear` - Dismiss notices
//!
//! ## Export
//! - `GET /export/thresholds.csv` - All thresholds
//! - `GET /export/readings.csv` - Readings for `?site=&year=`
//!
//! ## JSON
//! - `GET /api/v1/dashboard` - Derived view
//! - `GET /api/v1/sites` - Sites
//! - `GET /api/v1/readings` - Filtered readings
//! - `POST /api/v1/readings` - Record a reading
//! - `GET /api/v1/thresholds` - Thresholds
//! - `PUT /api/v1/thresholds` - Create or update a site's thresholds
//! - `POST /api/v1/refresh` - Reload from the store
//! - `GET /api/v1/notices` - Failure notices
//! - `DELETE /api/v1/notices` - Dismiss notices
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use campmeter::api::{serve, AppState};
//! use campmeter::config::Config;
//! use campmeter::dashboard::Dashboard;
//! use campmeter::store::NocoClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default();
//!     let store = Arc::new(NocoClient::new(config.store.client_config())?);
//!     let dashboard = Arc::new(Dashboard::new(store));
//!     dashboard.load().await;
//!
//!     serve(AppState::new(dashboard), &config.api).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod html;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route("/", get(routes::page::dashboard_page))
        .route("/readings", post(routes::page::submit_reading))
        .route("/thresholds", post(routes::page::submit_threshold))
        .route("/refresh", post(routes::page::refresh))
        .route("/notices/clear", post(routes::page::clear_notices))
        .route("/export/thresholds.csv", get(routes::export::export_thresholds))
        .route("/export/readings.csv", get(routes::export::export_readings));

    let api_routes = Router::new()
        .route("/dashboard", get(routes::data::get_dashboard))
        .route("/sites", get(routes::data::list_sites))
        .route(
            "/readings",
            get(routes::data::list_readings).post(routes::data::create_reading),
        )
        .route(
            "/thresholds",
            get(routes::data::list_thresholds).put(routes::data::upsert_threshold),
        )
        .route("/refresh", post(routes::data::refresh))
        .route(
            "/notices",
            get(routes::data::list_notices).delete(routes::data::clear_notices),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .merge(page_routes)
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the server and run until a shutdown signal arrives
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Campmeter listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Campmeter shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Dashboard;
    use crate::model::{Reading, Site, Threshold};
    use crate::store::memory::MemoryStore;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;
    use tower::util::ServiceExt;

    fn reading(id: i64, site_id: i64, date: &str, water: f64) -> Reading {
        Reading {
            id,
            site_id,
            reading_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            water,
            electricity: 1.0,
            gas: 1.0,
        }
    }

    fn memory_store() -> MemoryStore {
        MemoryStore::new()
            .with_sites(vec![
                Site {
                    id: 1,
                    name: "Les Pins".into(),
                },
                Site {
                    id: 2,
                    name: "Le Lac".into(),
                },
            ])
            .with_readings(vec![
                reading(1, 1, "2023-01-01", 10.0),
                reading(2, 1, "2022-05-01", 4.0),
                reading(3, 2, "2023-06-01", 8.0),
            ])
            .with_thresholds(vec![Threshold {
                id: 50,
                site_id: 1,
                water: 5.0,
                electricity: 100.0,
                gas: 100.0,
            }])
    }

    async fn create_test_app_with(store: Arc<MemoryStore>) -> (Router, Arc<Dashboard>) {
        let dashboard = Arc::new(Dashboard::new(store));
        dashboard.load().await;
        let router = build_router(AppState::new(Arc::clone(&dashboard)));
        (router, dashboard)
    }

    async fn create_test_app() -> Router {
        create_test_app_with(Arc::new(memory_store())).await.0
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app().await;
        let response = app.oneshot(get_request("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_after_load() {
        let app = create_test_app().await;
        let response = app.oneshot(get_request("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_not_ready_when_load_failed() {
        let store = memory_store();
        store.fail_readings.store(true, Ordering::SeqCst);
        let (app, _) = create_test_app_with(Arc::new(store)).await;

        let response = app.oneshot(get_request("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app().await;
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["data_loaded"], true);
    }

    #[tokio::test]
    async fn test_page_shows_alert_for_selected_year() {
        let app = create_test_app().await;
        let response = app
            .oneshot(get_request("/?site=1&year=2023"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("Les Pins"));
        assert!(html.contains("Overconsumption water: 10"));
    }

    #[tokio::test]
    async fn test_page_rejects_bad_year() {
        let app = create_test_app().await;
        let response = app.oneshot(get_request("/?year=abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reading_form_redirects_and_refetches() {
        let store = Arc::new(memory_store());
        let (app, dashboard) = create_test_app_with(Arc::clone(&store)).await;

        let response = app
            .oneshot(form_request(
                "/readings?site=1&year=2024",
                "site=1&date=2024-03-01&water=2&electricity=3&gas=4",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/?site=1&year=2024"
        );
        assert_eq!(store.writes(), vec!["POST Releves de compteurs"]);
        assert_eq!(dashboard.readings(Default::default()).await.len(), 4);
    }

    #[tokio::test]
    async fn test_reading_form_validation_rerenders() {
        let store = Arc::new(memory_store());
        let (app, _) = create_test_app_with(Arc::clone(&store)).await;

        let response = app
            .oneshot(form_request(
                "/readings?site=1",
                "site=1&date=&water=abc&electricity=3&gas=4",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains("a date is required"));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_threshold_form_store_failure_redirects_with_notice() {
        let store = Arc::new(memory_store());
        let (app, dashboard) = create_test_app_with(Arc::clone(&store)).await;
        store.reject_writes.store(true, Ordering::SeqCst);

        let response = app
            .oneshot(form_request(
                "/thresholds?site=2",
                "site=2&water=1&electricity=2&gas=3",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(dashboard.notices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_json_readings_filtered() {
        let app = create_test_app().await;
        let response = app
            .oneshot(get_request("/api/v1/readings?site=1&year=2022"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_json_threshold_upsert_statuses() {
        let store = Arc::new(memory_store());
        let (app, _) = create_test_app_with(Arc::clone(&store)).await;

        let updated = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/v1/thresholds",
                r#"{"site": 1, "water": 6, "electricity": 7, "gas": 8}"#,
            ))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::OK);

        let created = app
            .oneshot(json_request(
                "PUT",
                "/api/v1/thresholds",
                r#"{"site": 2, "water": 1, "electricity": 2, "gas": 3}"#,
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        assert_eq!(store.writes(), vec!["PATCH Seuils/50", "POST Seuils"]);
    }

    #[tokio::test]
    async fn test_json_reading_validation_error() {
        let app = create_test_app().await;
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/readings",
                r#"{"site": 1, "date": "2024-01-01", "water": -1, "electricity": 1, "gas": 1}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_json_rejected_write_maps_to_bad_gateway() {
        let store = Arc::new(memory_store());
        let (app, _) = create_test_app_with(Arc::clone(&store)).await;
        store.reject_writes.store(true, Ordering::SeqCst);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/readings",
                r#"{"site": 1, "date": "2024-01-01", "water": 1, "electricity": 1, "gas": 1}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_export_thresholds_attachment() {
        let app = create_test_app().await;
        let response = app
            .oneshot(get_request("/export/thresholds.csv"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"seuils-export.csv\""
        );

        let csv = body_string(response).await;
        assert!(csv.starts_with("id,camping_id,seuil_eau,seuil_elec,seuil_gaz,nom_camping"));
        assert!(csv.contains("Les Pins"));
    }

    #[tokio::test]
    async fn test_notices_clear() {
        let store = memory_store();
        store.fail_sites.store(true, Ordering::SeqCst);
        let (app, dashboard) = create_test_app_with(Arc::new(store)).await;
        assert!(!dashboard.notices().await.is_empty());

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/notices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(dashboard.notices().await.is_empty());
    }
}
