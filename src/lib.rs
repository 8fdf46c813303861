//! # Campmeter
//!
//! Utility-meter dashboard for camping sites: water, electricity and gas
//! readings per site, per-site alert thresholds, a time-series chart feed
//! and CSV exports, all backed by a hosted NocoDB-style database.
//!
//! ## Modules
//!
//! - [`model`]: sites, readings, thresholds and their remote field names
//! - [`store`]: the [`RemoteStore`] seam and the REST client
//! - [`dashboard`]: loading, filtering, alerts, validation and exports
//! - [`api`]: HTML page and JSON API with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use campmeter::{Dashboard, NocoClient, Selection, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = NocoClient::new(StoreConfig {
//!         token: "xc-token".to_string(),
//!         ..Default::default()
//!     })?;
//!
//!     let dashboard = Dashboard::new(Arc::new(store));
//!     dashboard.load().await;
//!
//!     let view = dashboard.view(Selection::new(Some(1), Some(2023))).await;
//!     for line in &view.alerts {
//!         println!("{}", line.text());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod model;
pub mod store;

// Re-export top-level types for convenience
pub use model::{
    NewReading, Reading, RecordId, Resource, Site, Threshold, ThresholdPayload, ThresholdValues,
};

pub use store::{NocoClient, RemoteStore, StoreConfig, StoreError, StoreResult};

pub use dashboard::{
    Dashboard, DashboardError, DashboardResult, DashboardView, LoadReport, Notice,
    ReadingForm, Selection, ThresholdForm, ThresholdOutcome,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{generate_default_config, Config, ConfigError};
