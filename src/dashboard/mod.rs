//! Dashboard Core
//!
//! Loads sites, readings and thresholds from the remote store, derives the
//! filtered view for a site/year selection, and submits new readings and
//! threshold upserts.
//!
//! ## Architecture
//!
//! - **Service**: [`Dashboard`] owns the loaded data and the store handle
//! - **Filter**: pure selection logic over the loaded collections
//! - **Forms**: parse-and-validate step in front of every write
//! - **View**: alerts, chart feed and everything else a page renders
//! - **Export**: CSV files for thresholds and filtered readings

pub mod alerts;
pub mod chart;
pub mod export;
pub mod filter;
pub mod forms;
mod service;
mod state;
mod view;

pub use alerts::{AlertLine, Warning};
pub use chart::{ChartData, ChartPoint, ChartSeries};
pub use export::{ExportError, READINGS_FILENAME, THRESHOLDS_FILENAME};
pub use filter::Selection;
pub use forms::{FormErrors, ReadingForm, ThresholdForm, ValidationError};
pub use service::{
    Dashboard, DashboardError, DashboardResult, LoadReport, ThresholdOutcome,
};
pub use state::{DashboardData, LoadedTables, Notice, NoticeKind};
pub use view::DashboardView;
