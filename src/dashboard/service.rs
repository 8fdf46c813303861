//! Dashboard Service
//!
//! Owns the loaded collections and talks to the remote store.
//!
//! ## Loading
//!
//! The three tables are fetched concurrently and each result is applied as
//! soon as it arrives. Requests run without holding the state lock, so
//! views keep being served while a load is in flight. A failed fetch keeps
//! the previous copy of that table and records a [`Notice`].
//!
//! ## Writes
//!
//! Input is validated before anything is sent. After a successful write
//! the affected table is fetched again; there is no local merge.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::export::{self, ExportError};
use super::filter::{filter_readings, find_threshold, Selection};
use super::forms::{FormErrors, ReadingForm, ThresholdForm};
use super::state::{DashboardData, Notice};
use super::view::DashboardView;
use crate::model::{NewReading, Reading, RecordId, Site, Threshold, ThresholdPayload};
use crate::store::{RemoteStore, StoreError, StoreResult};

/// Errors returned by dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid input: {0}")]
    Validation(FormErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Dashboard is closed")]
    Closed,
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Row counts per table after a load; `None` when that fetch failed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub sites: Option<usize>,
    pub readings: Option<usize>,
    pub thresholds: Option<usize>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.sites.is_some() && self.readings.is_some() && self.thresholds.is_some()
    }
}

/// Whether a threshold submission created a record or updated one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ThresholdOutcome {
    Created,
    Updated { id: RecordId },
}

pub struct Dashboard {
    store: Arc<dyn RemoteStore>,
    data: RwLock<DashboardData>,
    closed: AtomicBool,
}

impl Dashboard {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            data: RwLock::new(DashboardData::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Fetch all three tables concurrently
    pub async fn load(&self) -> LoadReport {
        let (sites, readings, thresholds) = tokio::join!(
            self.refresh_sites(),
            self.refresh_readings(),
            self.refresh_thresholds(),
        );

        let report = LoadReport {
            sites,
            readings,
            thresholds,
        };

        tracing::info!(
            sites = ?report.sites,
            readings = ?report.readings,
            thresholds = ?report.thresholds,
            "Dashboard data loaded"
        );
        report
    }

    /// Explicit reload action for the host shell
    pub async fn refresh(&self) -> LoadReport {
        self.load().await
    }

    pub async fn refresh_sites(&self) -> Option<usize> {
        let result = self.store.list_sites().await;
        self.apply("Loading sites", result, |data, rows| {
            data.sites = rows;
            data.loaded.sites = true;
        })
        .await
    }

    pub async fn refresh_readings(&self) -> Option<usize> {
        let result = self.store.list_readings().await;
        self.apply("Loading readings", result, |data, rows| {
            data.readings = rows;
            data.loaded.readings = true;
        })
        .await
    }

    pub async fn refresh_thresholds(&self) -> Option<usize> {
        let result = self.store.list_thresholds().await;
        self.apply("Loading thresholds", result, set_thresholds).await
    }

    /// Apply a fetch result unless the dashboard was closed meanwhile
    async fn apply<T, F>(&self, action: &str, result: StoreResult<Vec<T>>, set: F) -> Option<usize>
    where
        F: FnOnce(&mut DashboardData, Vec<T>),
    {
        let mut data = self.data.write().await;
        if self.is_closed() {
            tracing::debug!(action, "Dropping result received after close");
            return None;
        }

        match result {
            Ok(rows) => {
                let count = rows.len();
                set(&mut data, rows);
                if data.loaded.all() {
                    data.last_loaded = Some(chrono::Utc::now());
                }
                Some(count)
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "Remote read failed, keeping previous data");
                data.push_notice(Notice::from_error(action, &e));
                None
            }
        }
    }

    /// Validate and record a meter reading, then refetch readings
    pub async fn submit_reading(&self, form: &ReadingForm) -> DashboardResult<NewReading> {
        self.ensure_open()?;
        let reading = form.validate().map_err(DashboardError::Validation)?;

        if let Err(e) = self.store.create_reading(&reading).await {
            self.record_failure("Saving reading", &e).await;
            return Err(e.into());
        }

        tracing::info!(
            site = reading.site_id,
            date = %reading.reading_date,
            "Reading recorded"
        );
        self.refresh_readings().await;
        Ok(reading)
    }

    /// Validate and upsert the thresholds of a site, then refetch thresholds.
    ///
    /// The threshold list is fetched right before the lookup so an existing
    /// record is updated rather than duplicated. Nothing is written when
    /// that fetch fails.
    pub async fn submit_threshold(&self, form: &ThresholdForm) -> DashboardResult<ThresholdOutcome> {
        self.ensure_open()?;
        let (site_id, values) = form.validate().map_err(DashboardError::Validation)?;
        let payload = ThresholdPayload::new(site_id, values);

        match self.store.list_thresholds().await {
            Ok(rows) => {
                if self
                    .apply("Loading thresholds", Ok(rows), set_thresholds)
                    .await
                    .is_none()
                {
                    return Err(DashboardError::Closed);
                }
            }
            Err(e) => {
                self.record_failure("Loading thresholds", &e).await;
                return Err(e.into());
            }
        }

        let existing = {
            let data = self.data.read().await;
            find_threshold(&data.thresholds, site_id).map(|t| t.id)
        };

        let (result, outcome) = match existing {
            Some(id) => (
                self.store.update_threshold(id, &payload).await,
                ThresholdOutcome::Updated { id },
            ),
            None => (
                self.store.create_threshold(&payload).await,
                ThresholdOutcome::Created,
            ),
        };

        if let Err(e) = result {
            self.record_failure("Saving thresholds", &e).await;
            return Err(e.into());
        }

        tracing::info!(site = site_id, ?outcome, "Thresholds saved");
        self.refresh_thresholds().await;
        Ok(outcome)
    }

    async fn record_failure(&self, action: &str, error: &StoreError) {
        tracing::warn!(action, error = %error, "Remote request failed");
        self.data
            .write()
            .await
            .push_notice(Notice::from_error(action, error));
    }

    /// Derived state for one selection
    pub async fn view(&self, selection: Selection) -> DashboardView {
        let data = self.data.read().await;
        DashboardView::build(&data, selection)
    }

    pub async fn sites(&self) -> Vec<Site> {
        self.data.read().await.sites.clone()
    }

    pub async fn readings(&self, selection: Selection) -> Vec<Reading> {
        filter_readings(&self.data.read().await.readings, &selection)
    }

    pub async fn thresholds(&self) -> Vec<Threshold> {
        self.data.read().await.thresholds.clone()
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.data.read().await.notices.iter().cloned().collect()
    }

    pub async fn clear_notices(&self) {
        self.data.write().await.notices.clear();
    }

    pub async fn last_loaded(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.data.read().await.last_loaded
    }

    /// Thresholds CSV with resolved site names
    pub async fn export_thresholds(&self) -> Result<String, ExportError> {
        let data = self.data.read().await;
        export::thresholds_csv(&data.thresholds, &data.sites)
    }

    /// Filtered readings CSV
    pub async fn export_readings(&self, selection: Selection) -> Result<String, ExportError> {
        let readings = self.readings(selection).await;
        export::readings_csv(&readings)
    }

    /// Stop applying results; requests still in flight are ignored when they land
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!("Dashboard closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> DashboardResult<()> {
        if self.is_closed() {
            Err(DashboardError::Closed)
        } else {
            Ok(())
        }
    }

    /// Reload periodically until the dashboard is closed
    pub fn start_background_refresh(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tracing::info!(interval_secs = interval.as_secs(), "Starting background refresh");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if self.is_closed() {
                    break;
                }

                tracing::debug!("Running scheduled refresh");
                self.refresh().await;
            }
        })
    }
}

fn set_thresholds(data: &mut DashboardData, rows: Vec<Threshold>) {
    data.thresholds = rows;
    data.loaded.thresholds = true;
}
