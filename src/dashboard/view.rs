//! Dashboard View Model
//!
//! Everything the presentation layer needs for one selection, derived from
//! the loaded collections.

use serde::Serialize;

use super::alerts::{alert_lines, AlertLine};
use super::chart::ChartData;
use super::filter::{
    available_years, filter_readings, find_threshold, selected_threshold, Selection,
};
use super::state::{DashboardData, Notice};
use crate::model::{Reading, Site, ThresholdValues};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub sites: Vec<Site>,
    pub selection: Selection,
    pub years: Vec<i32>,
    /// Readings matching the selection, source order
    pub readings: Vec<Reading>,
    pub threshold: ThresholdValues,
    /// False when `threshold` is the implicit zero threshold
    pub has_threshold: bool,
    pub alerts: Vec<AlertLine>,
    pub chart: ChartData,
    pub notices: Vec<Notice>,
}

impl DashboardView {
    pub fn build(data: &DashboardData, selection: Selection) -> Self {
        let readings = filter_readings(&data.readings, &selection);
        let threshold = selected_threshold(&data.thresholds, selection.site);
        let has_threshold = selection
            .site
            .and_then(|site| find_threshold(&data.thresholds, site))
            .is_some();
        let alerts = alert_lines(&readings, &threshold);
        let chart = ChartData::from_readings(&readings);

        Self {
            sites: data.sites.clone(),
            selection,
            years: available_years(&data.readings),
            readings,
            threshold,
            has_threshold,
            alerts,
            chart,
            notices: data.notices.iter().cloned().collect(),
        }
    }

    pub fn selected_site(&self) -> Option<&Site> {
        self.selection
            .site
            .and_then(|id| self.sites.iter().find(|s| s.id == id))
    }
}
