//! Filter Engine
//!
//! Pure derivations over the loaded collections. Cheap enough to run on
//! every view, so nothing here is cached.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{Reading, RecordId, Threshold, ThresholdValues};

/// Current site/year selection. `None` means "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub site: Option<RecordId>,
    pub year: Option<i32>,
}

impl Selection {
    pub fn new(site: Option<RecordId>, year: Option<i32>) -> Self {
        Self { site, year }
    }

    pub fn for_site(site: RecordId) -> Self {
        Self {
            site: Some(site),
            year: None,
        }
    }

    /// Whether a reading passes both the site and the year predicate
    pub fn matches(&self, reading: &Reading) -> bool {
        let year_match = self.year.map_or(true, |year| reading.year() == year);
        let site_match = self.site.map_or(true, |site| reading.site_id == site);
        year_match && site_match
    }
}

/// Readings matching the selection, in source order
pub fn filter_readings(readings: &[Reading], selection: &Selection) -> Vec<Reading> {
    readings
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect()
}

/// The threshold record for a site, if one exists
pub fn find_threshold(thresholds: &[Threshold], site: RecordId) -> Option<&Threshold> {
    thresholds.iter().find(|t| t.site_id == site)
}

/// Threshold values for the selected site, zero when there is none
pub fn selected_threshold(thresholds: &[Threshold], site: Option<RecordId>) -> ThresholdValues {
    site.and_then(|site| find_threshold(thresholds, site))
        .map(Threshold::values)
        .unwrap_or_default()
}

/// Distinct calendar years across all readings, ascending
pub fn available_years(readings: &[Reading]) -> Vec<i32> {
    readings
        .iter()
        .map(Reading::year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
