//! Data Transfer Objects
//!
//! Request and response types for the HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::dashboard::{ReadingForm, Selection, ThresholdForm};
use crate::model::RecordId;

// ============================================
// SELECTION
// ============================================

/// `?site=&year=` as sent by the page selectors.
///
/// Empty strings mean "no selection", which is what an unselected
/// `<select>` submits.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl SelectionParams {
    pub fn selection(&self) -> ApiResult<Selection> {
        Ok(Selection {
            site: parse_optional(&self.site, "site")?,
            year: parse_optional(&self.year, "year")?,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(value: &Option<String>, name: &str) -> ApiResult<Option<T>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid {}: {:?}", name, s))),
    }
}

/// Query string that reproduces a selection, empty when nothing is selected
pub fn selection_query(selection: &Selection) -> String {
    let mut parts = Vec::new();
    if let Some(site) = selection.site {
        parts.push(format!("site={}", site));
    }
    if let Some(year) = selection.year {
        parts.push(format!("year={}", year));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

// ============================================
// WRITE DTOs
// ============================================

/// JSON reading submission
#[derive(Debug, Deserialize)]
pub struct ReadingRequest {
    pub site: RecordId,
    /// YYYY-MM-DD
    pub date: String,
    pub water: f64,
    pub electricity: f64,
    pub gas: f64,
}

impl ReadingRequest {
    /// Route through the same validation as the HTML form
    pub fn into_form(self) -> ReadingForm {
        ReadingForm {
            site: self.site.to_string(),
            date: self.date,
            water: self.water.to_string(),
            electricity: self.electricity.to_string(),
            gas: self.gas.to_string(),
        }
    }
}

/// JSON threshold upsert
#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub site: RecordId,
    pub water: f64,
    pub electricity: f64,
    pub gas: f64,
}

impl ThresholdRequest {
    pub fn into_form(self) -> ThresholdForm {
        ThresholdForm {
            site: self.site.to_string(),
            water: self.water.to_string(),
            electricity: self.electricity.to_string(),
            gas: self.gas.to_string(),
        }
    }
}

// ============================================
// RESPONSE DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Whether every table loaded at least once
    pub data_loaded: bool,
    /// Last complete load, RFC 3339
    pub last_loaded: Option<String>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
