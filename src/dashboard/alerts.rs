//! Overconsumption Alerts
//!
//! One alert line per reading; a resource is flagged when its meter value
//! reaches the threshold (equality counts).

use serde::Serialize;

use crate::model::{Reading, RecordId, Resource, ThresholdValues};

/// A single flagged resource on a reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub resource: Resource,
    pub value: f64,
    pub threshold: f64,
}

impl Warning {
    pub fn message(&self) -> String {
        format!("Overconsumption {}: {}", self.resource, self.value)
    }
}

/// Warnings for one reading, possibly none
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertLine {
    pub reading_id: RecordId,
    pub warnings: Vec<Warning>,
}

impl AlertLine {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Warning messages joined by a space; empty when nothing is flagged
    pub fn text(&self) -> String {
        self.warnings
            .iter()
            .map(Warning::message)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Check one reading against the thresholds
pub fn check_reading(reading: &Reading, threshold: &ThresholdValues) -> AlertLine {
    let warnings = Resource::ALL
        .iter()
        .filter_map(|&resource| {
            let value = reading.value(resource);
            let limit = threshold.get(resource);
            (value >= limit).then(|| Warning {
                resource,
                value,
                threshold: limit,
            })
        })
        .collect();

    AlertLine {
        reading_id: reading.id,
        warnings,
    }
}

/// Alert lines for every reading, in reading order
pub fn alert_lines(readings: &[Reading], threshold: &ThresholdValues) -> Vec<AlertLine> {
    readings
        .iter()
        .map(|r| check_reading(r, threshold))
        .collect()
}
