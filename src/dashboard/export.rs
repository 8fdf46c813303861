//! CSV Export
//!
//! Two downloadable files: thresholds annotated with their site name, and
//! the currently filtered readings.

use serde::Serialize;
use thiserror::Error;

use crate::model::{Reading, RecordId, Site, Threshold};

pub const THRESHOLDS_FILENAME: &str = "seuils-export.csv";
pub const READINGS_FILENAME: &str = "releves-export.csv";

/// Label used when a threshold references a site that is not loaded
pub const UNKNOWN_SITE: &str = "Unknown";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// Threshold row with the resolved site display name
#[derive(Debug, Serialize)]
struct ThresholdRow<'a> {
    id: RecordId,
    camping_id: RecordId,
    seuil_eau: f64,
    seuil_elec: f64,
    seuil_gaz: f64,
    nom_camping: &'a str,
}

/// Render thresholds as CSV, one row per threshold
pub fn thresholds_csv(thresholds: &[Threshold], sites: &[Site]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if thresholds.is_empty() {
        writer.write_record([
            "id",
            "camping_id",
            "seuil_eau",
            "seuil_elec",
            "seuil_gaz",
            "nom_camping",
        ])?;
    }

    for threshold in thresholds {
        let site_name = sites
            .iter()
            .find(|s| s.id == threshold.site_id)
            .map(|s| s.name.as_str())
            .unwrap_or(UNKNOWN_SITE);

        writer.serialize(ThresholdRow {
            id: threshold.id,
            camping_id: threshold.site_id,
            seuil_eau: threshold.water,
            seuil_elec: threshold.electricity,
            seuil_gaz: threshold.gas,
            nom_camping: site_name,
        })?;
    }

    finish(writer)
}

/// Render readings as CSV in the order given
pub fn readings_csv(readings: &[Reading]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if readings.is_empty() {
        writer.write_record([
            "id",
            "camping_id",
            "date_releve",
            "compteur_eau",
            "compteur_elec",
            "compteur_gaz",
        ])?;
    }

    for reading in readings {
        writer.serialize(reading)?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn threshold(id: RecordId, site_id: RecordId) -> Threshold {
        Threshold {
            id,
            site_id,
            water: 5.0,
            electricity: 6.0,
            gas: 7.5,
        }
    }

    #[test]
    fn test_thresholds_resolve_site_names() {
        let sites = vec![Site {
            id: 1,
            name: "Les Pins".to_string(),
        }];
        let csv = thresholds_csv(&[threshold(10, 1), threshold(11, 99)], &sites).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "id,camping_id,seuil_eau,seuil_elec,seuil_gaz,nom_camping"
        );
        assert!(lines[1].starts_with("10,1,"));
        assert!(lines[1].ends_with(",Les Pins"));
        assert!(lines[2].ends_with(",Unknown"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_site_names_are_quoted_when_needed() {
        let sites = vec![Site {
            id: 1,
            name: "Camping \"Le Lac\", Nord".to_string(),
        }];
        let csv = thresholds_csv(&[threshold(10, 1)], &sites).unwrap();
        assert!(csv.contains("\"Camping \"\"Le Lac\"\", Nord\""));
    }

    #[test]
    fn test_readings_export() {
        let readings = vec![Reading {
            id: 3,
            site_id: 1,
            reading_date: NaiveDate::from_ymd_opt(2022, 2, 3).unwrap(),
            water: 10.0,
            electricity: 2.5,
            gas: 1.0,
        }];

        let csv = readings_csv(&readings).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "id,camping_id,date_releve,compteur_eau,compteur_elec,compteur_gaz"
        );
        assert!(lines[1].starts_with("3,1,2022-02-03,"));
        assert!(lines[1].contains("2.5"));
    }

    #[test]
    fn test_empty_exports_keep_header() {
        assert_eq!(readings_csv(&[]).unwrap().lines().count(), 1);
        assert_eq!(thresholds_csv(&[], &[]).unwrap().lines().count(), 1);
    }
}
