//! Domain Types
//!
//! Sites, meter readings and thresholds as stored in the remote tabular
//! database. Field names on the wire follow the remote tables
//! (`camping_id`, `date_releve`, `compteur_eau`, ...); the Rust side uses
//! plain English names.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifier assigned by the remote store
pub type RecordId = i64;

/// A camping site whose meters are tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(alias = "Id", deserialize_with = "lenient::record_id")]
    pub id: RecordId,
    /// Display name
    #[serde(rename = "nom", alias = "Title", default)]
    pub name: String,
}

/// One meter reading for a site on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(alias = "Id", deserialize_with = "lenient::record_id")]
    pub id: RecordId,
    #[serde(rename = "camping_id", deserialize_with = "lenient::record_id")]
    pub site_id: RecordId,
    #[serde(rename = "date_releve", with = "lenient::date")]
    pub reading_date: NaiveDate,
    #[serde(rename = "compteur_eau", default, deserialize_with = "lenient::decimal")]
    pub water: f64,
    #[serde(rename = "compteur_elec", default, deserialize_with = "lenient::decimal")]
    pub electricity: f64,
    #[serde(rename = "compteur_gaz", default, deserialize_with = "lenient::decimal")]
    pub gas: f64,
}

impl Reading {
    /// Calendar year of the reading date
    pub fn year(&self) -> i32 {
        self.reading_date.year()
    }

    /// Meter value for one resource
    pub fn value(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Water => self.water,
            Resource::Electricity => self.electricity,
            Resource::Gas => self.gas,
        }
    }
}

/// Per-site alert limits. At most one per site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(alias = "Id", deserialize_with = "lenient::record_id")]
    pub id: RecordId,
    #[serde(rename = "camping_id", deserialize_with = "lenient::record_id")]
    pub site_id: RecordId,
    #[serde(rename = "seuil_eau", default, deserialize_with = "lenient::decimal")]
    pub water: f64,
    #[serde(rename = "seuil_elec", default, deserialize_with = "lenient::decimal")]
    pub electricity: f64,
    #[serde(rename = "seuil_gaz", default, deserialize_with = "lenient::decimal")]
    pub gas: f64,
}

impl Threshold {
    pub fn values(&self) -> ThresholdValues {
        ThresholdValues {
            water: self.water,
            electricity: self.electricity,
            gas: self.gas,
        }
    }
}

/// The three threshold limits, detached from any record.
///
/// `Default` is the implicit zero threshold used when a site has none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdValues {
    pub water: f64,
    pub electricity: f64,
    pub gas: f64,
}

impl ThresholdValues {
    pub fn new(water: f64, electricity: f64, gas: f64) -> Self {
        Self {
            water,
            electricity,
            gas,
        }
    }

    pub fn get(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Water => self.water,
            Resource::Electricity => self.electricity,
            Resource::Gas => self.gas,
        }
    }
}

/// Body of a "create reading" request (reading fields minus id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReading {
    #[serde(rename = "camping_id")]
    pub site_id: RecordId,
    #[serde(rename = "date_releve", with = "lenient::date")]
    pub reading_date: NaiveDate,
    #[serde(rename = "compteur_eau")]
    pub water: f64,
    #[serde(rename = "compteur_elec")]
    pub electricity: f64,
    #[serde(rename = "compteur_gaz")]
    pub gas: f64,
}

/// Body of a threshold create/update request (threshold fields minus id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdPayload {
    #[serde(rename = "camping_id")]
    pub site_id: RecordId,
    #[serde(rename = "seuil_eau")]
    pub water: f64,
    #[serde(rename = "seuil_elec")]
    pub electricity: f64,
    #[serde(rename = "seuil_gaz")]
    pub gas: f64,
}

impl ThresholdPayload {
    pub fn new(site_id: RecordId, values: ThresholdValues) -> Self {
        Self {
            site_id,
            water: values.water,
            electricity: values.electricity,
            gas: values.gas,
        }
    }
}

/// Metered utility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Water,
    Electricity,
    Gas,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Water, Resource::Electricity, Resource::Gas];

    pub fn label(&self) -> &'static str {
        match self {
            Resource::Water => "water",
            Resource::Electricity => "electricity",
            Resource::Gas => "gas",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tolerant decoders for remote rows.
///
/// The store hands back ids and decimals either as JSON numbers or strings,
/// meter values may be null, and date columns may carry a time part.
mod lenient {
    use super::RecordId;
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn record_id<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Int(v) => Ok(v),
            NumberOrText::Float(v) if v.fract() == 0.0 => Ok(v as i64),
            NumberOrText::Float(v) => Err(de::Error::custom(format!("invalid id: {}", v))),
            NumberOrText::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid id: {:?}", s))),
        }
    }

    pub fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            None => Ok(0.0),
            Some(NumberOrText::Int(v)) => Ok(v as f64),
            Some(NumberOrText::Float(v)) => Ok(v),
            Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(0.0),
            Some(NumberOrText::Text(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| de::Error::custom(format!("invalid decimal: {:?}", s))),
        }
    }

    pub mod date {
        use super::*;

        const FORMAT: &str = "%Y-%m-%d";

        pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(&date.format(FORMAT))
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            let day = s.get(..10).unwrap_or(&s);
            NaiveDate::parse_from_str(day, FORMAT)
                .map_err(|_| de::Error::custom(format!("invalid date: {:?}", s)))
        }
    }
}
