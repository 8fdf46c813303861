//! Form Validation
//!
//! Raw text as typed by the user is parsed into write payloads before any
//! request is made. Every failing field is reported at once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{NewReading, RecordId, ThresholdValues};

/// A field that failed to parse or validate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All validation failures of one form submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(pub Vec<ValidationError>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for a given field, if it failed
    pub fn field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

/// Meter reading entry form, all fields as typed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingForm {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub water: String,
    #[serde(default)]
    pub electricity: String,
    #[serde(default)]
    pub gas: String,
}

impl ReadingForm {
    pub fn validate(&self) -> Result<NewReading, FormErrors> {
        let mut errors = FormErrors::default();

        let site_id = errors.check(parse_site(&self.site));
        let reading_date = errors.check(parse_date("date", &self.date));
        let water = errors.check(parse_decimal("water", &self.water));
        let electricity = errors.check(parse_decimal("electricity", &self.electricity));
        let gas = errors.check(parse_decimal("gas", &self.gas));

        match (site_id, reading_date, water, electricity, gas) {
            (Some(site_id), Some(reading_date), Some(water), Some(electricity), Some(gas)) => {
                Ok(NewReading {
                    site_id,
                    reading_date,
                    water,
                    electricity,
                    gas,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Threshold settings form, all fields as typed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThresholdForm {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub water: String,
    #[serde(default)]
    pub electricity: String,
    #[serde(default)]
    pub gas: String,
}

impl ThresholdForm {
    pub fn validate(&self) -> Result<(RecordId, ThresholdValues), FormErrors> {
        let mut errors = FormErrors::default();

        let site_id = errors.check(parse_site(&self.site));
        let water = errors.check(parse_decimal("water", &self.water));
        let electricity = errors.check(parse_decimal("electricity", &self.electricity));
        let gas = errors.check(parse_decimal("gas", &self.gas));

        match (site_id, water, electricity, gas) {
            (Some(site_id), Some(water), Some(electricity), Some(gas)) => {
                Ok((site_id, ThresholdValues::new(water, electricity, gas)))
            }
            _ => Err(errors),
        }
    }
}

fn parse_site(input: &str) -> Result<RecordId, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::new("site", "select a site"));
    }
    input
        .parse()
        .map_err(|_| ValidationError::new("site", format!("unknown site id {:?}", input)))
}

fn parse_date(field: &'static str, input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::new(field, "a date is required"));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, format!("{:?} is not a YYYY-MM-DD date", input)))
}

/// Parse a non-negative decimal; a comma decimal separator is accepted
pub fn parse_decimal(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::new(field, "a value is required"));
    }

    let value: f64 = input
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::new(field, format!("{:?} is not a number", input)))?;

    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }

    Ok(value)
}
