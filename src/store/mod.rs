//! Remote Store
//!
//! The hosted tabular database holding sites, readings and thresholds.
//! Everything the dashboard persists goes through [`RemoteStore`]; the
//! production implementation is the NocoDB REST client in [`client`].
//!
//! ## Tables
//!
//! - **Campings**: sites (read-only here)
//! - **Releves de compteurs**: meter readings (list, create)
//! - **Seuils**: thresholds (list, create, update)

mod client;
#[cfg(test)]
pub(crate) mod memory;

pub use client::{NocoClient, StoreConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NewReading, Reading, RecordId, Site, Threshold, ThresholdPayload};

/// CRUD access to the remote tables
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_sites(&self) -> StoreResult<Vec<Site>>;

    async fn list_readings(&self) -> StoreResult<Vec<Reading>>;

    async fn list_thresholds(&self) -> StoreResult<Vec<Threshold>>;

    async fn create_reading(&self, reading: &NewReading) -> StoreResult<()>;

    async fn create_threshold(&self, threshold: &ThresholdPayload) -> StoreResult<()>;

    /// Partial update of an existing threshold row
    async fn update_threshold(&self, id: RecordId, threshold: &ThresholdPayload)
        -> StoreResult<()>;
}

/// Errors that can occur when talking to the remote store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Remote store unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error("Malformed response from {table}: {message}")]
    Decode { table: String, message: String },
}

impl StoreError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable | StoreError::Timeout => true,
            StoreError::Request(e) => e.is_timeout() || e.is_connect(),
            StoreError::Rejected { status, .. } => *status == 429 || *status >= 500,
            StoreError::Config(_) | StoreError::Decode { .. } => false,
        }
    }

    /// True when the store answered with a non-success status
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::Rejected { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Timeout.is_transient());
        assert!(StoreError::Unavailable.is_transient());
        assert!(StoreError::Rejected {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(StoreError::Rejected {
            status: 429,
            message: String::new()
        }
        .is_transient());
        assert!(!StoreError::Rejected {
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!StoreError::Decode {
            table: "Seuils".into(),
            message: "eof".into()
        }
        .is_transient());
    }
}
