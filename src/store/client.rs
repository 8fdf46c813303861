//! NocoDB REST Client
//!
//! HTTP client for the hosted tabular database. Every request carries the
//! static `xc-token` header; table names are percent-encoded into the path.

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{RemoteStore, StoreError, StoreResult};
use crate::model::{NewReading, Reading, RecordId, Site, Threshold, ThresholdPayload};

/// Remote store REST client
pub struct NocoClient {
    client: Client,
    config: StoreConfig,
}

/// Configuration for the remote store client
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL up to (not including) the table name,
    /// e.g. "https://app.nocodb.com/api/v1/db/data/noco/<project>"
    pub base_url: String,
    /// Value of the `xc-token` header
    pub token: String,
    pub sites_table: String,
    pub readings_table: String,
    pub thresholds_table: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Extra attempts for list requests on transient failures
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.nocodb.com/api/v1/db/data/noco".to_string(),
            token: String::new(),
            sites_table: "Campings".to_string(),
            readings_table: "Releves de compteurs".to_string(),
            thresholds_table: "Seuils".to_string(),
            request_timeout_ms: 10_000,
            max_retries: 2,
        }
    }
}

/// `{ "list": [...] }` envelope returned by list endpoints
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    list: Vec<serde_json::Value>,
}

impl NocoClient {
    /// Create a new client with the given configuration
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let token = header::HeaderValue::from_str(&config.token).map_err(|_| {
            StoreError::Config("token contains characters not allowed in a header".to_string())
        })?;
        headers.insert("xc-token", token);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// URL of a table, optionally addressing one row
    fn table_url(&self, table: &str, id: Option<RecordId>) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let table = urlencoding::encode(table);
        match id {
            Some(id) => format!("{}/{}/{}", base, table, id),
            None => format!("{}/{}", base, table),
        }
    }

    /// Fetch every row of a table, retrying transient failures
    async fn list<T: DeserializeOwned>(&self, table: &str) -> StoreResult<Vec<T>> {
        let url = self.table_url(table, None);
        let mut attempt = 0;

        loop {
            match self.fetch_list(table, &url).await {
                Ok(rows) => {
                    tracing::debug!(table, rows = rows.len(), "Fetched table");
                    return Ok(rows);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    // Backoff: 1s, 4s, 9s...
                    let delay = Duration::from_secs((attempt as u64).pow(2));
                    tracing::warn!(table, attempt, error = %e, "List request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_list<T: DeserializeOwned>(&self, table: &str, url: &str) -> StoreResult<Vec<T>> {
        let response = send(self.client.get(url)).await?;
        let response = check_status(response).await?;

        let body = response.bytes().await.map_err(classify)?;
        decode_list(table, &body)
    }

    /// Send a write request. Writes are not retried.
    async fn write<B: Serialize>(&self, method: Method, url: &str, body: &B) -> StoreResult<()> {
        let response = send(self.client.request(method.clone(), url).json(body)).await?;
        check_status(response).await?;
        tracing::info!(%method, url, "Remote write accepted");
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for NocoClient {
    async fn list_sites(&self) -> StoreResult<Vec<Site>> {
        self.list(&self.config.sites_table).await
    }

    async fn list_readings(&self) -> StoreResult<Vec<Reading>> {
        self.list(&self.config.readings_table).await
    }

    async fn list_thresholds(&self) -> StoreResult<Vec<Threshold>> {
        self.list(&self.config.thresholds_table).await
    }

    async fn create_reading(&self, reading: &NewReading) -> StoreResult<()> {
        let url = self.table_url(&self.config.readings_table, None);
        self.write(Method::POST, &url, reading).await
    }

    async fn create_threshold(&self, threshold: &ThresholdPayload) -> StoreResult<()> {
        let url = self.table_url(&self.config.thresholds_table, None);
        self.write(Method::POST, &url, threshold).await
    }

    async fn update_threshold(
        &self,
        id: RecordId,
        threshold: &ThresholdPayload,
    ) -> StoreResult<()> {
        let url = self.table_url(&self.config.thresholds_table, Some(id));
        self.write(Method::PATCH, &url, threshold).await
    }
}

async fn send(request: RequestBuilder) -> StoreResult<Response> {
    request.send().await.map_err(classify)
}

async fn check_status(response: Response) -> StoreResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Decode a list body row by row. Rows that do not fit the model (unlinked
/// site, missing date) are skipped so one bad row cannot hide the table.
fn decode_list<T: DeserializeOwned>(table: &str, body: &[u8]) -> StoreResult<Vec<T>> {
    let envelope: ListResponse =
        serde_json::from_slice(body).map_err(|e| StoreError::Decode {
            table: table.to_string(),
            message: e.to_string(),
        })?;

    let total = envelope.list.len();
    let rows: Vec<T> = envelope
        .list
        .into_iter()
        .filter_map(|row| {
            let id = row.get("Id").or_else(|| row.get("id")).cloned();
            match serde_json::from_value(row) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(table, row_id = ?id, error = %e, "Skipping malformed row");
                    None
                }
            }
        })
        .collect();

    if rows.len() < total {
        tracing::warn!(table, skipped = total - rows.len(), total, "Some rows were skipped");
    }
    Ok(rows)
}

fn classify(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connect() {
        StoreError::Unavailable
    } else {
        StoreError::Request(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> NocoClient {
        NocoClient::new(StoreConfig {
            base_url: base_url.to_string(),
            token: "test-token".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.sites_table, "Campings");
        assert_eq!(config.readings_table, "Releves de compteurs");
        assert_eq!(config.thresholds_table, "Seuils");
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_table_url_encodes_spaces() {
        let client = client("https://example.test/api/v1/db/data/noco/p1/");
        assert_eq!(
            client.table_url("Releves de compteurs", None),
            "https://example.test/api/v1/db/data/noco/p1/Releves%20de%20compteurs"
        );
    }

    #[test]
    fn test_table_url_with_row_id() {
        let client = client("https://example.test/noco");
        assert_eq!(
            client.table_url("Seuils", Some(42)),
            "https://example.test/noco/Seuils/42"
        );
    }

    #[test]
    fn test_list_envelope_without_list() {
        let sites: Vec<Site> = decode_list("Campings", br#"{"pageInfo": {}}"#).unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn test_list_envelope_with_rows() {
        let sites: Vec<Site> =
            decode_list("Campings", br#"{"list": [{"Id": 1, "nom": "Le Lac"}]}"#).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "Le Lac");
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let body = br#"{"list": [
            {"Id": 1, "camping_id": 1, "date_releve": "2023-01-01", "compteur_eau": 10},
            {"Id": 2, "camping_id": null, "date_releve": "2023-02-01", "compteur_eau": 3},
            {"Id": 3, "camping_id": 1, "date_releve": null},
            {"Id": 4, "camping_id": 2, "date_releve": "2023-03-01", "compteur_gaz": "NaN"}
        ]}"#;

        let readings: Vec<Reading> = decode_list("Releves de compteurs", body).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].id, 1);
        assert_eq!(readings[0].water, 10.0);
    }

    #[test]
    fn test_non_json_body_is_decode_error() {
        let err = decode_list::<Site>("Campings", b"<html>").unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let result = NocoClient::new(StoreConfig {
            token: "bad\ntoken".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        let client = NocoClient::new(StoreConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            token: "t".to_string(),
            request_timeout_ms: 500,
            max_retries: 0,
            ..Default::default()
        })
        .unwrap();

        let err = client.list_sites().await.unwrap_err();
        assert!(!err.is_rejection());
    }
}
