//! API Error Types
//!
//! Defines error types for the HTTP layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dashboard::{DashboardError, ExportError, FormErrors, ValidationError};
use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Form or JSON body failed validation
    #[error("Validation error: {0}")]
    Validation(FormErrors),

    /// Remote store failure
    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    /// CSV rendering failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Service unavailable (shutting down)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::Validation(errors) => ApiError::Validation(errors),
            DashboardError::Store(e) => ApiError::Store(e),
            DashboardError::Closed => {
                ApiError::ServiceUnavailable("dashboard is shutting down".to_string())
            }
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ValidationError>,
}

impl ApiError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::Store(e) if e.is_rejection() => (StatusCode::BAD_GATEWAY, "STORE_REJECTED"),
            ApiError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let request_id = uuid::Uuid::new_v4().to_string();

        // Log the error
        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let fields = match &self {
            ApiError::Validation(errors) => errors.0.clone(),
            _ => Vec::new(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
                fields,
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let rejected = ApiError::Store(StoreError::Rejected {
            status: 400,
            message: String::new(),
        });
        assert_eq!(rejected.status().0, StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::Store(StoreError::Timeout).status().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DashboardError::Validation(FormErrors::default())).status().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
