//! Error types for allbookd-gateway HTTP handlers

use crate::services::{BestsellerError, UpstreamError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type for the catalog proxy routes
#[derive(Debug, Error)]
pub enum ApiError {
    /// Catalog API key missing (500)
    #[error("API key is not set")]
    ConfigurationMissing,

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upstream answered with a non-success status; forwarded as-is
    #[error("Catalog API error: {reason}")]
    Upstream { status: StatusCode, reason: String },

    /// Upstream could not be reached or answered garbage (500)
    #[error("{message}")]
    FetchFailed {
        message: &'static str,
        details: String,
    },
}

impl ApiError {
    /// Map a catalog client error; `context` is the user-facing message for
    /// transport and parse failures
    pub fn from_catalog(err: UpstreamError, context: &'static str) -> Self {
        match err {
            UpstreamError::MissingApiKey => ApiError::ConfigurationMissing,
            UpstreamError::Status { status, reason } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                reason,
            },
            other => ApiError::FetchFailed {
                message: context,
                details: other.to_string(),
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::ConfigurationMissing => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::FetchFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::FetchFailed { message, details } => json!({
                "error": message,
                "details": details,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Ranking failure: 500 with an empty result set so the UI can render a
/// "could not load" state
impl IntoResponse for BestsellerError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "results": [],
            "error": self.to_string(),
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_maps_to_configuration_missing() {
        let err = ApiError::from_catalog(UpstreamError::MissingApiKey, "Failed to fetch books");
        assert!(matches!(err, ApiError::ConfigurationMissing));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "API key is not set");
    }

    #[test]
    fn test_upstream_status_forwarded() {
        let err = ApiError::from_catalog(
            UpstreamError::Status {
                status: 404,
                reason: "Not Found".to_string(),
            },
            "Failed to fetch book",
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Catalog API error: Not Found");
    }

    #[test]
    fn test_network_failure_is_fetch_failed() {
        let err = ApiError::from_catalog(
            UpstreamError::Network("connection refused".to_string()),
            "Failed to fetch books",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to fetch books");
    }
}
