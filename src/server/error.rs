//! HTTP error responses for the API

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Seconds a client should wait before retrying while the extractor initializes
const RETRY_AFTER_SECS: &str = "5";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Service is still initializing. Please wait a moment and try again.")]
    NotReady,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to fetch video info")]
    InfoFetch(String),

    #[error("Download failed: {0}")]
    Download(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InfoFetch(_) | ApiError::Download(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::InfoFetch(details) => json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, ApiError::NotReady) {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}
