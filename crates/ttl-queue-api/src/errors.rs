//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;
use ttl_queue_core::ValidationError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Queue request handler errors with HTTP status code mapping
///
/// Every variant is a client error. Nothing a client sends can fail a queue
/// operation on the server side, so there is no 5xx mapping here.
#[derive(Debug, thiserror::Error)]
pub enum QueueHandlerError {
    /// TTL path segment is not a usable number of milliseconds
    ///
    /// Maps to: `400 Bad Request`
    ///
    /// Covers non-numeric input as well as TTLs that put the expiration
    /// outside the representable time range.
    #[error("Invalid TTL: {0}")]
    InvalidTtl(#[from] ValidationError),

    /// Request body is not valid JSON
    ///
    /// Maps to: `400 Bad Request`
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },
}

impl QueueHandlerError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTtl(_) | Self::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for QueueHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        warn!(status = %status, error = %message, "Rejected queue request");

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] ::config::ConfigError),
}
