//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;
use twilio_guard_core::WebhookError;

/// HTTP adapter for webhook validation failures
///
/// Maps each [`WebhookError`] to a status code:
///
/// - `400 Bad Request`: missing signature header, unreadable body
/// - `403 Forbidden`: signature present but invalid
/// - `413 Payload Too Large`: declared body exceeds the configured limit
///
/// # Security Considerations
///
/// The response body carries only the error's fixed message. It never says
/// which part of the signature comparison failed.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct WebhookRejection(#[from] pub WebhookError);

impl WebhookRejection {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            WebhookError::MissingSignature => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::FORBIDDEN,
            WebhookError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            WebhookError::UnreadableBody { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = %status, error = %self.0, "Rejected webhook request");

        let body = serde_json::json!({
            "error": self.0.to_string(),
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
    Configuration(#[from] ServiceConfigError),
}

/// Service configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Twilio configuration error: {0}")]
    Twilio(#[from] twilio_guard_core::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
