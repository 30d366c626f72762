//! Error types for Twilio Guard operations.
//!
//! Errors are split by the phase in which they occur:
//! - [`ConfigError`]: start-up time, the service must not serve traffic
//! - [`WebhookError`]: request time, the request is rejected
//! - [`RestClientError`]: outbound calls to the Twilio REST API

use thiserror::Error;

/// Configuration errors raised while building components from settings.
///
/// These are deployment errors. They are never produced while handling a
/// request and should stop the hosting service from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The settings do not contain the `twilio` namespace.
    #[error("Twilio configuration is missing.")]
    MissingNamespace,

    /// The `twilio` namespace exists but is not a mapping.
    #[error("Twilio configuration must be a mapping.")]
    NamespaceNotAMapping,

    /// `twilio.auth_token` is absent, not a string, or empty.
    #[error("Twilio Auth Token is missing or empty.")]
    MissingAuthToken,

    /// Either `twilio.account_sid` or `twilio.auth_token` is absent or empty.
    #[error("Twilio configuration is missing either the account SID or the auth token.")]
    MissingCredentials,

    /// An optional field is present but has the wrong shape.
    #[error("Twilio configuration field '{field}' is invalid: {message}")]
    InvalidField { field: String, message: String },
}

/// Request-time webhook validation failures.
///
/// Every variant is abortive: the downstream handler is not invoked. Turning
/// these into protocol responses is the job of the HTTP adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// The `X-Twilio-Signature` header is absent or empty.
    ///
    /// Usually misrouted or non-Twilio traffic rather than tampering.
    #[error("The request does not contain a Twilio signature header.")]
    MissingSignature,

    /// The signature header is present but does not match the request.
    #[error("The webhook's signature failed validation")]
    InvalidSignature,

    /// The declared body size exceeds the configured limit.
    #[error("Payload too large: {size} bytes (max: {max_size} bytes)")]
    PayloadTooLarge { size: usize, max_size: usize },

    /// The request body could not be buffered for signing.
    #[error("The request body could not be read: {message}")]
    UnreadableBody { message: String },
}

impl WebhookError {
    /// Check if the failure concerns the authenticity of the request, as
    /// opposed to its transport.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::MissingSignature | Self::InvalidSignature)
    }
}

/// Errors from the Twilio REST client.
#[derive(Debug, Error)]
pub enum RestClientError {
    /// The client could not be built from configuration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Network connectivity or transport error.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The Twilio API returned an error status.
    #[error("Twilio API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl RestClientError {
    /// Check if this error represents a transient condition that may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
