//! Configuration types for the HTTP service
//!
//! Every field carries a serde default, so an empty settings tree produces a
//! runnable service configuration. The Twilio secret is not part of this
//! struct; it is read from the `twilio` namespace of the same settings tree
//! by [`twilio_guard_core::TwilioConfig`].

use crate::errors::ServiceConfigError;
use crate::middleware::DEFAULT_MAX_BODY_SIZE;
use serde::{Deserialize, Serialize};

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhooks: WebhookConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check values that deserialize fine but cannot be served.
    pub fn validate(&self) -> Result<(), ServiceConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ServiceConfigError::Invalid {
                message: "server.host must not be empty".to_string(),
            });
        }

        if self.server.max_body_size == 0 {
            return Err(ServiceConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }

        let path = &self.webhooks.endpoint_path;
        if !path.starts_with('/') {
            return Err(ServiceConfigError::Invalid {
                message: format!("webhooks.endpoint_path must start with '/', got '{}'", path),
            });
        }

        if path == crate::HEALTH_PATH {
            return Err(ServiceConfigError::Invalid {
                message: format!("webhooks.endpoint_path conflicts with '{}'", crate::HEALTH_PATH),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum webhook body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Path Twilio posts to
    pub endpoint_path: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhooks/twilio".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
