//! Twilio configuration extraction.
//!
//! The embedding application supplies an arbitrary settings tree. The Twilio
//! values live under the [`CONFIG_NAMESPACE`] key:
//!
//! ```yaml
//! twilio:
//!   account_sid: ACxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx
//!   auth_token: your-auth-token
//!   webhook_url: https://hooks.example.org   # optional
//! ```
//!
//! Extraction is pure: no I/O, no logging of secret values.

use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Settings key holding the Twilio configuration section.
pub const CONFIG_NAMESPACE: &str = "twilio";

const AUTH_TOKEN_KEY: &str = "auth_token";
const ACCOUNT_SID_KEY: &str = "account_sid";
const WEBHOOK_URL_KEY: &str = "webhook_url";

// ============================================================================
// AuthToken
// ============================================================================

/// The shared secret used to sign and verify Twilio requests.
///
/// Guaranteed non-empty. The value is wiped from memory when dropped and is
/// never included in `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token, rejecting the empty string.
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ConfigError::MissingAuthToken);
        }
        Ok(Self(value))
    }

    /// Access the raw secret. Callers must not log the returned value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<REDACTED>)")
    }
}

// ============================================================================
// TwilioConfig
// ============================================================================

/// Configuration for webhook validation.
///
/// Immutable once built; a value of this type always carries a usable
/// auth token.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    auth_token: AuthToken,
    account_sid: Option<String>,
    webhook_url: Option<String>,
}

impl TwilioConfig {
    /// Build a configuration from an auth token alone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAuthToken`] if `auth_token` is empty.
    pub fn new(auth_token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            auth_token: AuthToken::new(auth_token)?,
            account_sid: None,
            webhook_url: None,
        })
    }

    /// Set the public base URL Twilio is configured to call.
    ///
    /// Used instead of the `Host` header when the service runs behind a
    /// proxy that rewrites it. A trailing slash is dropped.
    pub fn with_webhook_url(mut self, webhook_url: impl Into<String>) -> Self {
        let url = webhook_url.into();
        let trimmed = url.trim_end_matches('/');
        self.webhook_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Extract the Twilio section from an application-wide settings tree.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingNamespace`] if there is no `twilio` key
    /// - [`ConfigError::NamespaceNotAMapping`] if `twilio` is not a mapping
    /// - [`ConfigError::MissingAuthToken`] if `auth_token` is absent, empty,
    ///   or not a string
    /// - [`ConfigError::InvalidField`] if `webhook_url` or `account_sid` is
    ///   present but not a string
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let section = namespace(settings)?;

        let auth_token = non_empty_str(section, AUTH_TOKEN_KEY).ok_or(ConfigError::MissingAuthToken)?;
        let mut config = Self::new(auth_token)?;

        config.account_sid = optional_str(section, ACCOUNT_SID_KEY)?;
        if let Some(url) = optional_str(section, WEBHOOK_URL_KEY)? {
            config = config.with_webhook_url(url);
        }

        Ok(config)
    }

    pub fn auth_token(&self) -> &AuthToken {
        &self.auth_token
    }

    pub fn account_sid(&self) -> Option<&str> {
        self.account_sid.as_deref()
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }
}

// ============================================================================
// RestClientConfig
// ============================================================================

/// Credentials for the Twilio REST API.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    account_sid: String,
    auth_token: AuthToken,
}

impl RestClientConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] if either value is empty.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let account_sid = account_sid.into();
        if account_sid.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        let auth_token = AuthToken::new(auth_token).map_err(|_| ConfigError::MissingCredentials)?;

        Ok(Self {
            account_sid,
            auth_token,
        })
    }

    /// Extract REST credentials from an application-wide settings tree.
    ///
    /// Both `twilio.account_sid` and `twilio.auth_token` must be non-empty
    /// strings.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let section = namespace(settings)?;

        match (
            non_empty_str(section, ACCOUNT_SID_KEY),
            non_empty_str(section, AUTH_TOKEN_KEY),
        ) {
            (Some(sid), Some(token)) => Self::new(sid, token),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    pub fn auth_token(&self) -> &AuthToken {
        &self.auth_token
    }
}

// ============================================================================
// Private helpers
// ============================================================================

fn namespace(settings: &Value) -> Result<&Map<String, Value>, ConfigError> {
    let section = settings
        .get(CONFIG_NAMESPACE)
        .ok_or(ConfigError::MissingNamespace)?;

    section.as_object().ok_or(ConfigError::NamespaceNotAMapping)
}

fn non_empty_str<'a>(section: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    section
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn optional_str(section: &Map<String, Value>, key: &str) -> Result<Option<String>, ConfigError> {
    match section.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ConfigError::InvalidField {
            field: format!("{}.{}", CONFIG_NAMESPACE, key),
            message: "expected a string".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
