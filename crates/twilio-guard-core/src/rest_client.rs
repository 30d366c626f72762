//! Twilio REST client factory.
//!
//! Builds an authenticated HTTP client from the same `twilio` configuration
//! namespace used by webhook validation. Requests are scoped to the
//! configured account: `{base_url}/Accounts/{account_sid}{path}`.

use crate::config::{AuthToken, RestClientConfig};
use crate::error::RestClientError;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Default Twilio REST API root.
pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

/// Authenticated client for the Twilio REST API.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: AuthToken,
}

impl RestClient {
    /// Create a client for the account in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RestClientError::Transport`] if the HTTP client cannot be
    /// initialised (e.g. TLS backend failure).
    pub fn new(config: RestClientConfig) -> Result<Self, RestClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("twilio-guard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            account_sid: config.account_sid().to_string(),
            auth_token: config.auth_token().clone(),
        })
    }

    /// Create a client from an application-wide settings tree.
    ///
    /// # Errors
    ///
    /// Returns [`RestClientError::Configuration`] if `twilio.account_sid` or
    /// `twilio.auth_token` is missing.
    pub fn from_settings(settings: &Value) -> Result<Self, RestClientError> {
        let config = RestClientConfig::from_settings(settings)?;
        Self::new(config)
    }

    /// Point the client at a different API root (regional edge, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an authenticated request for a path under the account resource.
    ///
    /// `path` is appended verbatim, e.g. `"/Messages.json"`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/Accounts/{}{}",
            self.base_url, self.account_sid, path
        );

        self.http
            .request(method, url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
    }

    /// Fetch the account resource.
    ///
    /// # Errors
    ///
    /// - [`RestClientError::Transport`] on network failure or an unparseable body
    /// - [`RestClientError::Api`] when Twilio answers with a non-success status
    #[instrument(skip(self), fields(account_sid = %self.account_sid))]
    pub async fn fetch_account(&self) -> Result<Value, RestClientError> {
        let response = self.request(Method::GET, ".json").send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

            warn!(status = status.as_u16(), "Twilio API request failed");
            return Err(RestClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Fetched Twilio account resource");
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
#[path = "rest_client_tests.rs"]
mod tests;
