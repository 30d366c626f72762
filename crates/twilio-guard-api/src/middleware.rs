//! Twilio webhook validation middleware.
//!
//! The middleware sits in front of webhook handlers. For every request it:
//! 1. Requires a non-empty `X-Twilio-Signature` header
//! 2. Reconstructs the URL Twilio called
//! 3. Buffers the body and derives the signed payload (form fields or raw bytes)
//! 4. Verifies the signature and forwards the request with an intact body
//!
//! Failures are returned as [`WebhookError`] values; the handler chain is
//! never invoked for a rejected request.

use crate::errors::WebhookRejection;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE, HOST},
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::{future::Future, sync::Arc};
use tracing::{debug, info, instrument, warn};
use twilio_guard_core::{
    ConfigError, RequestValidator, SignedPayload, TwilioConfig, WebhookError, SIGNATURE_HEADER,
};

/// Default upper bound on buffered webhook bodies.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Verifies that requests were signed by Twilio.
///
/// Immutable after construction; share it behind an [`Arc`] across requests.
#[derive(Debug, Clone)]
pub struct WebhookValidationMiddleware {
    validator: RequestValidator,
    webhook_url: Option<String>,
    max_body_size: usize,
}

impl WebhookValidationMiddleware {
    /// Create the middleware from a validated configuration.
    pub fn new(config: TwilioConfig) -> Self {
        info!(
            public_url_configured = config.webhook_url().is_some(),
            "Twilio webhook validation enabled"
        );

        Self {
            validator: RequestValidator::new(config.auth_token().clone()),
            webhook_url: config.webhook_url().map(str::to_string),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Create the middleware from an application-wide settings tree.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the `twilio` namespace or its
    /// `auth_token` is missing; the service must not start in that case.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        Ok(Self::new(TwilioConfig::from_settings(settings)?))
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Validate `request` and return it with its body restored.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::MissingSignature`] if the header is absent or empty
    /// - [`WebhookError::PayloadTooLarge`] if `Content-Length` exceeds the limit
    /// - [`WebhookError::UnreadableBody`] if the body cannot be buffered
    /// - [`WebhookError::InvalidSignature`] if the signature does not match
    #[instrument(skip(self, request), fields(
        method = %request.method(),
        path = %request.uri().path()
    ))]
    pub async fn check(&self, request: Request) -> Result<Request, WebhookError> {
        let signature = signature_header(request.headers())?;

        if let Some(size) = declared_length(request.headers()) {
            if size > self.max_body_size {
                warn!(
                    payload_size = size,
                    max_size = self.max_body_size,
                    "Rejecting oversized webhook"
                );
                return Err(WebhookError::PayloadTooLarge {
                    size,
                    max_size: self.max_body_size,
                });
            }
        }

        let url = self.request_url(&request);
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| WebhookError::UnreadableBody {
                message: e.to_string(),
            })?;

        let is_valid = if is_form_encoded(&parts.headers) {
            let params: Vec<(String, String)> =
                url::form_urlencoded::parse(&bytes).into_owned().collect();
            self.validator
                .validate(&signature, &url, &SignedPayload::Form(&params))
        } else {
            self.validator
                .validate(&signature, &url, &SignedPayload::Raw(&bytes))
        };

        if !is_valid {
            warn!(url = %url, body_size = bytes.len(), "Twilio signature failed validation");
            return Err(WebhookError::InvalidSignature);
        }

        debug!(body_size = bytes.len(), "Twilio signature verified");
        Ok(Request::from_parts(parts, Body::from(bytes)))
    }

    /// Validate `request` and, only if it is authentic, hand it to `next`.
    ///
    /// `next` is called at most once and its response is returned unmodified.
    pub async fn process<F, Fut>(&self, request: Request, next: F) -> Result<Response, WebhookError>
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        let request = self.check(request).await?;
        Ok(next(request).await)
    }

    /// The URL Twilio requested, as presented to the server.
    ///
    /// Preference order: configured public URL, absolute request URI,
    /// `X-Forwarded-Proto` (default `https`) plus `Host`.
    fn request_url(&self, request: &Request) -> String {
        let uri = request.uri();
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

        if let Some(base) = &self.webhook_url {
            return format!("{}{}", base, path_and_query);
        }

        if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
            return format!("{}://{}{}", scheme, authority, path_and_query);
        }

        let headers = request.headers();
        match headers.get(HOST).and_then(|v| v.to_str().ok()) {
            Some(host) => {
                let scheme = headers
                    .get(FORWARDED_PROTO_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .unwrap_or("https");
                format!("{}://{}{}", scheme, host, path_and_query)
            }
            None => path_and_query.to_string(),
        }
    }
}

/// axum middleware function enforcing Twilio signatures.
///
/// ```rust,no_run
/// use axum::{middleware, routing::post, Router};
/// use std::sync::Arc;
/// use twilio_guard_api::{validate_twilio_webhook, WebhookValidationMiddleware};
/// use twilio_guard_core::TwilioConfig;
///
/// let guard = Arc::new(WebhookValidationMiddleware::new(
///     TwilioConfig::new("auth-token").unwrap(),
/// ));
/// let app: Router = Router::new()
///     .route("/sms", post(|| async { "ok" }))
///     .route_layer(middleware::from_fn_with_state(guard, validate_twilio_webhook));
/// ```
pub async fn validate_twilio_webhook(
    State(guard): State<Arc<WebhookValidationMiddleware>>,
    request: Request,
    next: Next,
) -> Result<Response, WebhookRejection> {
    guard
        .process(request, |request| next.run(request))
        .await
        .map_err(WebhookRejection::from)
}

// ============================================================================
// Private helpers
// ============================================================================

fn signature_header(headers: &HeaderMap) -> Result<String, WebhookError> {
    match headers.get(SIGNATURE_HEADER) {
        None => Err(WebhookError::MissingSignature),
        Some(value) if value.is_empty() => Err(WebhookError::MissingSignature),
        // Base64 is ASCII; anything else cannot match.
        Some(value) => value
            .to_str()
            .map(str::to_string)
            .map_err(|_| WebhookError::InvalidSignature),
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
