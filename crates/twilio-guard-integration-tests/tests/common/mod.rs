//! Common test utilities for twilio-guard integration tests
//!
//! This module provides:
//! - Router construction around a known auth token
//! - Signing helpers that mirror what Twilio sends
//! - Request builders for the protected webhook endpoint

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, HOST},
        Request,
    },
    Router,
};
use std::sync::Arc;
use twilio_guard_api::{create_router, AppState, ServiceConfig, WebhookValidationMiddleware};
use twilio_guard_core::{SignedPayload, TwilioConfig, SIGNATURE_HEADER};

/// Auth token shared by every test in this crate.
pub const AUTH_TOKEN: &str = "12345678901234567890123456789012";

/// Host the test requests claim to be addressed to.
pub const PUBLIC_HOST: &str = "hooks.example.org";

/// Path of the default webhook endpoint.
pub const WEBHOOK_PATH: &str = "/webhooks/twilio";

pub fn middleware() -> WebhookValidationMiddleware {
    WebhookValidationMiddleware::new(TwilioConfig::new(AUTH_TOKEN).expect("valid token"))
}

/// Router with default configuration.
pub fn router() -> Router {
    router_with(ServiceConfig::default(), middleware())
}

pub fn router_with(config: ServiceConfig, middleware: WebhookValidationMiddleware) -> Router {
    create_router(AppState::new(config, Arc::new(middleware)))
}

/// Public URL Twilio would have signed for `path_and_query`.
pub fn public_url(path_and_query: &str) -> String {
    format!("https://{}{}", PUBLIC_HOST, path_and_query)
}

/// Signature over a form-encoded callback.
pub fn sign_form(url: &str, params: &[(&str, &str)]) -> String {
    let owned: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    middleware().validator().compute_signature(url, &owned)
}

/// Signature over a URL followed by a raw body.
pub fn sign_raw(url: &str, body: &[u8]) -> String {
    middleware().validator().compute(url, &SignedPayload::Raw(body))
}

/// POST to the webhook endpoint with a form body.
pub fn form_request(path_and_query: &str, signature: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path_and_query)
        .header(HOST, PUBLIC_HOST)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// POST to the webhook endpoint with an opaque body.
pub fn raw_request(
    path_and_query: &str,
    content_type: &str,
    signature: &str,
    body: &[u8],
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path_and_query)
        .header(HOST, PUBLIC_HOST)
        .header(CONTENT_TYPE, content_type)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_vec()))
        .expect("valid request")
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
