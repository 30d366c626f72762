//! # Twilio Guard Core
//!
//! Core logic for verifying that inbound webhook requests were sent by Twilio.
//!
//! This crate contains no HTTP server code. It provides:
//! - Extraction and validation of the `twilio` configuration namespace
//! - The request signature verifier (HMAC-SHA1, base64 encoded)
//! - A REST client factory driven by the same configuration
//! - The error taxonomy shared with the HTTP layer
//!
//! ## Usage
//!
//! ```rust
//! use twilio_guard_core::{RequestValidator, SignedPayload, TwilioConfig};
//!
//! let config = TwilioConfig::new("11111111111111111111111111111111").unwrap();
//! let validator = RequestValidator::new(config.auth_token().clone());
//!
//! let url = "https://example.org/sms?lat=13.4134995";
//! let signature = validator.compute(url, &SignedPayload::Raw(b""));
//! assert!(validator.validate(&signature, url, &SignedPayload::Raw(b"")));
//! ```

pub mod config;
pub mod error;
pub mod rest_client;
pub mod signature;

pub use config::{AuthToken, RestClientConfig, TwilioConfig, CONFIG_NAMESPACE};
pub use error::{ConfigError, RestClientError, WebhookError};
pub use rest_client::RestClient;
pub use signature::{
    compute_body_hash, RequestValidator, SignedPayload, BODY_HASH_PARAM, SIGNATURE_HEADER,
};
