//! Twilio request signature computation and validation.
//!
//! Twilio signs every webhook with HMAC-SHA1 keyed by the account auth token
//! and sends the base64 digest in the [`SIGNATURE_HEADER`] header. The signed
//! bytes depend on the body:
//!
//! - `application/x-www-form-urlencoded` bodies: the full URL followed by each
//!   form parameter as `name` + `value`, sorted by name, with no separators.
//! - Other bodies when the URL carries a `bodySHA256` query parameter: the URL
//!   alone is signed and the body must hash (SHA-256, lowercase hex) to that
//!   parameter.
//! - Other bodies without `bodySHA256`: the URL followed by the raw body bytes.
//!
//! Validation also accepts the URL with the scheme's default port added or
//! any explicit port removed, since Twilio may sign either form.

use crate::config::AuthToken;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Query parameter carrying the SHA-256 of a non-form body.
pub const BODY_HASH_PARAM: &str = "bodySHA256";

/// The request content covered by a signature.
#[derive(Debug, Clone, Copy)]
pub enum SignedPayload<'a> {
    /// Decoded form parameters, in any order.
    Form(&'a [(String, String)]),
    /// Raw body bytes of a non-form request.
    Raw(&'a [u8]),
}

/// Computes and validates Twilio request signatures.
///
/// Immutable after construction and cheap to clone; safe to share between
/// concurrent requests.
#[derive(Clone)]
pub struct RequestValidator {
    auth_token: AuthToken,
}

impl RequestValidator {
    pub fn new(auth_token: AuthToken) -> Self {
        Self { auth_token }
    }

    /// Compute the signature of `url` followed by the sorted form `params`.
    ///
    /// Parameters are ordered by name, then by value for repeated names.
    /// An identical name and value pair is signed once.
    pub fn compute_signature(&self, url: &str, params: &[(String, String)]) -> String {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut mac = self.mac();
        mac.update(url.as_bytes());
        for (name, value) in sorted {
            mac.update(name.as_bytes());
            mac.update(value.as_bytes());
        }

        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Compute the signature Twilio would send for `url` and `payload`.
    pub fn compute(&self, url: &str, payload: &SignedPayload<'_>) -> String {
        match payload {
            SignedPayload::Form(params) => self.compute_signature(url, params),
            SignedPayload::Raw(_) if query_param(url, BODY_HASH_PARAM).is_some() => {
                self.compute_signature(url, &[])
            }
            SignedPayload::Raw(body) => {
                let mut mac = self.mac();
                mac.update(url.as_bytes());
                mac.update(body);
                STANDARD.encode(mac.finalize().into_bytes())
            }
        }
    }

    /// Check `signature` against the expected signature for the request.
    ///
    /// Returns a single boolean; callers cannot tell which part of the
    /// comparison failed. Digest comparisons run in constant time.
    pub fn validate(&self, signature: &str, url: &str, payload: &SignedPayload<'_>) -> bool {
        if let SignedPayload::Raw(body) = payload {
            if let Some(expected_hash) = query_param(url, BODY_HASH_PARAM) {
                if !constant_time_eq(compute_body_hash(body).as_bytes(), expected_hash.as_bytes()) {
                    debug!("Body hash does not match the bodySHA256 query parameter");
                    return false;
                }
            }
        }

        // Every variant is checked so the work done does not depend on which one matches.
        let mut valid = false;
        for candidate in url_variants(url) {
            let expected = self.compute(&candidate, payload);
            valid |= constant_time_eq(expected.as_bytes(), signature.as_bytes());
        }

        valid
    }

    fn mac(&self) -> HmacSha1 {
        HmacSha1::new_from_slice(self.auth_token.expose_secret().as_bytes())
            .expect("HMAC can take a key of any size")
    }
}

impl std::fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidator")
            .field("auth_token", &"<REDACTED>")
            .finish()
    }
}

/// SHA-256 of `body` as lowercase hex, the format of `bodySHA256`.
pub fn compute_body_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

// ============================================================================
// Private helpers
// ============================================================================

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    // Length is not secret.
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let (_, query) = without_fragment.split_once('?')?;

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// The URL as given, plus its default-port and port-less forms where they differ.
fn url_variants(url: &str) -> Vec<String> {
    let mut variants = vec![url.to_string()];

    if let Some(parts) = UrlParts::split(url) {
        for variant in [parts.with_default_port(), parts.without_port()]
            .into_iter()
            .flatten()
        {
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
    }

    variants
}

/// Borrowed pieces of an absolute URL, split without re-encoding anything.
struct UrlParts<'a> {
    scheme: &'a str,
    userinfo: &'a str,
    host: &'a str,
    port: Option<&'a str>,
    rest: &'a str,
}

impl<'a> UrlParts<'a> {
    fn split(url: &'a str) -> Option<Self> {
        let (scheme, after_scheme) = url.split_once("://")?;
        let authority_end = after_scheme
            .find(['/', '?', '#'])
            .unwrap_or(after_scheme.len());
        let (authority, rest) = after_scheme.split_at(authority_end);

        let (userinfo, host_port) = match authority.rfind('@') {
            Some(at) => authority.split_at(at + 1),
            None => ("", authority),
        };

        // A colon inside an IPv6 literal is not a port separator.
        let (host, port) = match host_port.rfind(':') {
            Some(colon) if !host_port[colon..].contains(']') => {
                (&host_port[..colon], Some(&host_port[colon + 1..]))
            }
            _ => (host_port, None),
        };

        if host.is_empty() {
            return None;
        }

        Some(Self {
            scheme,
            userinfo,
            host,
            port,
            rest,
        })
    }

    fn default_port(&self) -> Option<u16> {
        match self.scheme.to_ascii_lowercase().as_str() {
            "https" => Some(443),
            "http" => Some(80),
            _ => None,
        }
    }

    fn with_default_port(&self) -> Option<String> {
        if self.port.is_some() {
            return None;
        }
        let port = self.default_port()?;
        Some(format!(
            "{}://{}{}:{}{}",
            self.scheme, self.userinfo, self.host, port, self.rest
        ))
    }

    fn without_port(&self) -> Option<String> {
        self.port?;
        Some(format!(
            "{}://{}{}{}",
            self.scheme, self.userinfo, self.host, self.rest
        ))
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
