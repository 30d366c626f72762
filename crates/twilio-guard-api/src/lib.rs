//! # Twilio Guard HTTP Service
//!
//! HTTP layer that verifies inbound Twilio webhooks before they reach
//! application handlers.
//!
//! This crate provides:
//! - [`validate_twilio_webhook`], an axum middleware function
//! - [`WebhookRejection`], the error-to-response adapter
//! - A router with a protected webhook endpoint and an open health check
//! - Server start-up with graceful shutdown

pub mod config;
pub mod errors;
pub mod middleware;

pub use config::{LoggingConfig, ServerConfig, ServiceConfig, WebhookConfig};
pub use errors::{ServiceConfigError, ServiceError, WebhookRejection};
pub use middleware::{validate_twilio_webhook, WebhookValidationMiddleware, DEFAULT_MAX_BODY_SIZE};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod lib_tests;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue},
    middleware as axum_middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};

/// Header carrying the per-request correlation ID.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Path of the unauthenticated health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Empty TwiML document: acknowledge the webhook without further instructions.
pub const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Signature verification applied to the webhook route
    pub webhook_validation: Arc<WebhookValidationMiddleware>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, webhook_validation: Arc<WebhookValidationMiddleware>) -> Self {
        Self {
            config,
            webhook_validation,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
///
/// Only the webhook route is guarded; the health check stays reachable for
/// load balancers that cannot sign requests.
pub fn create_router(state: AppState) -> Router {
    // The handler re-reads the verified body, so its extractor limit must
    // match the one the middleware buffered under.
    let webhook_routes = Router::new()
        .route(&state.config.webhooks.endpoint_path, post(handle_twilio_webhook))
        .route_layer(axum_middleware::from_fn_with_state(
            state.webhook_validation.clone(),
            validate_twilio_webhook,
        ))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_size));

    let health_routes = Router::new().route(HEALTH_PATH, get(handle_health_check));

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(
    config: ServiceConfig,
    webhook_validation: WebhookValidationMiddleware,
) -> Result<(), ServiceError> {
    config.validate()?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ServiceConfigError::Invalid {
            message: format!(
                "Invalid bind address {}:{}: {}",
                config.server.host, config.server.port, e
            ),
        })?;

    let webhook_validation =
        Arc::new(webhook_validation.with_max_body_size(config.server.max_body_size));
    let endpoint_path = config.webhooks.endpoint_path.clone();
    let app = create_router(AppState::new(config, webhook_validation));

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!(address = %addr, endpoint = %endpoint_path, "Starting HTTP server");

    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown");
            },
        }
    };

    // In-flight requests complete before the server returns.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Acknowledge a verified Twilio webhook with empty TwiML.
///
/// Runs only after [`validate_twilio_webhook`] accepted the request.
#[instrument(skip(headers, body), fields(body_size = body.len()))]
pub async fn handle_twilio_webhook(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    info!(content_type = %content_type, "Accepted Twilio webhook");

    ([(CONTENT_TYPE, "text/xml")], EMPTY_TWIML).into_response()
}

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Tag each request with a correlation ID and log its outcome.
///
/// Rejected webhooks are already logged by the validation middleware, so
/// client errors here only carry the status.
#[instrument(skip_all, fields(path = %request.uri().path(), correlation_id))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let started = std::time::Instant::now();
    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    if status.is_server_error() {
        error!(status = status.as_u16(), elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        warn!(status = status.as_u16(), elapsed_ms, "Request rejected");
    } else {
        debug!(status = status.as_u16(), elapsed_ms, "Request handled");
    }

    response
}
