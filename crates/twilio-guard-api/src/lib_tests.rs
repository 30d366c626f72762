//! Tests for the router, handlers and request logging middleware

use super::*;
use axum::{
    body::Body,
    http::{header::HOST, Request, StatusCode},
};
use tower::ServiceExt; // For `oneshot`
use twilio_guard_core::{TwilioConfig, SIGNATURE_HEADER};

const AUTH_TOKEN: &str = "11111111111111111111111111111111";

fn test_state() -> AppState {
    let guard = WebhookValidationMiddleware::new(TwilioConfig::new(AUTH_TOKEN).unwrap());
    AppState::new(ServiceConfig::default(), Arc::new(guard))
}

fn form_signature(url: &str, params: &[(&str, &str)]) -> String {
    let owned: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    test_state()
        .webhook_validation
        .validator()
        .compute_signature(url, &owned)
}

#[tokio::test]
async fn test_health_check_is_not_guarded() {
    // Arrange
    let app = create_router(test_state());
    let request = Request::builder()
        .uri(HEALTH_PATH)
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_signed_webhook_returns_twiml() {
    // Arrange
    let app = create_router(test_state());
    let signature = form_signature(
        "https://hooks.example.org/webhooks/twilio",
        &[("Body", "Ahoy"), ("MessageSid", "SM123")],
    );
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/twilio")
        .header(HOST, "hooks.example.org")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from("MessageSid=SM123&Body=Ahoy"))
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/xml");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], EMPTY_TWIML.as_bytes());
}

#[tokio::test]
async fn test_unsigned_webhook_rejected_with_bad_request() {
    // Arrange
    let app = create_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/twilio")
        .header(HOST, "hooks.example.org")
        .body(Body::from("MessageSid=SM123"))
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tampered_webhook_rejected_with_forbidden() {
    // Arrange
    let app = create_router(test_state());
    let signature = form_signature(
        "https://hooks.example.org/webhooks/twilio",
        &[("Body", "Ahoy")],
    );
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/twilio")
        .header(HOST, "hooks.example.org")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from("Body=Ahoy%21"))
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    // Arrange
    let app = create_router(test_state());
    let request = Request::builder()
        .uri(HEALTH_PATH)
        .header("x-correlation-id", "test-correlation-123")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(
        response.headers().get("x-correlation-id").unwrap(),
        "test-correlation-123"
    );
}

#[tokio::test]
async fn test_correlation_id_generated_if_missing() {
    // Arrange
    let app = create_router(test_state());
    let request = Request::builder()
        .uri(HEALTH_PATH)
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    let correlation_id = response.headers().get("x-correlation-id");
    assert!(correlation_id.is_some());
    assert!(!correlation_id.unwrap().is_empty());
}

#[tokio::test]
async fn test_start_server_rejects_invalid_config() {
    let mut config = ServiceConfig::default();
    config.webhooks.endpoint_path = "no-leading-slash".to_string();
    let guard = WebhookValidationMiddleware::new(TwilioConfig::new(AUTH_TOKEN).unwrap());

    let result = start_server(config, guard).await;

    assert!(matches!(result, Err(ServiceError::Configuration(_))));
}

#[tokio::test]
async fn test_empty_correlation_id_is_replaced() {
    // Arrange
    let app = create_router(test_state());
    let request = Request::builder()
        .uri(HEALTH_PATH)
        .header(CORRELATION_ID_HEADER, "")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    let correlation_id = response.headers().get(CORRELATION_ID_HEADER).unwrap();
    assert!(!correlation_id.is_empty());
}
