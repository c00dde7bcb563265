//! Integration tests for rate limiting middleware.
//!
//! These tests verify the HTTP-level behavior of rate limiting,
//! including 429 responses and proper integration with the middleware stack.

mod common;

use axum::http::{Method, StatusCode};

use common::*;
use payments_hex::LifecycleSettings;

fn list_request(token: &str) -> axum::http::Request<axum::body::Body> {
    request(Method::GET, "/api/payments", Some(token), None)
}

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    let app = test_app(LifecycleSettings::default(), 3).await;

    for i in 1..=3 {
        let response = send(&app.router, list_request(USER_TOKEN)).await;
        assert_ne!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS,
            "Request {} should not be rate limited (quota not yet exceeded)",
            i
        );
    }

    let response = send(&app.router, list_request(USER_TOKEN)).await;
    assert_eq!(
        response.status(),
        StatusCode::TOO_MANY_REQUESTS,
        "Request should be rate limited after exceeding quota"
    );

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("application/json"));

    let json = json_body(response).await;
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("Rate limit exceeded")
    );
    assert_eq!(json["code"], 429);
    assert_eq!(json["retry_after_seconds"], 60);
}

#[tokio::test]
async fn test_rate_limiting_public_routes_bypassed() {
    let app = test_app(LifecycleSettings::default(), 1).await;

    for _ in 0..10 {
        let response = send(&app.router, request(Method::GET, "/health", None, None)).await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Health endpoint should not be rate limited"
        );
    }

    // Gateway deliveries are never throttled; unknown orders answer 500.
    let body = r#"{"order_id": "PAY-1-00000000", "transaction_status": "settlement"}"#;
    for _ in 0..3 {
        let response = send(
            &app.router,
            request(Method::POST, "/api/webhooks/midtrans", None, Some(body)),
        )
        .await;
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

#[tokio::test]
async fn test_rate_limiting_per_token_isolation() {
    let app = test_app(LifecycleSettings::default(), 1).await;

    let response = send(&app.router, list_request(USER_TOKEN)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app.router, list_request(USER_TOKEN)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = send(&app.router, list_request(OTHER_TOKEN)).await;
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Each token should have its own quota"
    );
}
