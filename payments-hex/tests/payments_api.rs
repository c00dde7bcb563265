//! End-to-end tests of the REST surface over an in-memory SQLite store.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;
use payments_hex::LifecycleSettings;
use payments_hex::outbound::signature::notification_signature;

async fn app() -> TestApp {
    test_app(LifecycleSettings::default(), 1000).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = app().await;

    let response = send(&app.router, request(Method::GET, "/health", None, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_missing_and_malformed_credentials_are_401() {
    let app = app().await;

    let response = send(&app.router, request(Method::GET, "/api/payments", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Authorization header required");
    assert_eq!(json["code"], 401);

    let req = axum::http::Request::builder()
        .uri("/api/payments")
        .header("Authorization", "Token abc")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app.router, req).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid authorization header format"
    );
}

#[tokio::test]
async fn test_unknown_token_is_401() {
    let app = app().await;

    let response = send(
        &app.router,
        request(Method::GET, "/api/payments", Some("tok-nobody"), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid token");
}

#[tokio::test]
async fn test_unreachable_authority_is_502() {
    let app = app().await;

    let response = send(
        &app.router,
        request(Method::GET, "/api/payments", Some(DOWN_TOKEN), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let app = app().await;

    let response = send(
        &app.router,
        request(Method::GET, "/api-docs/openapi.json", None, None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/api/payments"].is_object());
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_fetch_payment() {
    let app = app().await;

    let created = create_payment(&app.router, "100000").await;
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["currency"], "IDR");
    assert_eq!(created["amount"], 100000.0);
    assert_eq!(created["user_id"], app.user_id.to_string());
    let order_id = created["order_id"].as_str().unwrap().to_string();
    assert_eq!(created["gateway_token"], format!("snap-{}", order_id));

    let id = created["id"].as_str().unwrap();
    let response = send(
        &app.router,
        request(
            Method::GET,
            &format!("/api/payments/{}", id),
            Some(USER_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["order_id"], order_id);

    let response = send(
        &app.router,
        request(
            Method::GET,
            &format!("/api/payments/order/{}", order_id),
            Some(USER_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["id"], id);
}

#[tokio::test]
async fn test_create_requires_permission() {
    let app = app().await;

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/payments",
            Some(READONLY_TOKEN),
            Some(r#"{"amount": 1000, "payment_method": "E_WALLET"}"#),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], 403);
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let app = app().await;

    for body in [
        r#"{"amount": 0, "payment_method": "E_WALLET"}"#,
        r#"{"amount": -10, "payment_method": "E_WALLET"}"#,
        r#"{"amount": 1000, "payment_method": "CASH"}"#,
        r#"{"amount": "#,
    ] {
        let response = send(
            &app.router,
            request(Method::POST, "/api/payments", Some(USER_TOKEN), Some(body)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
    }
}

#[tokio::test]
async fn test_other_users_payment_is_forbidden_but_admin_can_read() {
    let app = app().await;
    let created = create_payment(&app.router, "5000").await;
    let uri = format!("/api/payments/{}", created["id"].as_str().unwrap());

    let response = send(&app.router, request(Method::GET, &uri, Some(OTHER_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app.router, request(Method::GET, &uri, Some(ADMIN_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_and_unknown_ids() {
    let app = app().await;

    let response = send(
        &app.router,
        request(Method::GET, "/api/payments/not-a-uuid", Some(USER_TOKEN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app.router,
        request(
            Method::GET,
            &format!("/api/payments/{}", uuid::Uuid::new_v4()),
            Some(USER_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_is_scoped_to_caller() {
    let app = app().await;
    for amount in ["1000", "2000", "3000"] {
        create_payment(&app.router, amount).await;
    }

    let response = send(
        &app.router,
        request(Method::GET, "/api/payments?limit=2", Some(USER_TOKEN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json_body(response).await;
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["edges"].as_array().unwrap().len(), 2);
    assert_eq!(page["has_next_page"], true);
    assert_eq!(page["has_previous_page"], false);

    let response = send(
        &app.router,
        request(Method::GET, "/api/payments", Some(OTHER_TOKEN), None),
    )
    .await;
    assert_eq!(json_body(response).await["total_count"], 0);

    let response = send(
        &app.router,
        request(Method::GET, "/api/payments", Some(ADMIN_TOKEN), None),
    )
    .await;
    assert_eq!(json_body(response).await["total_count"], 3);
}

#[tokio::test]
async fn test_listing_filters_by_amount() {
    let app = app().await;
    for amount in ["1000", "2000", "3000"] {
        create_payment(&app.router, amount).await;
    }

    let response = send(
        &app.router,
        request(
            Method::GET,
            "/api/payments?min_amount=1500&max_amount=3000&status=PENDING",
            Some(USER_TOKEN),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total_count"], 2);
}

#[tokio::test]
async fn test_invalid_filter_is_400() {
    let app = app().await;

    let response = send(
        &app.router,
        request(
            Method::GET,
            "/api/payments?status=SETTLED",
            Some(USER_TOKEN),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_for_caller() {
    let app = app().await;
    create_payment(&app.router, "1000").await;
    create_payment(&app.router, "2500.50").await;

    let response = send(
        &app.router,
        request(Method::GET, "/api/payments/stats", Some(USER_TOKEN), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["total_payments"], 2);
    assert_eq!(stats["pending_count"], 2);
    assert_eq!(stats["total_amount"], 3500.5);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancel_flow() {
    let app = app().await;
    let created = create_payment(&app.router, "1000").await;
    let uri = format!("/api/payments/{}/cancel", created["id"].as_str().unwrap());

    let response = send(&app.router, request(Method::POST, &uri, Some(OTHER_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app.router, request(Method::POST, &uri, Some(USER_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "CANCELED");

    let response = send(&app.router, request(Method::POST, &uri, Some(USER_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_requires_update_permission() {
    let app = app().await;
    let created = create_payment(&app.router, "1000").await;
    let uri = format!("/api/payments/{}/cancel", created["id"].as_str().unwrap());

    let response = send(
        &app.router,
        request(Method::POST, &uri, Some(READONLY_TOKEN), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook and reconciliation
// ─────────────────────────────────────────────────────────────────────────────

fn notification(order_id: &str, transaction_status: &str) -> serde_json::Value {
    json!({
        "order_id": order_id,
        "transaction_status": transaction_status,
        "fraud_status": "accept",
        "payment_type": "bank_transfer",
        "transaction_id": "tx-42",
        "status_code": "200",
        "gross_amount": "1000.00"
    })
}

#[tokio::test]
async fn test_webhook_settles_payment_and_keeps_audit_trail() {
    let app = app().await;
    let created = create_payment(&app.router, "1000").await;
    let id = created["id"].as_str().unwrap();
    let order_id = created["order_id"].as_str().unwrap();

    let body = notification(order_id, "settlement").to_string();
    let response = send(
        &app.router,
        request(Method::POST, "/api/webhooks/midtrans", None, Some(&body)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");

    let response = send(
        &app.router,
        request(
            Method::GET,
            &format!("/api/payments/{}", id),
            Some(USER_TOKEN),
            None,
        ),
    )
    .await;
    let payment = json_body(response).await;
    assert_eq!(payment["status"], "PAID");
    assert_eq!(payment["transaction_id"], "tx-42");

    // A late expiry does not reopen a settled payment.
    let body = notification(order_id, "expire").to_string();
    let response = send(
        &app.router,
        request(Method::POST, "/api/webhooks/midtrans", None, Some(&body)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app.router,
        request(
            Method::GET,
            &format!("/api/payments/{}/notifications", id),
            Some(ADMIN_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let history = json_body(response).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["transaction_status"], "settlement");
    assert_eq!(history[1]["transaction_status"], "expire");

    let response = send(
        &app.router,
        request(
            Method::GET,
            &format!("/api/payments/{}", id),
            Some(USER_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(json_body(response).await["status"], "PAID");
}

#[tokio::test]
async fn test_webhook_error_mapping() {
    let app = app().await;

    let response = send(
        &app.router,
        request(Method::POST, "/api/webhooks/midtrans", None, Some("not json")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/webhooks/midtrans",
            None,
            Some(r#"{"transaction_status": "settlement"}"#),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown orders answer 500 so the gateway retries.
    let body = notification("PAY-1-00000000", "settlement").to_string();
    let response = send(
        &app.router,
        request(Method::POST, "/api/webhooks/midtrans", None, Some(&body)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_webhook_signature_enforced_when_configured() {
    let settings = LifecycleSettings {
        webhook_server_key: Some("SB-Mid-server-test".into()),
        ..LifecycleSettings::default()
    };
    let app = test_app(settings, 1000).await;
    let created = create_payment(&app.router, "1000").await;
    let order_id = created["order_id"].as_str().unwrap();

    let unsigned = notification(order_id, "settlement").to_string();
    let response = send(
        &app.router,
        request(Method::POST, "/api/webhooks/midtrans", None, Some(&unsigned)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut signed = notification(order_id, "settlement");
    signed["signature_key"] = json!(notification_signature(
        order_id,
        "200",
        "1000.00",
        "SB-Mid-server-test"
    ));
    let response = send(
        &app.router,
        request(
            Method::POST,
            "/api/webhooks/midtrans",
            None,
            Some(&signed.to_string()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_notification_history_permissions() {
    let app = app().await;
    let created = create_payment(&app.router, "1000").await;
    let uri = format!(
        "/api/payments/{}/notifications",
        created["id"].as_str().unwrap()
    );

    // Owners without the audit grant are refused.
    let response = send(&app.router, request(Method::GET, &uri, Some(USER_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Granted through the authority's targeted check.
    let response = send(
        &app.router,
        request(Method::GET, &uri, Some(AUDITOR_TOKEN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_notification_history_relays_authority_refusals() {
    let app = app().await;
    let created = create_payment(&app.router, "1000").await;
    let uri = format!(
        "/api/payments/{}/notifications",
        created["id"].as_str().unwrap()
    );

    let response = send(
        &app.router,
        request(Method::GET, &uri, Some(SUSPENDED_TOKEN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], 403);

    let response = send(
        &app.router,
        request(Method::GET, &uri, Some(REVOKED_TOKEN), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], 401);
}

#[tokio::test]
async fn test_sync_pulls_gateway_status() {
    let app = app().await;
    let created = create_payment(&app.router, "1000").await;
    {
        let mut remote = app.gateway.remote.lock().unwrap();
        remote.transaction_status = "expire".to_string();
        remote.transaction_id = "tx-77".to_string();
    }

    let uri = format!("/api/payments/{}/sync", created["id"].as_str().unwrap());
    let response = send(&app.router, request(Method::POST, &uri, Some(OTHER_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app.router, request(Method::POST, &uri, Some(USER_TOKEN), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payment = json_body(response).await;
    assert_eq!(payment["status"], "EXPIRED");
    assert_eq!(payment["transaction_id"], "tx-77");

    // Reconciling needs read access only; update_payment is not required.
    for token in [READONLY_TOKEN, ADMIN_TOKEN] {
        let response = send(&app.router, request(Method::POST, &uri, Some(token), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "EXPIRED");
    }
}
