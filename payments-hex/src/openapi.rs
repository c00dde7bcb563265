//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use payments_types::domain::{
    NotificationId, OrderId, Payment, PaymentId, PaymentMethod, PaymentNotification, PaymentPage,
    PaymentStats, PaymentStatus, UserId,
};
use payments_types::dto::{CreatePaymentRequest, ErrorResponse, ListPaymentsParams, WebhookAck};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

// Stand-ins for the real handlers, used only for path generation.

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Create a payment and open a hosted checkout
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "payments",
    request_body = CreatePaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment created with checkout token", body = Payment),
        (status = 400, description = "Invalid amount or request body", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing create_payment permission or inactive user", body = ErrorResponse),
        (status = 502, description = "User service or gateway failure", body = ErrorResponse)
    )
)]
async fn create_payment() {}

/// List payments, newest first
///
/// Callers without `read_all_payments` only see their own payments.
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "payments",
    params(ListPaymentsParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One page of payments", body = PaymentPage),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
async fn list_payments() {}

/// Aggregate payment counts and amounts
#[utoipa::path(
    get,
    path = "/api/payments/stats",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment statistics", body = PaymentStats),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
async fn payment_stats() {}

/// Get payment by ID
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = PaymentId, Path, description = "Payment ID (UUID)")
    ),
    responses(
        (status = 200, description = "Payment details", body = Payment),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    )
)]
async fn get_payment() {}

/// Get payment by gateway order ID
#[utoipa::path(
    get,
    path = "/api/payments/order/{order_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("order_id" = OrderId, Path, description = "Gateway order ID, e.g. PAY-1718000000-1a2b3c4d")
    ),
    responses(
        (status = 200, description = "Payment details", body = Payment),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    )
)]
async fn get_payment_by_order_id() {}

/// Cancel a pending payment
#[utoipa::path(
    post,
    path = "/api/payments/{id}/cancel",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = PaymentId, Path, description = "Payment ID (UUID)")
    ),
    responses(
        (status = 200, description = "Payment canceled", body = Payment),
        (status = 403, description = "Missing update_payment permission", body = ErrorResponse),
        (status = 404, description = "No such payment owned by the caller", body = ErrorResponse),
        (status = 409, description = "Payment is not pending", body = ErrorResponse)
    )
)]
async fn cancel_payment() {}

/// Refresh a payment from the gateway
#[utoipa::path(
    post,
    path = "/api/payments/{id}/sync",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = PaymentId, Path, description = "Payment ID (UUID)")
    ),
    responses(
        (status = 200, description = "Payment after reconciliation", body = Payment),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 502, description = "Gateway failure", body = ErrorResponse)
    )
)]
async fn sync_payment() {}

/// Notification history of a payment
#[utoipa::path(
    get,
    path = "/api/payments/{id}/notifications",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = PaymentId, Path, description = "Payment ID (UUID)")
    ),
    responses(
        (status = 200, description = "Notifications, oldest first", body = Vec<PaymentNotification>),
        (status = 403, description = "Missing read_all_payments permission", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    )
)]
async fn list_notifications() {}

/// Midtrans payment notification
#[utoipa::path(
    post,
    path = "/api/webhooks/midtrans",
    tag = "webhooks",
    request_body(content = inline(serde_json::Value), description = "Raw gateway notification"),
    responses(
        (status = 200, description = "Notification accepted", body = WebhookAck),
        (status = 400, description = "Malformed notification", body = ErrorResponse),
        (status = 401, description = "Invalid signature", body = ErrorResponse),
        (status = 500, description = "Processing failed; the gateway retries", body = ErrorResponse)
    )
)]
async fn midtrans_webhook() {}

/// OpenAPI documentation for the Payments API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payments Service API",
        version = "1.0.0",
        description = "Payment creation through the Midtrans hosted checkout, with status reconciliation from gateway notifications.\n\n## Authentication\n\nEndpoints other than health, docs and the gateway webhook require a bearer token issued by the auth service:\n\n```\nAuthorization: Bearer <token>\n```",
        license(name = "MIT"),
    ),
    paths(
        health,
        create_payment,
        list_payments,
        payment_stats,
        get_payment,
        get_payment_by_order_id,
        cancel_payment,
        sync_payment,
        list_notifications,
        midtrans_webhook,
    ),
    components(
        schemas(
            Payment,
            PaymentPage,
            PaymentStats,
            PaymentNotification,
            PaymentStatus,
            PaymentMethod,
            PaymentId,
            NotificationId,
            OrderId,
            UserId,
            CreatePaymentRequest,
            WebhookAck,
            ErrorResponse,
        )
    ),

    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "payments", description = "Payment lifecycle operations"),
        (name = "webhooks", description = "Gateway callbacks"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for Bearer token authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
