//! Shared fixtures for the HTTP integration tests.
//!
//! The remote collaborators are replaced by in-process stubs; the store is an
//! in-memory SQLite database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;

use payments_hex::{LifecycleSettings, PaymentService, inbound::HttpServer};
use payments_repo::SqliteRepo;
use payments_types::{
    AuthorityService, CREATE_PAYMENT, CallerIdentity, CheckoutRequest, CheckoutSession,
    GatewayTransactionStatus, OrderId, PaymentGateway, PermissionCheck, READ_ALL_PAYMENTS,
    UPDATE_PAYMENT, UpstreamError, UserDirectory, UserId, UserProfile,
};

pub const USER_TOKEN: &str = "tok-user";
pub const OTHER_TOKEN: &str = "tok-other";
pub const ADMIN_TOKEN: &str = "tok-admin";
pub const READONLY_TOKEN: &str = "tok-readonly";
pub const AUDITOR_TOKEN: &str = "tok-auditor";
pub const DOWN_TOKEN: &str = "tok-authority-down";
/// Validates, but the targeted permission check answers 403
pub const SUSPENDED_TOKEN: &str = "tok-suspended";
/// Validates, but the targeted permission check answers 401
pub const REVOKED_TOKEN: &str = "tok-revoked";

/// Authority service that knows a fixed set of tokens.
pub struct StubAuthority {
    callers: HashMap<String, CallerIdentity>,
    /// Tokens granted `payments:read_all` by the targeted permission check
    auditors: Vec<String>,
}

#[async_trait]
impl AuthorityService for StubAuthority {
    async fn validate(&self, bearer_token: &str) -> Result<Option<CallerIdentity>, UpstreamError> {
        if bearer_token == DOWN_TOKEN {
            return Err(UpstreamError::Transport {
                service: "auth-service",
                message: "connection refused".into(),
            });
        }
        Ok(self.callers.get(bearer_token).cloned())
    }

    async fn check_permission(
        &self,
        bearer_token: &str,
        resource: &str,
        action: &str,
    ) -> Result<PermissionCheck, UpstreamError> {
        let status = match bearer_token {
            SUSPENDED_TOKEN => Some(403),
            REVOKED_TOKEN => Some(401),
            token if !self.callers.contains_key(token) => Some(401),
            _ => None,
        };
        if let Some(status) = status {
            return Err(UpstreamError::Denied {
                service: "auth-service",
                status,
            });
        }
        let caller = &self.callers[bearer_token];
        Ok(PermissionCheck {
            has_permission: resource == "payments"
                && action == "read_all"
                && self.auditors.iter().any(|t| t == bearer_token),
            user_id: caller.user_id,
            role: caller.role.clone(),
        })
    }
}

pub struct StubDirectory {
    users: HashMap<UserId, UserProfile>,
}

#[async_trait]
impl UserDirectory for StubDirectory {
    async fn get_user(&self, user_id: UserId) -> Result<UserProfile, UpstreamError> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or(UpstreamError::UserNotFound)
    }
}

/// Gateway that issues tokens derived from the order id.
pub struct StubGateway {
    pub remote: Mutex<GatewayTransactionStatus>,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_checkout(
        &self,
        req: &CheckoutRequest,
    ) -> Result<CheckoutSession, UpstreamError> {
        Ok(CheckoutSession {
            token: format!("snap-{}", req.order_id),
            redirect_url: format!(
                "https://app.sandbox.midtrans.com/snap/v4/redirection/{}",
                req.order_id
            ),
        })
    }

    async fn transaction_status(
        &self,
        order_id: &OrderId,
    ) -> Result<GatewayTransactionStatus, UpstreamError> {
        let mut remote = self.remote.lock().unwrap().clone();
        remote.order_id = order_id.to_string();
        Ok(remote)
    }
}

pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<StubGateway>,
    pub user_id: UserId,
    pub other_id: UserId,
}

fn caller(user_id: UserId, role: &str, permissions: &[&str]) -> CallerIdentity {
    CallerIdentity {
        user_id,
        email: format!("{}@example.com", role),
        role: role.to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    }
}

fn profile(id: UserId, first_name: &str) -> UserProfile {
    UserProfile {
        id,
        email: format!("{}@example.com", first_name.to_lowercase()),
        first_name: first_name.to_string(),
        last_name: "Test".to_string(),
        phone: "+628123456789".to_string(),
        role: "user".to_string(),
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Builds the full router over an in-memory store.
pub async fn test_app(settings: LifecycleSettings, requests_per_minute: u32) -> TestApp {
    let user_id = UserId::new();
    let other_id = UserId::new();
    let admin_id = UserId::new();

    let mut callers = HashMap::new();
    callers.insert(
        USER_TOKEN.to_string(),
        caller(user_id, "user", &[CREATE_PAYMENT, UPDATE_PAYMENT]),
    );
    callers.insert(
        OTHER_TOKEN.to_string(),
        caller(other_id, "user", &[CREATE_PAYMENT, UPDATE_PAYMENT]),
    );
    callers.insert(
        ADMIN_TOKEN.to_string(),
        caller(admin_id, "admin", &[READ_ALL_PAYMENTS]),
    );
    callers.insert(READONLY_TOKEN.to_string(), caller(user_id, "viewer", &[]));
    callers.insert(AUDITOR_TOKEN.to_string(), caller(other_id, "auditor", &[]));
    callers.insert(SUSPENDED_TOKEN.to_string(), caller(user_id, "user", &[]));
    callers.insert(REVOKED_TOKEN.to_string(), caller(user_id, "user", &[]));
    let authority = Arc::new(StubAuthority {
        callers,
        auditors: vec![AUDITOR_TOKEN.to_string()],
    });

    let mut users = HashMap::new();
    users.insert(user_id, profile(user_id, "Budi"));
    users.insert(other_id, profile(other_id, "Sari"));

    let gateway = Arc::new(StubGateway {
        remote: Mutex::new(GatewayTransactionStatus::default()),
    });

    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let service = PaymentService::new(
        repo,
        Arc::new(StubDirectory { users }),
        gateway.clone(),
        settings,
    );
    let server = HttpServer::with_rate_limit(service, authority, requests_per_minute);

    TestApp {
        router: server.router(),
        gateway,
        user_id,
        other_id,
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Creates a payment as the default user and returns its JSON.
pub async fn create_payment(app: &Router, amount: &str) -> serde_json::Value {
    let body = format!(
        r#"{{"amount": {}, "currency": "IDR", "payment_method": "BANK_TRANSFER", "description": "Course fee"}}"#,
        amount
    );
    let response = send(
        app,
        request(Method::POST, "/api/payments", Some(USER_TOKEN), Some(&body)),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    json_body(response).await
}
