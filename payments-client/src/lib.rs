//! # Payments Client SDK
//!
//! A typed Rust client for the Payments API.

use payments_types::{
    CreatePaymentRequest, ListPaymentsParams, Payment, PaymentId, PaymentMethod,
    PaymentNotification, PaymentPage, PaymentStats,
};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Payments API client.
pub struct PaymentsClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl PaymentsClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http: Client::new(),
        }
    }

    /// Sets the bearer token issued by the auth service.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Creates a payment and returns it with its checkout token.
    pub async fn create_payment(
        &self,
        amount: Decimal,
        currency: &str,
        payment_method: PaymentMethod,
        description: &str,
    ) -> Result<Payment, ClientError> {
        let req = CreatePaymentRequest {
            amount,
            currency: currency.to_string(),
            payment_method,
            description: description.to_string(),
        };
        self.send(self.http.post(self.url("/api/payments")).json(&req))
            .await
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment, ClientError> {
        self.get(&format!("/api/payments/{}", id)).await
    }

    pub async fn get_payment_by_order_id(&self, order_id: &str) -> Result<Payment, ClientError> {
        self.get(&format!("/api/payments/order/{}", order_id)).await
    }

    /// Lists payments visible to the token's owner.
    pub async fn list_payments(
        &self,
        params: &ListPaymentsParams,
    ) -> Result<PaymentPage, ClientError> {
        self.send(self.http.get(self.url("/api/payments")).query(params))
            .await
    }

    pub async fn payment_stats(&self) -> Result<PaymentStats, ClientError> {
        self.get("/api/payments/stats").await
    }

    /// Cancels a pending payment.
    pub async fn cancel_payment(&self, id: PaymentId) -> Result<Payment, ClientError> {
        self.post_empty(&format!("/api/payments/{}/cancel", id))
            .await
    }

    /// Asks the server to reconcile a payment with the gateway.
    pub async fn sync_payment(&self, id: PaymentId) -> Result<Payment, ClientError> {
        self.post_empty(&format!("/api/payments/{}/sync", id)).await
    }

    pub async fn list_notifications(
        &self,
        id: PaymentId,
    ) -> Result<Vec<PaymentNotification>, ClientError> {
        self.get(&format!("/api/payments/{}/notifications", id))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.http.post(self.url(path))).await
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode, header},
        routing::get,
    };
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = PaymentsClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = PaymentsClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_token() {
        let client = PaymentsClient::new("http://localhost:3000").with_token("tok-123");
        assert_eq!(client.token, Some("tok-123".to_string()));
    }

    async fn stats(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some("Bearer tok-123");
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid token", "code": 401 })),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "total_payments": 2,
                "total_amount": 3500.5,
                "pending_count": 1,
                "paid_count": 1,
                "canceled_count": 0,
                "failed_count": 0
            })),
        )
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/api/payments/stats", get(stats));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let base = spawn_stub().await;
        let client = PaymentsClient::new(base).with_token("tok-123");

        let stats = client.payment_stats().await.unwrap();

        assert_eq!(stats.total_payments, 2);
        assert_eq!(stats.total_amount, Decimal::new(35005, 1));
    }

    #[tokio::test]
    async fn test_api_error_carries_server_message() {
        let base = spawn_stub().await;
        let client = PaymentsClient::new(base);

        match client.payment_stats().await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid token");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}
