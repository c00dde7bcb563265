//! Midtrans payment gateway adapter (Snap checkout + Core API status).

use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use payments_types::{
    CheckoutRequest, CheckoutSession, CustomerDetails, GatewayTransactionStatus, OrderId,
    PaymentGateway, UpstreamError,
};

const SERVICE: &str = "midtrans";

/// Which Midtrans deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MidtransEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl MidtransEnvironment {
    pub fn snap_base_url(&self) -> &'static str {
        match self {
            MidtransEnvironment::Sandbox => "https://app.sandbox.midtrans.com",
            MidtransEnvironment::Production => "https://app.midtrans.com",
        }
    }

    pub fn api_base_url(&self) -> &'static str {
        match self {
            MidtransEnvironment::Sandbox => "https://api.sandbox.midtrans.com",
            MidtransEnvironment::Production => "https://api.midtrans.com",
        }
    }
}

impl FromStr for MidtransEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(MidtransEnvironment::Sandbox),
            "production" => Ok(MidtransEnvironment::Production),
            other => Err(format!(
                "unknown Midtrans environment '{}', expected sandbox or production",
                other
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    credit_card: CreditCard,
    customer_details: &'a CustomerDetails,
    item_details: Vec<SnapItem<'a>>,
    callbacks: Callbacks<'a>,
}

#[derive(Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    gross_amount: Decimal,
}

#[derive(Serialize)]
struct CreditCard {
    secure: bool,
}

#[derive(Serialize)]
struct SnapItem<'a> {
    id: &'a str,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    price: Decimal,
    quantity: u32,
    name: &'a str,
}

#[derive(Serialize)]
struct Callbacks<'a> {
    finish: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct SnapResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    redirect_url: String,
    #[serde(default)]
    error_messages: Vec<String>,
}

impl<'a> From<&'a CheckoutRequest> for SnapRequest<'a> {
    fn from(req: &'a CheckoutRequest) -> Self {
        Self {
            transaction_details: TransactionDetails {
                order_id: req.order_id.as_str(),
                gross_amount: req.gross_amount,
            },
            credit_card: CreditCard { secure: true },
            customer_details: &req.customer,
            item_details: req
                .items
                .iter()
                .map(|item| SnapItem {
                    id: &item.id,
                    price: item.price,
                    quantity: item.quantity,
                    name: &item.name,
                })
                .collect(),
            callbacks: Callbacks {
                finish: &req.callback_url,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────────────────────────────────────

/// `PaymentGateway` backed by Midtrans, authenticated with the server key.
pub struct MidtransGateway {
    snap_base_url: String,
    api_base_url: String,
    server_key: String,
    http: Client,
}

impl MidtransGateway {
    pub fn new(
        server_key: impl Into<String>,
        environment: MidtransEnvironment,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Self::with_base_urls(
            server_key,
            environment.snap_base_url(),
            environment.api_base_url(),
            timeout,
        )
    }

    /// Points the adapter at explicit Snap and Core API hosts.
    pub fn with_base_urls(
        server_key: impl Into<String>,
        snap_base_url: impl Into<String>,
        api_base_url: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            snap_base_url: super::trim_base_url(snap_base_url.into()),
            api_base_url: super::trim_base_url(api_base_url.into()),
            server_key: server_key.into(),
            http: super::build_client(timeout)?,
        })
    }

    fn transport(err: reqwest::Error) -> UpstreamError {
        tracing::error!("Failed to reach {}: {}", SERVICE, err);
        UpstreamError::Transport {
            service: SERVICE,
            message: err.to_string(),
        }
    }

    fn decode(err: reqwest::Error) -> UpstreamError {
        UpstreamError::Decode {
            service: SERVICE,
            message: err.to_string(),
        }
    }

    /// Non-2xx: a Snap error body becomes `Rejected`, anything else `Status`.
    async fn rejection(resp: Response) -> UpstreamError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<SnapResponse>(&body) {
            Ok(parsed) if !parsed.error_messages.is_empty() => UpstreamError::Rejected {
                service: SERVICE,
                message: parsed.error_messages.join("; "),
            },
            _ => UpstreamError::Status {
                service: SERVICE,
                status,
            },
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MidtransGateway {
    async fn create_checkout(
        &self,
        req: &CheckoutRequest,
    ) -> Result<CheckoutSession, UpstreamError> {
        let resp = self
            .http
            .post(format!("{}/snap/v1/transactions", self.snap_base_url))
            .basic_auth(&self.server_key, None::<&str>)
            .json(&SnapRequest::from(req))
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        let body: SnapResponse = resp.json().await.map_err(Self::decode)?;
        if body.token.is_empty() {
            return Err(UpstreamError::Rejected {
                service: SERVICE,
                message: if body.error_messages.is_empty() {
                    "checkout response carried no token".to_string()
                } else {
                    body.error_messages.join("; ")
                },
            });
        }

        Ok(CheckoutSession {
            token: body.token,
            redirect_url: body.redirect_url,
        })
    }

    async fn transaction_status(
        &self,
        order_id: &OrderId,
    ) -> Result<GatewayTransactionStatus, UpstreamError> {
        let resp = self
            .http
            .get(format!("{}/v2/{}/status", self.api_base_url, order_id))
            .basic_auth(&self.server_key, None::<&str>)
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        let status: GatewayTransactionStatus = resp.json().await.map_err(Self::decode)?;

        // The Core API answers 200 with an error code in the body for unknown orders.
        if status.transaction_status.is_empty() && !status.status_code.starts_with('2') {
            return Err(UpstreamError::Rejected {
                service: SERVICE,
                message: status.status_message,
            });
        }

        Ok(status)
    }
}
