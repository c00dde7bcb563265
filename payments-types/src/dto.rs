//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{PaymentFilters, PaymentMethod, PaymentStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a payment for the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    /// Positive amount, at most two decimal places
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, example = 100000)]
    pub amount: Decimal,
    /// ISO 4217 code; defaults to IDR when empty
    #[serde(default)]
    #[schema(example = "IDR")]
    pub currency: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    #[schema(example = "Monthly subscription")]
    pub description: String,
}

/// Query-string parameters for listing payments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPaymentsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Page size (default 20, max 100)
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[param(value_type = Option<String>)]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[param(value_type = Option<String>)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Inclusive lower bound on creation time (RFC 3339)
    #[param(value_type = Option<String>)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Inclusive upper bound on creation time (RFC 3339)
    #[param(value_type = Option<String>)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[param(value_type = Option<f64>)]
    pub min_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[param(value_type = Option<f64>)]
    pub max_amount: Option<Decimal>,
}

impl ListPaymentsParams {
    pub fn filters(&self) -> PaymentFilters {
        PaymentFilters {
            status: self.status,
            payment_method: self.payment_method,
            start_date: self.start_date,
            end_date: self.end_date,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Misc responses
// ─────────────────────────────────────────────────────────────────────────────

/// Acknowledgement returned to the gateway for an accepted webhook.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    #[schema(example = "ok")]
    pub status: String,
}

/// Uniform error body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}
