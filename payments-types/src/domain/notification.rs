//! Gateway notifications (webhooks) and their audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::payment::{OrderId, PaymentId};
use super::status::PaymentStatus;
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed view over a raw gateway webhook body.
///
/// Only `order_id` is mandatory; every other field is optional and read as a
/// string when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayNotification {
    pub order_id: OrderId,
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
    pub transaction_id: Option<String>,
    pub status_code: Option<String>,
    pub gross_amount: Option<String>,
    pub signature_key: Option<String>,
}

fn string_field(event: &Map<String, Value>, key: &str) -> Option<String> {
    event.get(key).and_then(Value::as_str).map(str::to_string)
}

impl GatewayNotification {
    pub fn parse(event: &Map<String, Value>) -> Result<Self, DomainError> {
        let order_id = event
            .get("order_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::ValidationError("invalid order_id in notification".into()))?;

        Ok(Self {
            order_id: OrderId::from(order_id),
            transaction_status: string_field(event, "transaction_status"),
            fraud_status: string_field(event, "fraud_status"),
            payment_type: string_field(event, "payment_type"),
            transaction_id: string_field(event, "transaction_id"),
            status_code: string_field(event, "status_code"),
            gross_amount: string_field(event, "gross_amount"),
            signature_key: string_field(event, "signature_key"),
        })
    }

    /// Payment status implied by `transaction_status` (absent maps to PENDING).
    pub fn mapped_status(&self) -> PaymentStatus {
        PaymentStatus::from_transaction_status(self.transaction_status.as_deref().unwrap_or(""))
    }
}

/// One received webhook, stored verbatim for audit. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentNotification {
    pub id: NotificationId,
    pub payment_id: PaymentId,
    pub transaction_status: String,
    pub fraud_status: String,
    pub payment_type: String,
    /// The full webhook body as received
    pub raw_notification: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentNotification {
    pub fn from_event(
        payment_id: PaymentId,
        notification: &GatewayNotification,
        raw: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            payment_id,
            transaction_status: notification.transaction_status.clone().unwrap_or_default(),
            fraud_status: notification.fraud_status.clone().unwrap_or_default(),
            payment_type: notification.payment_type.clone().unwrap_or_default(),
            raw_notification: Value::Object(raw.clone()).to_string(),
            created_at: now,
        }
    }

    /// Reconstructs a notification from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: NotificationId,
        payment_id: PaymentId,
        transaction_status: String,
        fraud_status: String,
        payment_type: String,
        raw_notification: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            payment_id,
            transaction_status,
            fraud_status,
            payment_type,
            raw_notification,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_requires_string_order_id() {
        let missing = event(json!({ "transaction_status": "settlement" }));
        let numeric = event(json!({ "order_id": 42 }));

        assert!(GatewayNotification::parse(&missing).is_err());
        assert!(GatewayNotification::parse(&numeric).is_err());
    }

    #[test]
    fn test_parse_ignores_non_string_fields() {
        let raw = event(json!({
            "order_id": "PAY-1-abc",
            "transaction_status": "settlement",
            "gross_amount": 100000,
        }));

        let parsed = GatewayNotification::parse(&raw).unwrap();

        assert_eq!(parsed.order_id.as_str(), "PAY-1-abc");
        assert_eq!(parsed.mapped_status(), PaymentStatus::Paid);
        assert_eq!(parsed.gross_amount, None);
    }

    #[test]
    fn test_missing_status_maps_to_pending() {
        let raw = event(json!({ "order_id": "PAY-1-abc" }));
        let parsed = GatewayNotification::parse(&raw).unwrap();
        assert_eq!(parsed.mapped_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_record_keeps_raw_payload() {
        let raw = event(json!({
            "order_id": "PAY-1-abc",
            "transaction_status": "capture",
            "fraud_status": "accept",
            "custom_field": { "nested": true },
        }));
        let parsed = GatewayNotification::parse(&raw).unwrap();

        let record = PaymentNotification::from_event(PaymentId::new(), &parsed, &raw, Utc::now());

        assert_eq!(record.transaction_status, "capture");
        assert_eq!(record.fraud_status, "accept");
        assert_eq!(record.payment_type, "");
        let stored: Value = serde_json::from_str(&record.raw_notification).unwrap();
        assert_eq!(stored, Value::Object(raw));
    }
}
