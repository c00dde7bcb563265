//! Payment domain model.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::identity::UserId;
use super::status::{PaymentMethod, PaymentStatus};
use crate::error::DomainError;

/// Currency applied when a request leaves it empty.
pub const DEFAULT_CURRENCY: &str = "IDR";

/// How long a checkout stays payable after creation.
pub const PAYMENT_EXPIRY_HOURS: i64 = 24;

/// Amounts are persisted in hundredths of the currency unit.
const MINOR_UNIT_SCALE: u32 = 2;

/// Unique identifier for a Payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Creates a new random PaymentId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PaymentId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PaymentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Order identifier shared with the payment gateway.
///
/// Assigned once at creation and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generates `PAY-<unix seconds>-<8 random hex chars>`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("PAY-{}-{}", now.timestamp(), &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a decimal amount into persisted minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64, DomainError> {
    if amount.normalize().scale() > MINOR_UNIT_SCALE {
        return Err(DomainError::ValidationError(
            "Amount cannot have more than two decimal places".into(),
        ));
    }
    (amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| DomainError::ValidationError("Amount is out of range".into()))
}

/// Converts persisted minor units back into a decimal amount.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE).normalize()
}

/// A payment tracked through its checkout lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: PaymentId,
    /// Owning user
    pub user_id: UserId,
    #[schema(value_type = String, example = "PAY-1718000000-1a2b3c4d")]
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 100000)]
    pub amount: Decimal,
    #[schema(example = "IDR")]
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub description: String,
    /// Hosted checkout token issued by the gateway
    pub gateway_token: Option<String>,
    /// Hosted checkout page
    pub gateway_redirect_url: Option<String>,
    /// Gateway transaction reference, known once a notification arrives
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Builds a new PENDING payment.
    ///
    /// # Validation
    /// - amount must be positive with at most two decimal places
    /// - an empty currency defaults to IDR
    pub fn new_pending(
        user_id: UserId,
        amount: Decimal,
        currency: &str,
        payment_method: PaymentMethod,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount);
        }
        to_minor_units(amount)?;

        let currency = match currency.trim() {
            "" => DEFAULT_CURRENCY.to_string(),
            code if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                code.to_ascii_uppercase()
            }
            code => {
                return Err(DomainError::ValidationError(format!(
                    "Invalid currency code: {}",
                    code
                )));
            }
        };

        Ok(Self {
            id: PaymentId::new(),
            user_id,
            order_id: OrderId::generate(now),
            amount,
            currency,
            status: PaymentStatus::Pending,
            payment_method,
            description,
            gateway_token: None,
            gateway_redirect_url: None,
            transaction_id: None,
            created_at: now,
            updated_at: now,
            expired_at: Some(now + Duration::hours(PAYMENT_EXPIRY_HOURS)),
        })
    }

    /// Amount in persisted minor units.
    pub fn amount_minor(&self) -> i64 {
        // Validated on construction and when loaded from the store.
        (self.amount * Decimal::ONE_HUNDRED).to_i64().unwrap_or(0)
    }

    /// Attaches the hosted checkout session returned by the gateway.
    pub fn attach_checkout(&mut self, token: String, redirect_url: String) {
        self.gateway_token = Some(token);
        self.gateway_redirect_url = Some(redirect_url);
    }

    /// User-driven cancellation; only a PENDING payment can be canceled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: PaymentStatus::Canceled,
            });
        }
        self.status = PaymentStatus::Canceled;
        self.updated_at = now;
        Ok(())
    }

    /// Applies a status reported by the gateway.
    ///
    /// Terminal payments are never moved again.
    pub fn apply_gateway_status(
        &mut self,
        status: PaymentStatus,
        transaction_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(status) {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        if transaction_id.is_some() {
            self.transaction_id = transaction_id;
        }
        self.updated_at = now;
        Ok(())
    }
}
