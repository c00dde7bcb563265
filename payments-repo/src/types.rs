//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::FromRow;

use payments_types::{
    NotificationId, OrderId, Payment, PaymentId, PaymentMethod, PaymentNotification,
    PaymentStatus, RepoError, UserId, from_minor_units,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

/// Column list shared by every payment SELECT.
pub const PAYMENT_COLUMNS: &str = "id, user_id, order_id, amount_minor, currency, status, \
    payment_method, description, gateway_token, gateway_redirect_url, transaction_id, \
    created_at, updated_at, expired_at";

/// Column list shared by every notification SELECT.
pub const NOTIFICATION_COLUMNS: &str =
    "id, payment_id, transaction_status, fraud_status, payment_type, raw_notification, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Payment row from database.
#[derive(FromRow)]
pub struct DbPayment {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    #[cfg(not(feature = "sqlite"))]
    pub user_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub user_id: String,

    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub description: String,
    pub gateway_token: Option<String>,
    pub gateway_redirect_url: Option<String>,
    pub transaction_id: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub updated_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub updated_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub expired_at: Option<DateTime<Utc>>,
    #[cfg(feature = "sqlite")]
    pub expired_at: Option<String>,
}

/// Notification row from database.
#[derive(FromRow)]
pub struct DbNotification {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    #[cfg(not(feature = "sqlite"))]
    pub payment_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub payment_id: String,

    pub transaction_status: String,
    pub fraud_status: String,
    pub payment_type: String,
    pub raw_notification: String,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

/// Count-only row for paged listings.
#[derive(FromRow)]
pub struct DbCount {
    pub total: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_status(s: &str) -> Result<PaymentStatus, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown payment status: {}", s)))
}

pub fn parse_method(s: &str) -> Result<PaymentMethod, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown payment method: {}", s)))
}

/// Maps an INSERT failure, turning unique violations into conflicts.
pub fn map_insert_error(err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict(db.message().to_string())
        }
        _ => RepoError::Database(err.to_string()),
    }
}

/// Converts an amount filter bound into minor units, rounding towards the
/// inside of the range.
pub fn minor_bound(amount: Decimal, round_up: bool) -> i64 {
    match amount.checked_mul(Decimal::ONE_HUNDRED) {
        Some(scaled) => {
            let scaled = if round_up { scaled.ceil() } else { scaled.floor() };
            scaled.to_i64().unwrap_or(if scaled.is_sign_negative() {
                i64::MIN
            } else {
                i64::MAX
            })
        }
        None if amount.is_sign_negative() => i64::MIN,
        None => i64::MAX,
    }
}

#[cfg(feature = "sqlite")]
pub fn parse_uuid(s: &str) -> Result<uuid::Uuid, RepoError> {
    uuid::Uuid::parse_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
pub fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::Database(e.to_string()))?
        .with_timezone(&chrono::Utc))
}

/// Fixed-width RFC 3339 so that text comparison orders chronologically.
#[cfg(feature = "sqlite")]
pub fn format_timestamp(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion (feature-gated implementations)
// ─────────────────────────────────────────────────────────────────────────────

impl DbPayment {
    /// Convert database row to domain Payment.
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        let status = parse_status(&self.status)?;
        let payment_method = parse_method(&self.payment_method)?;

        #[cfg(not(feature = "sqlite"))]
        let (id, user_id, created_at, updated_at, expired_at) = (
            PaymentId::from_uuid(self.id),
            UserId::from_uuid(self.user_id),
            self.created_at,
            self.updated_at,
            self.expired_at,
        );

        #[cfg(feature = "sqlite")]
        let (id, user_id, created_at, updated_at, expired_at) = (
            PaymentId::from_uuid(parse_uuid(&self.id)?),
            UserId::from_uuid(parse_uuid(&self.user_id)?),
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
            self.expired_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        );

        Ok(Payment {
            id,
            user_id,
            order_id: OrderId::from(self.order_id),
            amount: from_minor_units(self.amount_minor),
            currency: self.currency,
            status,
            payment_method,
            description: self.description,
            gateway_token: self.gateway_token,
            gateway_redirect_url: self.gateway_redirect_url,
            transaction_id: self.transaction_id,
            created_at,
            updated_at,
            expired_at,
        })
    }
}

impl DbNotification {
    /// Convert database row to domain PaymentNotification.
    pub fn into_domain(self) -> Result<PaymentNotification, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let (id, payment_id, created_at) = (
            NotificationId::from_uuid(self.id),
            PaymentId::from_uuid(self.payment_id),
            self.created_at,
        );

        #[cfg(feature = "sqlite")]
        let (id, payment_id, created_at) = (
            NotificationId::from_uuid(parse_uuid(&self.id)?),
            PaymentId::from_uuid(parse_uuid(&self.payment_id)?),
            parse_timestamp(&self.created_at)?,
        );

        Ok(PaymentNotification::from_parts(
            id,
            payment_id,
            self.transaction_status,
            self.fraud_status,
            self.payment_type,
            self.raw_notification,
            created_at,
        ))
    }
}
