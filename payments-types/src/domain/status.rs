//! Payment status state machine and payment methods.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DomainError;

/// Lifecycle state of a payment.
///
/// ```text
/// PENDING ──► PAID | CANCELED | EXPIRED | FAILED
/// ```
///
/// Every state other than PENDING is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Canceled,
    Expired,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Canceled,
        PaymentStatus::Expired,
        PaymentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Canceled => "CANCELED",
            PaymentStatus::Expired => "EXPIRED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Whether moving to `next` is allowed.
    ///
    /// PENDING → PENDING is accepted so a pending notification can still
    /// record the gateway transaction id.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!((self, next), (PaymentStatus::Pending, _))
    }

    /// Maps a gateway `transaction_status` onto a payment status.
    pub fn from_transaction_status(transaction_status: &str) -> Self {
        match transaction_status {
            "capture" | "settlement" => PaymentStatus::Paid,
            "cancel" => PaymentStatus::Canceled,
            "expire" => PaymentStatus::Expired,
            "failure" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("Unknown payment status: {}", s)))
    }
}

/// How the customer pays at the hosted checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    EWallet,
    VirtualAccount,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CreditCard,
        PaymentMethod::BankTransfer,
        PaymentMethod::EWallet,
        PaymentMethod::VirtualAccount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::EWallet => "E_WALLET",
            PaymentMethod::VirtualAccount => "VIRTUAL_ACCOUNT",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("Unknown payment method: {}", s)))
    }
}
