//! Hosted checkout exchanged with the payment gateway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identity::UserProfile;
use super::payment::{OrderId, Payment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&UserProfile> for CustomerDetails {
    fn from(user: &UserProfile) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: String,
    pub price: Decimal,
    pub quantity: u32,
    pub name: String,
}

/// Everything the gateway needs to open a checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub gross_amount: Decimal,
    pub customer: CustomerDetails,
    pub items: Vec<ItemDetail>,
    /// Where the customer lands after finishing the hosted checkout
    pub callback_url: String,
}

impl CheckoutRequest {
    /// A single-item checkout for the whole payment amount.
    pub fn for_payment(payment: &Payment, customer: CustomerDetails, callback_url: &str) -> Self {
        Self {
            order_id: payment.order_id.clone(),
            gross_amount: payment.amount,
            customer,
            items: vec![ItemDetail {
                id: "item-1".to_string(),
                price: payment.amount,
                quantity: 1,
                name: payment.description.clone(),
            }],
            callback_url: callback_url.to_string(),
        }
    }
}

/// Checkout session handle issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub token: String,
    pub redirect_url: String,
}

/// Transaction state as reported by the gateway's status query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GatewayTransactionStatus {
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: String,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub gross_amount: String,
}
