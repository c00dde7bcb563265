//! Payment gateway port.

use crate::domain::{CheckoutRequest, CheckoutSession, GatewayTransactionStatus, OrderId};
use crate::error::UpstreamError;

/// Third-party processor that hosts the checkout page.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a hosted checkout session for an order.
    async fn create_checkout(&self, req: &CheckoutRequest)
    -> Result<CheckoutSession, UpstreamError>;

    /// Queries the gateway's current view of an order.
    async fn transaction_status(
        &self,
        order_id: &OrderId,
    ) -> Result<GatewayTransactionStatus, UpstreamError>;
}
