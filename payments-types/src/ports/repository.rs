//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite) implement this trait.

use chrono::{DateTime, Utc};

use crate::domain::{
    OrderId, Payment, PaymentId, PaymentNotification, PaymentQuery, PaymentStatus, UserId,
};
use crate::error::RepoError;

/// Persistence for payments and their notification history.
///
/// Payments are never deleted; notifications are append-only.
#[async_trait::async_trait]
pub trait PaymentRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Inserts a new payment. A duplicate order id is a `RepoError::Conflict`.
    async fn insert_payment(&self, payment: &Payment) -> Result<(), RepoError>;

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError>;

    async fn get_payment_by_order_id(&self, order_id: &OrderId)
    -> Result<Option<Payment>, RepoError>;

    /// Looks a payment up by id AND owner in one predicate.
    async fn get_payment_for_owner(
        &self,
        id: PaymentId,
        owner: UserId,
    ) -> Result<Option<Payment>, RepoError>;

    /// Returns one page (newest first) and the total matching count.
    async fn list_payments(&self, query: &PaymentQuery) -> Result<(Vec<Payment>, i64), RepoError>;

    /// Sets status and gateway transaction id for a PENDING order.
    ///
    /// A missing transaction id keeps the stored one. Returns false when no
    /// PENDING payment has that order id.
    async fn update_payment_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        transaction_id: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepoError>;

    /// Moves an owned PENDING payment to CANCELED.
    ///
    /// Returns false when the payment is missing, owned by someone else, or
    /// no longer PENDING.
    async fn cancel_payment(
        &self,
        id: PaymentId,
        owner: UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_notification(&self, notification: &PaymentNotification)
    -> Result<(), RepoError>;

    /// Notification history of a payment, oldest first.
    async fn list_notifications(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentNotification>, RepoError>;
}
