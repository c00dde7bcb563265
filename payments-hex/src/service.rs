//! Payment Application Service
//!
//! Orchestrates the payment lifecycle through the repository, user directory
//! and gateway ports. Contains NO infrastructure logic.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use payments_types::{
    AppError, CheckoutRequest, CreatePaymentRequest, CustomerDetails, GatewayNotification,
    OrderId, Payment, PaymentGateway, PaymentId, PaymentMethod, PaymentNotification, PaymentPage,
    PaymentQuery, PaymentRepository, PaymentStats, PaymentStatus, UserDirectory, UserId,
};

use crate::outbound::signature::verify_notification_signature;

/// Where the hosted checkout sends the customer when it finishes.
pub const DEFAULT_FINISH_URL: &str = "http://localhost:3000/payment/finish";

/// Knobs of the payment lifecycle that come from configuration.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub finish_url: String,
    /// When set, every notification must carry a valid signature.
    pub webhook_server_key: Option<String>,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            finish_url: DEFAULT_FINISH_URL.to_string(),
            webhook_server_key: None,
        }
    }
}

/// A payment creation on behalf of an authenticated user.
#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    pub user_id: UserId,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub description: String,
}

impl CreatePaymentInput {
    pub fn from_request(user_id: UserId, req: CreatePaymentRequest) -> Self {
        Self {
            user_id,
            amount: req.amount,
            currency: req.currency,
            payment_method: req.payment_method,
            description: req.description,
        }
    }
}

/// What a gateway notification did to its payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Applied {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    /// Recorded for audit only; the payment had already left PENDING.
    Ignored {
        current: PaymentStatus,
        reported: PaymentStatus,
    },
}

/// Application service for the payment lifecycle.
///
/// Generic over `R: PaymentRepository` - the store is injected at compile time,
/// the remote collaborators at runtime.
pub struct PaymentService<R: PaymentRepository> {
    repo: R,
    users: Arc<dyn UserDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    settings: LifecycleSettings,
}

impl<R: PaymentRepository> PaymentService<R> {
    pub fn new(
        repo: R,
        users: Arc<dyn UserDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            repo,
            users,
            gateway,
            settings,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a PENDING payment with a hosted checkout session.
    ///
    /// The gateway is called before anything is written, so a gateway failure
    /// leaves no record behind.
    pub async fn create_payment(&self, input: CreatePaymentInput) -> Result<Payment, AppError> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest("Amount must be greater than 0".into()));
        }

        let user = self.users.get_user(input.user_id).await.map_err(|e| {
            tracing::warn!(user_id = %input.user_id, "user lookup failed: {}", e);
            AppError::from(e)
        })?;
        if !user.is_active {
            return Err(AppError::Forbidden("user account is inactive".into()));
        }

        let mut payment = Payment::new_pending(
            input.user_id,
            input.amount,
            &input.currency,
            input.payment_method,
            input.description,
            Utc::now(),
        )?;

        let checkout = CheckoutRequest::for_payment(
            &payment,
            CustomerDetails::from(&user),
            &self.settings.finish_url,
        );
        let session = self.gateway.create_checkout(&checkout).await.map_err(|e| {
            tracing::error!(order_id = %payment.order_id, "checkout creation failed: {}", e);
            AppError::from(e)
        })?;
        payment.attach_checkout(session.token, session.redirect_url);

        self.repo.insert_payment(&payment).await?;
        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            "payment created"
        );

        Ok(payment)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment, AppError> {
        self.repo
            .get_payment(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Payment {}", id))))
    }

    pub async fn get_payment_by_order_id(&self, order_id: &OrderId) -> Result<Payment, AppError> {
        self.repo
            .get_payment_by_order_id(order_id)
            .await
            .map_err(Into::into)
            .and_then(|opt| {
                opt.ok_or_else(|| AppError::NotFound(format!("Payment for order {}", order_id)))
            })
    }

    /// One page of payments, newest first.
    pub async fn list_payments(&self, query: PaymentQuery) -> Result<PaymentPage, AppError> {
        let (edges, total) = self.repo.list_payments(&query).await?;
        Ok(PaymentPage::new(edges, total, query.limit, query.offset))
    }

    /// Counts per status and the summed amount over the visible payments.
    pub async fn payment_stats(&self, owner: Option<UserId>) -> Result<PaymentStats, AppError> {
        let (payments, _) = self
            .repo
            .list_payments(&PaymentQuery::unbounded(owner))
            .await?;
        Ok(PaymentStats::from_payments(&payments))
    }

    /// Every notification received for a payment, oldest first.
    pub async fn notification_history(
        &self,
        id: PaymentId,
    ) -> Result<Vec<PaymentNotification>, AppError> {
        let payment = self.get_payment(id).await?;
        self.repo
            .list_notifications(payment.id)
            .await
            .map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Cancels a PENDING payment owned by `user_id`.
    pub async fn cancel_payment(&self, id: PaymentId, user_id: UserId) -> Result<Payment, AppError> {
        let mut payment = self
            .repo
            .get_payment_for_owner(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {}", id)))?;

        let now = Utc::now();
        payment.cancel(now)?;

        if !self.repo.cancel_payment(id, user_id, now).await? {
            // Lost a race with a notification.
            return Err(AppError::IllegalState(
                "Payment is no longer pending".into(),
            ));
        }

        tracing::info!(payment_id = %id, "payment canceled");
        Ok(payment)
    }

    /// Reconciles a gateway notification.
    ///
    /// Every accepted notification is appended to the audit trail. The status
    /// is applied only while the payment is still PENDING, so duplicate and
    /// out-of-order deliveries cannot move a settled payment.
    pub async fn handle_notification(
        &self,
        event: &Map<String, Value>,
    ) -> Result<NotificationOutcome, AppError> {
        let notification = GatewayNotification::parse(event)?;

        if let Some(server_key) = &self.settings.webhook_server_key {
            let provided = notification.signature_key.as_deref().ok_or_else(|| {
                AppError::Unauthorized("missing notification signature".into())
            })?;
            let valid = verify_notification_signature(
                notification.order_id.as_str(),
                notification.status_code.as_deref().unwrap_or_default(),
                notification.gross_amount.as_deref().unwrap_or_default(),
                server_key,
                provided,
            );
            if !valid {
                tracing::warn!(order_id = %notification.order_id, "rejected notification with bad signature");
                return Err(AppError::Unauthorized(
                    "invalid notification signature".into(),
                ));
            }
        }

        let payment = self.get_payment_by_order_id(&notification.order_id).await?;
        let now = Utc::now();

        let record = PaymentNotification::from_event(payment.id, &notification, event, now);
        self.repo.insert_notification(&record).await?;

        let reported = notification.mapped_status();
        if !payment.status.can_transition_to(reported) {
            tracing::warn!(
                order_id = %payment.order_id,
                current = %payment.status,
                reported = %reported,
                "ignoring notification for settled payment"
            );
            return Ok(NotificationOutcome::Ignored {
                current: payment.status,
                reported,
            });
        }

        let applied = self
            .repo
            .update_payment_status(
                &payment.order_id,
                reported,
                notification.transaction_id.as_deref(),
                now,
            )
            .await?;

        if !applied {
            // Settled concurrently between the read and the write.
            let current = self.get_payment(payment.id).await?.status;
            return Ok(NotificationOutcome::Ignored { current, reported });
        }

        tracing::info!(
            order_id = %payment.order_id,
            from = %payment.status,
            to = %reported,
            "payment status updated from notification"
        );
        Ok(NotificationOutcome::Applied {
            from: payment.status,
            to: reported,
        })
    }

    /// Pulls the gateway's view of a payment and applies it like a notification.
    pub async fn sync_payment_status(&self, id: PaymentId) -> Result<Payment, AppError> {
        let mut payment = self.get_payment(id).await?;
        let remote = self
            .gateway
            .transaction_status(&payment.order_id)
            .await
            .map_err(|e| {
                tracing::error!(order_id = %payment.order_id, "status query failed: {}", e);
                AppError::from(e)
            })?;

        let reported = PaymentStatus::from_transaction_status(&remote.transaction_status);
        if !payment.status.can_transition_to(reported) {
            return Ok(payment);
        }

        let transaction_id = Some(remote.transaction_id).filter(|tx| !tx.is_empty());
        let now = Utc::now();
        let applied = self
            .repo
            .update_payment_status(&payment.order_id, reported, transaction_id.as_deref(), now)
            .await?;

        if applied {
            payment.apply_gateway_status(reported, transaction_id, now)?;
            tracing::info!(order_id = %payment.order_id, status = %reported, "payment synced with gateway");
            Ok(payment)
        } else {
            self.get_payment(id).await
        }
    }
}
