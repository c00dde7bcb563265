//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use payments_types::{
    AppError, AuthorityService, CREATE_PAYMENT, CallerIdentity, CreatePaymentRequest,
    ListPaymentsParams, OrderId, PaymentId, PaymentQuery, PaymentRepository, UPDATE_PAYMENT,
    WebhookAck,
};

use super::auth::BearerToken;
use crate::access;
use crate::service::{CreatePaymentInput, PaymentService};

/// Resource and action asked of the authority service for audit reads.
const AUDIT_RESOURCE: &str = "payments";
const AUDIT_ACTION: &str = "read_all";

/// Application state shared across handlers.
pub struct AppState<R: PaymentRepository> {
    pub service: PaymentService<R>,
    pub authority: Arc<dyn AuthorityService>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::IllegalState(msg) => (StatusCode::CONFLICT, msg),
            AppError::Dependency(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_payment_id(id: &str) -> Result<PaymentId, ApiError> {
    id.parse()
        .map_err(|_| ApiError(AppError::BadRequest("Invalid payment ID".into())))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

/// Create a payment for the caller and open a hosted checkout.
#[tracing::instrument(skip(state, caller, payload), fields(user_id = %caller.user_id))]
pub async fn create_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    access::require(&caller, CREATE_PAYMENT)?;
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let payment = state
        .service
        .create_payment(CreatePaymentInput::from_request(caller.user_id, req))
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// List payments visible to the caller.
#[tracing::instrument(skip(state, caller, params), fields(user_id = %caller.user_id))]
pub async fn list_payments<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
    params: Result<Query<ListPaymentsParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let query = PaymentQuery::paged(
        access::list_scope(&caller),
        params.limit,
        params.offset,
        params.filters(),
    );
    let page = state.service.list_payments(query).await?;
    Ok(Json(page))
}

/// Aggregate counts over the payments visible to the caller.
#[tracing::instrument(skip(state, caller), fields(user_id = %caller.user_id))]
pub async fn payment_stats<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .service
        .payment_stats(access::list_scope(&caller))
        .await?;
    Ok(Json(stats))
}

/// Get a payment by ID.
#[tracing::instrument(skip(state, caller), fields(payment_id = %id))]
pub async fn get_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state.service.get_payment(parse_payment_id(&id)?).await?;
    access::ensure_can_read(&caller, &payment)?;
    Ok(Json(payment))
}

/// Get a payment by its gateway order ID.
#[tracing::instrument(skip(state, caller), fields(order_id = %order_id))]
pub async fn get_payment_by_order_id<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state
        .service
        .get_payment_by_order_id(&OrderId::from(order_id))
        .await?;
    access::ensure_can_read(&caller, &payment)?;
    Ok(Json(payment))
}

/// Cancel one of the caller's own PENDING payments.
#[tracing::instrument(skip(state, caller), fields(payment_id = %id))]
pub async fn cancel_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    access::require(&caller, UPDATE_PAYMENT)?;
    let payment = state
        .service
        .cancel_payment(parse_payment_id(&id)?, caller.user_id)
        .await?;
    Ok(Json(payment))
}

/// Refresh a payment from the gateway's transaction status.
///
/// Requires read access only; the applied status always comes from the gateway.
#[tracing::instrument(skip(state, caller), fields(payment_id = %id))]
pub async fn sync_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_payment_id(&id)?;
    let payment = state.service.get_payment(id).await?;
    access::ensure_can_read(&caller, &payment)?;

    let payment = state.service.sync_payment_status(id).await?;
    Ok(Json(payment))
}

/// Notification audit trail of a payment.
#[tracing::instrument(skip(state, caller, token), fields(payment_id = %id))]
pub async fn list_notifications<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(caller): Extension<CallerIdentity>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_payment_id(&id)?;

    if !access::can_read_all(&caller) {
        let check = state
            .authority
            .check_permission(&token.0, AUDIT_RESOURCE, AUDIT_ACTION)
            .await
            .map_err(AppError::from)?;
        if !check.has_permission {
            return Err(AppError::Forbidden("access denied".into()).into());
        }
    }

    let history = state.service.notification_history(id).await?;
    Ok(Json(history))
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway webhook
// ─────────────────────────────────────────────────────────────────────────────

/// Receives a gateway notification.
///
/// Anything other than a malformed or unsigned event answers 500 so the
/// gateway redelivers.
#[tracing::instrument(skip(state, body))]
pub async fn midtrans_webhook<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let event: Map<String, Value> = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid notification body".into()))?;

    match state.service.handle_notification(&event).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "notification handled");
            Ok(Json(WebhookAck {
                status: "ok".to_string(),
            }))
        }
        Err(err @ (AppError::BadRequest(_) | AppError::Unauthorized(_))) => Err(err.into()),
        Err(err) => {
            tracing::error!("notification processing failed: {}", err);
            Err(AppError::Internal(err.to_string()).into())
        }
    }
}
