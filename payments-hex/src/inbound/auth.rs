//! Authentication middleware backed by the remote authority service.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use payments_types::{AppError, PaymentRepository};

use super::handlers::{ApiError, AppState};

/// Path the payment gateway posts notifications to.
pub const WEBHOOK_PATH: &str = "/api/webhooks/midtrans";

/// The raw bearer credential of the current request, kept for follow-up
/// permission checks against the authority service.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Routes reachable without a bearer token.
pub(crate) fn is_public(path: &str) -> bool {
    path == "/health"
        || path == WEBHOOK_PATH
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
}

/// Extracts the token from `Authorization: Bearer <token>`.
fn extract_bearer(auth_header: Option<&str>) -> Option<&str> {
    auth_header?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Resolves the bearer token through the authority service and attaches the
/// resulting `CallerIdentity` (and the token) as request extensions.
pub async fn auth_middleware<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        None => return unauthorized_response("Authorization header required"),
        Some(value) => match extract_bearer(Some(value)) {
            Some(token) => token.to_string(),
            None => return unauthorized_response("Invalid authorization header format"),
        },
    };

    match state.authority.validate(&token).await {
        Ok(Some(caller)) => {
            tracing::debug!(user_id = %caller.user_id, "caller authenticated");
            request.extensions_mut().insert(caller);
            request.extensions_mut().insert(BearerToken(token));
            next.run(request).await
        }
        Ok(None) => unauthorized_response("Invalid token"),
        Err(e) => {
            tracing::error!("Token validation failed: {}", e);
            ApiError(AppError::from(e)).into_response()
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": message,
            "code": 401
        })),
    )
        .into_response()
}
