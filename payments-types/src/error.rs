//! Error types for the payment service.

use crate::domain::PaymentStatus;

/// Domain-level errors (business logic violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Payment cannot move from {from} to {to}")]
    IllegalTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Failures talking to a sibling service or the payment gateway.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("user not found")]
    UserNotFound,

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    /// The authority refused the caller's credential (4xx).
    #[error("{service} denied the request with status {status}")]
    Denied { service: &'static str, status: u16 },

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("invalid response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Dependency error: {0}")]
    Dependency(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::IllegalTransition { .. } => AppError::IllegalState(err.to_string()),
            DomainError::InvalidAmount => AppError::BadRequest(err.to_string()),
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::Internal(e),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::UserNotFound => AppError::NotFound("User not found".into()),
            UpstreamError::Denied { status: 401, .. } => {
                AppError::Unauthorized("Invalid token".into())
            }
            UpstreamError::Denied { .. } => AppError::Forbidden("access denied".into()),
            e => AppError::Dependency(e.to_string()),
        }
    }
}
