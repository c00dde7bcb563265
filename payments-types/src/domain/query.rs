//! Listing, filtering and aggregate views over payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::identity::UserId;
use super::payment::Payment;
use super::status::{PaymentMethod, PaymentStatus};

/// Default page size for caller-facing listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Optional, independently combinable filters. Ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentFilters {
    pub status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

/// A store-level listing request. A zero `limit` or `offset` means unbounded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentQuery {
    /// Restricts results to one user's payments when set
    pub owner: Option<UserId>,
    pub limit: i64,
    pub offset: i64,
    pub filters: PaymentFilters,
}

impl PaymentQuery {
    /// Clamps caller-supplied paging: default 20, between 1 and 100, offset never negative.
    pub fn paged(
        owner: Option<UserId>,
        limit: Option<i64>,
        offset: Option<i64>,
        filters: PaymentFilters,
    ) -> Self {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        Self {
            owner,
            limit,
            offset,
            filters,
        }
    }

    /// Every payment visible to `owner`, without paging.
    pub fn unbounded(owner: Option<UserId>) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }
}

/// One page of payments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentPage {
    pub edges: Vec<Payment>,
    pub total_count: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaymentPage {
    pub fn new(edges: Vec<Payment>, total_count: i64, limit: i64, offset: i64) -> Self {
        Self {
            edges,
            total_count,
            has_next_page: offset.saturating_add(limit) < total_count,
            has_previous_page: offset > 0,
        }
    }
}

/// Counts and totals over a set of payments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentStats {
    pub total_payments: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub pending_count: i64,
    pub paid_count: i64,
    pub canceled_count: i64,
    /// FAILED and EXPIRED payments
    pub failed_count: i64,
}

impl PaymentStats {
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Self {
        payments
            .into_iter()
            .fold(PaymentStats::default(), |mut stats, payment| {
                stats.total_payments += 1;
                stats.total_amount += payment.amount;
                match payment.status {
                    PaymentStatus::Pending => stats.pending_count += 1,
                    PaymentStatus::Paid => stats.paid_count += 1,
                    PaymentStatus::Canceled => stats.canceled_count += 1,
                    PaymentStatus::Failed | PaymentStatus::Expired => stats.failed_count += 1,
                }
                stats
            })
    }
}
