//! SQLite repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

use payments_types::{
    OrderId, Payment, PaymentId, PaymentNotification, PaymentQuery, PaymentRepository,
    PaymentStatus, RepoError, UserId,
};

use crate::types::{
    DbCount, DbNotification, DbPayment, NOTIFICATION_COLUMNS, PAYMENT_COLUMNS, format_timestamp,
    map_insert_error, minor_bound,
};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let in_memory = database_url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every in-memory connection is a separate database, so keep exactly one alive.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        tracing::info!(in_memory, "SQLite schema ready");
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        for ddl in [
            include_str!("../migrations/0001_create_payments.sql"),
            include_str!("../migrations/0002_create_payment_notifications.sql"),
        ] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        }
        Ok(())
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &PaymentQuery) {
    let filters = &query.filters;
    qb.push(" WHERE 1 = 1");

    if let Some(owner) = query.owner {
        qb.push(" AND user_id = ").push_bind(owner.to_string());
    }
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(method) = filters.payment_method {
        qb.push(" AND payment_method = ").push_bind(method.as_str());
    }
    if let Some(start) = filters.start_date {
        qb.push(" AND created_at >= ")
            .push_bind(format_timestamp(start));
    }
    if let Some(end) = filters.end_date {
        qb.push(" AND created_at <= ").push_bind(format_timestamp(end));
    }
    if let Some(min) = filters.min_amount {
        qb.push(" AND amount_minor >= ")
            .push_bind(minor_bound(min, true));
    }
    if let Some(max) = filters.max_amount {
        qb.push(" AND amount_minor <= ")
            .push_bind(minor_bound(max, false));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentRepository for SqliteRepo {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payments (id, user_id, order_id, amount_minor, currency, status, payment_method,
                   description, gateway_token, gateway_redirect_url, transaction_id, created_at, updated_at, expired_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(payment.id.to_string())
        .bind(payment.user_id.to_string())
        .bind(payment.order_id.as_str())
        .bind(payment.amount_minor())
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.payment_method.as_str())
        .bind(&payment.description)
        .bind(&payment.gateway_token)
        .bind(&payment.gateway_redirect_url)
        .bind(&payment.transaction_id)
        .bind(format_timestamp(payment.created_at))
        .bind(format_timestamp(payment.updated_at))
        .bind(payment.expired_at.map(format_timestamp))
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError> {
        let sql = format!("SELECT {} FROM payments WHERE id = ?", PAYMENT_COLUMNS);
        let row: Option<DbPayment> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn get_payment_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Payment>, RepoError> {
        let sql = format!("SELECT {} FROM payments WHERE order_id = ?", PAYMENT_COLUMNS);
        let row: Option<DbPayment> = sqlx::query_as(&sql)
            .bind(order_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn get_payment_for_owner(
        &self,
        id: PaymentId,
        owner: UserId,
    ) -> Result<Option<Payment>, RepoError> {
        let sql = format!(
            "SELECT {} FROM payments WHERE id = ? AND user_id = ?",
            PAYMENT_COLUMNS
        );
        let row: Option<DbPayment> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .bind(owner.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn list_payments(&self, query: &PaymentQuery) -> Result<(Vec<Payment>, i64), RepoError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS total FROM payments");
        push_filters(&mut count, query);
        let total = count
            .build_query_as::<DbCount>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?
            .total;

        let mut page = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM payments", PAYMENT_COLUMNS));
        push_filters(&mut page, query);
        page.push(" ORDER BY created_at DESC, id DESC");
        if query.limit > 0 {
            page.push(" LIMIT ").push_bind(query.limit);
        } else if query.offset > 0 {
            // SQLite only accepts OFFSET after a LIMIT.
            page.push(" LIMIT -1");
        }
        if query.offset > 0 {
            page.push(" OFFSET ").push_bind(query.offset);
        }

        let rows: Vec<DbPayment> = page
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let payments = rows
            .into_iter()
            .map(DbPayment::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((payments, total))
    }

    async fn update_payment_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        transaction_id: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE payments
               SET status = ?, transaction_id = COALESCE(?, transaction_id), updated_at = ?
               WHERE order_id = ? AND status = 'PENDING'"#,
        )
        .bind(status.as_str())
        .bind(transaction_id)
        .bind(format_timestamp(updated_at))
        .bind(order_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn cancel_payment(
        &self,
        id: PaymentId,
        owner: UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE payments SET status = 'CANCELED', updated_at = ?
               WHERE id = ? AND user_id = ? AND status = 'PENDING'"#,
        )
        .bind(format_timestamp(updated_at))
        .bind(id.to_string())
        .bind(owner.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payment_notifications (id, payment_id, transaction_status, fraud_status, payment_type, raw_notification, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(notification.id.to_string())
        .bind(notification.payment_id.to_string())
        .bind(&notification.transaction_status)
        .bind(&notification.fraud_status)
        .bind(&notification.payment_type)
        .bind(&notification.raw_notification)
        .bind(format_timestamp(notification.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn list_notifications(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentNotification>, RepoError> {
        let sql = format!(
            "SELECT {} FROM payment_notifications WHERE payment_id = ? ORDER BY created_at ASC, rowid ASC",
            NOTIFICATION_COLUMNS
        );
        let rows: Vec<DbNotification> = sqlx::query_as(&sql)
            .bind(payment_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbNotification::into_domain).collect()
    }
}
