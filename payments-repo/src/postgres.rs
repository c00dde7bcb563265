//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use payments_types::{
    OrderId, Payment, PaymentId, PaymentNotification, PaymentQuery, PaymentRepository,
    PaymentStatus, RepoError, UserId,
};

use crate::types::{
    DbCount, DbNotification, DbPayment, NOTIFICATION_COLUMNS, PAYMENT_COLUMNS, map_insert_error,
    minor_bound,
};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_payments_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_payment_notifications_pg.sql"),
        "0002",
    )
    .await?;

    tracing::info!("PostgreSQL migrations applied");
    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PaymentQuery) {
    let filters = &query.filters;
    qb.push(" WHERE TRUE");

    if let Some(owner) = query.owner {
        qb.push(" AND user_id = ").push_bind(owner.into_uuid());
    }
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(method) = filters.payment_method {
        qb.push(" AND payment_method = ").push_bind(method.as_str());
    }
    if let Some(start) = filters.start_date {
        qb.push(" AND created_at >= ").push_bind(start);
    }
    if let Some(end) = filters.end_date {
        qb.push(" AND created_at <= ").push_bind(end);
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
impl PaymentRepository for PostgresRepo {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payments (id, user_id, order_id, amount_minor, currency, status, payment_method,
                   description, gateway_token, gateway_redirect_url, transaction_id, created_at, updated_at, expired_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(payment.id.into_uuid())
        .bind(payment.user_id.into_uuid())
        .bind(payment.order_id.as_str())
        .bind(payment.amount_minor())
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.payment_method.as_str())
        .bind(&payment.description)
        .bind(&payment.gateway_token)
        .bind(&payment.gateway_redirect_url)
        .bind(&payment.transaction_id)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .bind(payment.expired_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError> {
        let sql = format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS);
        let row: Option<DbPayment> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn get_payment_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Payment>, RepoError> {
        let sql = format!("SELECT {} FROM payments WHERE order_id = $1", PAYMENT_COLUMNS);
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
            "SELECT {} FROM payments WHERE id = $1 AND user_id = $2",
            PAYMENT_COLUMNS
        );
        let row: Option<DbPayment> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
            .bind(owner.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn list_payments(&self, query: &PaymentQuery) -> Result<(Vec<Payment>, i64), RepoError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM payments");
        push_filters(&mut count, query);
        let total = count
            .build_query_as::<DbCount>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?
            .total;

        let mut page =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM payments", PAYMENT_COLUMNS));
        push_filters(&mut page, query);
        page.push(" ORDER BY created_at DESC, id DESC");
        if query.limit > 0 {
            page.push(" LIMIT ").push_bind(query.limit);
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
               SET status = $1, transaction_id = COALESCE($2, transaction_id), updated_at = $3
               WHERE order_id = $4 AND status = 'PENDING'"#,
        )
        .bind(status.as_str())
        .bind(transaction_id)
        .bind(updated_at)
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
            r#"UPDATE payments SET status = 'CANCELED', updated_at = $1
               WHERE id = $2 AND user_id = $3 AND status = 'PENDING'"#,
        )
        .bind(updated_at)
        .bind(id.into_uuid())
        .bind(owner.into_uuid())
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
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(notification.id.into_uuid())
        .bind(notification.payment_id.into_uuid())
        .bind(&notification.transaction_status)
        .bind(&notification.fraud_status)
        .bind(&notification.payment_type)
        .bind(&notification.raw_notification)
        .bind(notification.created_at)
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
            "SELECT {} FROM payment_notifications WHERE payment_id = $1 ORDER BY created_at ASC, id ASC",
            NOTIFICATION_COLUMNS
        );
        let rows: Vec<DbNotification> = sqlx::query_as(&sql)
            .bind(payment_id.into_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbNotification::into_domain).collect()
    }
}
