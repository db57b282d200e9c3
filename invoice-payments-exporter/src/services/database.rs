//! PostgreSQL-backed report store.

use crate::models::{
    Event, GiftCard, GiftCardTransaction, InvoiceLineRecord, PaymentState, RefundState,
    TransactionRecord,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{RecordQuery, ReportStore};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

const INVOICE_LINES_SQL: &str = r#"
    SELECT l.invoice_line_id, l.position, l.description,
           l.gross_value, l.net_value, l.tax_value, l.tax_rate, l.tax_name,
           i.full_invoice_no, i.date AS invoice_date, o.code AS order_code,
           r.full_invoice_no AS refers_invoice_no
    FROM invoice_lines l
    JOIN invoices i ON i.invoice_id = l.invoice_id
    JOIN orders o ON o.order_id = i.order_id
    LEFT JOIN invoices r ON r.invoice_id = i.refers
    WHERE i.event_id = ANY($1)
      AND ($2::date IS NULL OR i.date >= $2)
      AND ($3::date IS NULL OR i.date <= $3)
    ORDER BY i.date, i.invoice_no, l.position, l.invoice_line_id
"#;

const PAYMENTS_SQL: &str = r#"
    SELECT * FROM (
        SELECT p.payment_id AS id, p.order_id, o.code AS order_code, p.amount, p.provider,
               p.payment_date AS occurred_utc,
               (p.payment_date AT TIME ZONE $2)::date AS local_date,
               p.info,
               (SELECT i.full_invoice_no FROM invoices i
                WHERE i.order_id = p.order_id
                ORDER BY i.date DESC, i.invoice_no DESC
                LIMIT 1) AS last_invoice_number
        FROM order_payments p
        JOIN orders o ON o.order_id = p.order_id
        WHERE o.event_id = ANY($1) AND p.state = ANY($3)
    ) t
    WHERE ($4::date IS NULL OR t.local_date >= $4)
      AND ($5::date IS NULL OR t.local_date <= $5)
    ORDER BY t.occurred_utc NULLS LAST, t.id
"#;

const REFUNDS_SQL: &str = r#"
    SELECT * FROM (
        SELECT r.refund_id AS id, r.order_id, o.code AS order_code, r.amount, r.provider,
               r.execution_date AS occurred_utc,
               (r.execution_date AT TIME ZONE $2)::date AS local_date,
               r.info,
               (SELECT i.full_invoice_no FROM invoices i
                WHERE i.order_id = r.order_id
                ORDER BY i.date DESC, i.invoice_no DESC
                LIMIT 1) AS last_invoice_number
        FROM order_refunds r
        JOIN orders o ON o.order_id = r.order_id
        WHERE o.event_id = ANY($1) AND r.state = ANY($3)
    ) t
    WHERE ($4::date IS NULL OR t.local_date >= $4)
      AND ($5::date IS NULL OR t.local_date <= $5)
    ORDER BY t.occurred_utc NULLS LAST, t.id
"#;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoice-payments-exporter"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the reporting tables. Only meant for development databases and
    /// tests; production reads the platform's existing schema.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn fetch_transactions(
        &self,
        operation: &str,
        sql: &str,
        query: &RecordQuery,
        states: &[&str],
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let records = sqlx::query_as::<_, TransactionRecord>(sql)
            .bind(query.event_ids.as_slice())
            .bind(query.timezone.name())
            .bind(states)
            .bind(query.date_from)
            .bind(query.date_to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to run {}: {}", operation, e))
            })?;

        timer.observe_duration();

        debug!(operation, count = records.len(), "Transactions fetched");

        Ok(records)
    }
}

#[async_trait]
impl ReportStore for Database {
    #[instrument(skip(self))]
    async fn events_by_slug(&self, slugs: &[String]) -> Result<Vec<Event>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["events_by_slug"])
            .start_timer();

        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, slug, name, timezone
            FROM events
            WHERE slug = ANY($1)
            ORDER BY event_id
            "#,
        )
        .bind(slugs)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load events: {}", e)))?;

        timer.observe_duration();

        Ok(events)
    }

    #[instrument(skip(self), fields(events = ?query.event_ids, tz = %query.timezone))]
    async fn invoice_lines(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<InvoiceLineRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["invoice_lines"])
            .start_timer();

        let lines = sqlx::query_as::<_, InvoiceLineRecord>(INVOICE_LINES_SQL)
            .bind(query.event_ids.as_slice())
            .bind(query.date_from)
            .bind(query.date_to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to load invoice lines: {}", e))
            })?;

        timer.observe_duration();

        debug!(count = lines.len(), "Invoice lines fetched");

        Ok(lines)
    }

    #[instrument(skip(self), fields(events = ?query.event_ids, tz = %query.timezone))]
    async fn payments(&self, query: &RecordQuery) -> Result<Vec<TransactionRecord>, AppError> {
        let states = PaymentState::REPORTED.map(|s| s.as_str());
        self.fetch_transactions("payments", PAYMENTS_SQL, query, &states)
            .await
    }

    #[instrument(skip(self), fields(events = ?query.event_ids, tz = %query.timezone))]
    async fn refunds(&self, query: &RecordQuery) -> Result<Vec<TransactionRecord>, AppError> {
        let states = RefundState::REPORTED.map(|s| s.as_str());
        self.fetch_transactions("refunds", REFUNDS_SQL, query, &states)
            .await
    }

    #[instrument(skip(self))]
    async fn gift_card(&self, gift_card_id: i64) -> Result<Option<GiftCard>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["gift_card"])
            .start_timer();

        let gift_card = sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT gift_card_id, secret
            FROM gift_cards
            WHERE gift_card_id = $1
            "#,
        )
        .bind(gift_card_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get gift card: {}", e)))?;

        timer.observe_duration();

        Ok(gift_card)
    }

    #[instrument(skip(self))]
    async fn first_gift_card_transaction(
        &self,
        gift_card_id: i64,
    ) -> Result<Option<GiftCardTransaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["first_gift_card_transaction"])
            .start_timer();

        let transaction = sqlx::query_as::<_, GiftCardTransaction>(
            r#"
            SELECT transaction_id, gift_card_id, order_id, value, datetime
            FROM gift_card_transactions
            WHERE gift_card_id = $1
            ORDER BY datetime, transaction_id
            LIMIT 1
            "#,
        )
        .bind(gift_card_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to get gift card transaction: {}",
                e
            ))
        })?;

        timer.observe_duration();

        Ok(transaction)
    }

    #[instrument(skip(self))]
    async fn last_invoice_number(&self, order_id: i64) -> Result<Option<String>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["last_invoice_number"])
            .start_timer();

        let number = sqlx::query_scalar::<_, String>(
            r#"
            SELECT full_invoice_no
            FROM invoices
            WHERE order_id = $1
            ORDER BY date DESC, invoice_no DESC
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get last invoice: {}", e))
        })?;

        timer.observe_duration();

        Ok(number)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
