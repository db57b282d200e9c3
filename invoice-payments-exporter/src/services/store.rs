//! Read access to the records the report is built from.

use crate::models::{Event, GiftCard, GiftCardTransaction, InvoiceLineRecord, TransactionRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use service_core::error::AppError;

/// Scope of a record query: which events, which reporting timezone, and an
/// optional inclusive date window.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub event_ids: Vec<i64>,
    pub timezone: Tz,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl RecordQuery {
    pub fn new(event_ids: Vec<i64>, timezone: Tz) -> Self {
        Self {
            event_ids,
            timezone,
            date_from: None,
            date_to: None,
        }
    }

    /// Whether `date` lies in the window. Undated records never match a
    /// bounded window.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        match (self.date_from, self.date_to, date) {
            (None, None, _) => true,
            (_, _, None) => false,
            (from, to, Some(d)) => from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t),
        }
    }
}

/// Storage backend for the invoice/payment report.
///
/// Implementations must apply identical semantics:
/// - invoice lines are scoped by their invoice's event and filtered on the
///   invoice date, ordered by invoice date, invoice number, position;
/// - payments in a reported state (confirmed, refunded) and refunds in a
///   reported state (done) are scoped by their order's event, dated by their
///   timestamp truncated in `query.timezone`, filtered on that date, and
///   ordered by timestamp (undated last), then id;
/// - the last invoice number of an order is the `full_invoice_no` of its
///   invoice with the greatest `(date, invoice_no)`.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Events with the given slugs, ordered by id.
    async fn events_by_slug(&self, slugs: &[String]) -> Result<Vec<Event>, AppError>;

    async fn invoice_lines(&self, query: &RecordQuery)
        -> Result<Vec<InvoiceLineRecord>, AppError>;

    async fn payments(&self, query: &RecordQuery) -> Result<Vec<TransactionRecord>, AppError>;

    async fn refunds(&self, query: &RecordQuery) -> Result<Vec<TransactionRecord>, AppError>;

    async fn gift_card(&self, gift_card_id: i64) -> Result<Option<GiftCard>, AppError>;

    /// Earliest transaction of a gift card by `(datetime, transaction_id)`.
    async fn first_gift_card_transaction(
        &self,
        gift_card_id: i64,
    ) -> Result<Option<GiftCardTransaction>, AppError>;

    async fn last_invoice_number(&self, order_id: i64) -> Result<Option<String>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
