//! In-memory report store backed by a JSON dataset.
//!
//! Mirrors the queries of the PostgreSQL store so the exporter can run
//! against a fixture file, and so report semantics can be tested without a
//! database.

use crate::models::{
    Event, GiftCard, GiftCardTransaction, Invoice, InvoiceLine, InvoiceLineRecord, Order,
    OrderPayment, OrderRefund, TransactionRecord,
};
use crate::services::store::{RecordQuery, ReportStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Every record the report reads, as plain lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportDataset {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub invoice_lines: Vec<InvoiceLine>,
    #[serde(default)]
    pub payments: Vec<OrderPayment>,
    #[serde(default)]
    pub refunds: Vec<OrderRefund>,
    #[serde(default)]
    pub gift_cards: Vec<GiftCard>,
    #[serde(default)]
    pub gift_card_transactions: Vec<GiftCardTransaction>,
}

#[derive(Debug, Clone)]
pub struct InMemoryStore {
    data: ReportDataset,
}

/// Fields shared by payments and refunds while building records.
struct Movement<'a> {
    id: i64,
    order_id: i64,
    amount: Decimal,
    provider: &'a str,
    occurred_utc: Option<DateTime<Utc>>,
    info: Option<&'a str>,
}

impl InMemoryStore {
    pub fn new(data: ReportDataset) -> Self {
        Self { data }
    }

    /// Load a dataset from a JSON fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let data: ReportDataset = serde_json::from_str(&raw).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid fixture {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(
            path = %path.display(),
            events = data.events.len(),
            invoices = data.invoices.len(),
            payments = data.payments.len(),
            refunds = data.refunds.len(),
            "Loaded report fixture"
        );

        Ok(Self::new(data))
    }

    pub fn dataset(&self) -> &ReportDataset {
        &self.data
    }

    fn orders_in_scope(&self, query: &RecordQuery) -> HashMap<i64, &Order> {
        self.data
            .orders
            .iter()
            .filter(|o| query.event_ids.contains(&o.event_id))
            .map(|o| (o.order_id, o))
            .collect()
    }

    fn latest_invoice(&self, order_id: i64) -> Option<&Invoice> {
        self.data
            .invoices
            .iter()
            .filter(|i| i.order_id == order_id)
            .max_by(|a, b| (a.date, &a.invoice_no).cmp(&(b.date, &b.invoice_no)))
    }

    fn transaction_records<'a>(
        &self,
        query: &RecordQuery,
        movements: impl Iterator<Item = Movement<'a>>,
    ) -> Vec<TransactionRecord> {
        let orders = self.orders_in_scope(query);

        let mut records: Vec<TransactionRecord> = movements
            .filter_map(|m| {
                let order = orders.get(&m.order_id)?;
                let local_date = m
                    .occurred_utc
                    .map(|ts| ts.with_timezone(&query.timezone).date_naive());
                Some(TransactionRecord {
                    id: m.id,
                    order_id: m.order_id,
                    order_code: order.code.clone(),
                    amount: m.amount,
                    provider: m.provider.to_string(),
                    occurred_utc: m.occurred_utc,
                    local_date,
                    info: m.info.map(str::to_string),
                    last_invoice_number: self
                        .latest_invoice(m.order_id)
                        .map(|i| i.full_invoice_no.clone()),
                })
            })
            .filter(|r| query.contains(r.local_date))
            .collect();

        records.sort_by_key(|r| (r.occurred_utc.is_none(), r.occurred_utc, r.id));
        records
    }
}

#[async_trait]
impl ReportStore for InMemoryStore {
    async fn events_by_slug(&self, slugs: &[String]) -> Result<Vec<Event>, AppError> {
        let mut events: Vec<Event> = self
            .data
            .events
            .iter()
            .filter(|e| slugs.contains(&e.slug))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.event_id);
        Ok(events)
    }

    async fn invoice_lines(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<InvoiceLineRecord>, AppError> {
        let invoices: HashMap<i64, &Invoice> = self
            .data
            .invoices
            .iter()
            .map(|i| (i.invoice_id, i))
            .collect();
        let orders: HashMap<i64, &Order> =
            self.data.orders.iter().map(|o| (o.order_id, o)).collect();

        let mut rows: Vec<(&Invoice, InvoiceLineRecord)> = Vec::new();
        for line in &self.data.invoice_lines {
            let Some(invoice) = invoices.get(&line.invoice_id).copied() else {
                continue;
            };
            if !query.event_ids.contains(&invoice.event_id) || !query.contains(Some(invoice.date))
            {
                continue;
            }
            let Some(order) = orders.get(&invoice.order_id) else {
                continue;
            };

            rows.push((
                invoice,
                InvoiceLineRecord {
                    invoice_line_id: line.invoice_line_id,
                    position: line.position,
                    description: line.description.clone(),
                    gross_value: line.gross_value,
                    net_value: line.net_value,
                    tax_value: line.tax_value,
                    tax_rate: line.tax_rate,
                    tax_name: line.tax_name.clone(),
                    full_invoice_no: invoice.full_invoice_no.clone(),
                    invoice_date: invoice.date,
                    order_code: order.code.clone(),
                    refers_invoice_no: invoice
                        .refers
                        .and_then(|id| invoices.get(&id))
                        .map(|r| r.full_invoice_no.clone()),
                },
            ));
        }

        rows.sort_by(|(ia, la), (ib, lb)| {
            (ia.date, &ia.invoice_no, la.position, la.invoice_line_id).cmp(&(
                ib.date,
                &ib.invoice_no,
                lb.position,
                lb.invoice_line_id,
            ))
        });

        Ok(rows.into_iter().map(|(_, record)| record).collect())
    }

    async fn payments(&self, query: &RecordQuery) -> Result<Vec<TransactionRecord>, AppError> {
        let movements = self
            .data
            .payments
            .iter()
            .filter(|p| p.state.is_reported())
            .map(|p| Movement {
                id: p.payment_id,
                order_id: p.order_id,
                amount: p.amount,
                provider: &p.provider,
                occurred_utc: p.payment_date,
                info: p.info.as_deref(),
            });
        Ok(self.transaction_records(query, movements))
    }

    async fn refunds(&self, query: &RecordQuery) -> Result<Vec<TransactionRecord>, AppError> {
        let movements = self
            .data
            .refunds
            .iter()
            .filter(|r| r.state.is_reported())
            .map(|r| Movement {
                id: r.refund_id,
                order_id: r.order_id,
                amount: r.amount,
                provider: &r.provider,
                occurred_utc: r.execution_date,
                info: r.info.as_deref(),
            });
        Ok(self.transaction_records(query, movements))
    }

    async fn gift_card(&self, gift_card_id: i64) -> Result<Option<GiftCard>, AppError> {
        Ok(self
            .data
            .gift_cards
            .iter()
            .find(|g| g.gift_card_id == gift_card_id)
            .cloned())
    }

    async fn first_gift_card_transaction(
        &self,
        gift_card_id: i64,
    ) -> Result<Option<GiftCardTransaction>, AppError> {
        Ok(self
            .data
            .gift_card_transactions
            .iter()
            .filter(|t| t.gift_card_id == gift_card_id)
            .min_by_key(|t| (t.datetime, t.transaction_id))
            .cloned())
    }

    async fn last_invoice_number(&self, order_id: i64) -> Result<Option<String>, AppError> {
        Ok(self
            .latest_invoice(order_id)
            .map(|i| i.full_invoice_no.clone()))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentState;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Tz;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn invoice(invoice_id: i64, invoice_no: &str, day: &str) -> Invoice {
        Invoice {
            invoice_id,
            order_id: 1,
            event_id: 1,
            prefix: "INV-".to_string(),
            invoice_no: invoice_no.to_string(),
            full_invoice_no: format!("INV-{}", invoice_no),
            date: date(day),
            refers: None,
        }
    }

    fn dataset() -> ReportDataset {
        ReportDataset {
            events: vec![Event {
                event_id: 1,
                slug: "conf".to_string(),
                name: "Conference".to_string(),
                timezone: "Europe/Berlin".to_string(),
            }],
            orders: vec![Order {
                order_id: 1,
                event_id: 1,
                code: "ABC12".to_string(),
            }],
            invoices: vec![
                invoice(1, "00001", "2021-03-01"),
                invoice(2, "00003", "2021-03-05"),
                invoice(3, "00002", "2021-03-05"),
            ],
            payments: vec![OrderPayment {
                payment_id: 1,
                order_id: 1,
                amount: dec!(10.00),
                state: PaymentState::Confirmed,
                provider: "banktransfer".to_string(),
                // 23:30 UTC is already the next day in Berlin.
                payment_date: Some(Utc.with_ymd_and_hms(2021, 3, 4, 23, 30, 0).unwrap()),
                info: None,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn last_invoice_number_prefers_latest_date_then_number() {
        let store = InMemoryStore::new(dataset());
        assert_eq!(
            store.last_invoice_number(1).await.unwrap().as_deref(),
            Some("INV-00003")
        );
        assert_eq!(store.last_invoice_number(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn payment_dates_are_truncated_in_reporting_timezone() {
        let store = InMemoryStore::new(dataset());
        let tz: Tz = "Europe/Berlin".parse().unwrap();

        let payments = store
            .payments(&RecordQuery::new(vec![1], tz))
            .await
            .unwrap();
        assert_eq!(payments[0].local_date, Some(date("2021-03-05")));

        let utc_payments = store
            .payments(&RecordQuery::new(vec![1], Tz::UTC))
            .await
            .unwrap();
        assert_eq!(utc_payments[0].local_date, Some(date("2021-03-04")));
    }

    #[tokio::test]
    async fn records_outside_event_scope_are_skipped() {
        let store = InMemoryStore::new(dataset());
        let query = RecordQuery::new(vec![2], Tz::UTC);

        assert!(store.payments(&query).await.unwrap().is_empty());
        assert!(store.invoice_lines(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_dataset_from_fixture_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_string(&dataset()).unwrap()).unwrap();

        let store = InMemoryStore::from_path(file.path()).unwrap();
        assert_eq!(store.dataset().invoices.len(), 3);
        assert_eq!(
            store
                .events_by_slug(&["conf".to_string()])
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn malformed_fixture_is_a_config_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();

        assert!(matches!(
            InMemoryStore::from_path(file.path()),
            Err(AppError::ConfigError(_))
        ));
    }
}
