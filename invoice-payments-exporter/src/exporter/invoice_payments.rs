//! Invoice lines, payments and refunds of a set of events in one sheet.

use super::{Cell, ExportContext, ExportError, Exporter, FormField, Row, RowStream};
use crate::i18n::{Catalog, Translations};
use crate::models::{gift_card_reference, Event, InvoiceLineRecord, TransactionRecord};
use crate::providers::{ProviderRegistry, GIFT_CARD_PROVIDER};
use crate::services::{record_rows, RecordQuery, ReportStore};
use async_trait::async_trait;
use chrono_tz::Tz;
use futures::{future, stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const HEADER: [&str; 13] = [
    "Invoice number",
    "Line number",
    "Description",
    "Gross price",
    "Net price",
    "Tax",
    "Tax rate",
    "Tax name",
    "Date",
    "Order code",
    "Type",
    "Cancellation of",
    "Gift card created in",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Payment,
    Refund,
}

impl Movement {
    fn label(&self) -> &'static str {
        match self {
            Movement::Payment => "Payment",
            Movement::Refund => "Refund",
        }
    }
}

pub struct InvoicePaymentsReport {
    providers: Arc<ProviderRegistry>,
    translations: Arc<Translations>,
}

impl InvoicePaymentsReport {
    pub const IDENTIFIER: &'static str = "invoice_payments";

    pub fn new(providers: Arc<ProviderRegistry>, translations: Arc<Translations>) -> Self {
        Self {
            providers,
            translations,
        }
    }
}

/// Reporting timezone: the first event's, UTC without events.
fn reporting_timezone(events: &[Event]) -> Result<Tz, ExportError> {
    match events.first() {
        Some(event) => event
            .timezone
            .parse::<Tz>()
            .map_err(|_| ExportError::InvalidTimezone(event.timezone.clone())),
        None => Ok(Tz::UTC),
    }
}

/// Shared state of the row producers.
struct RowBuilder {
    store: Arc<dyn ReportStore>,
    providers: Arc<ProviderRegistry>,
    catalog: Catalog,
    timezone: Tz,
}

impl RowBuilder {
    fn header(&self) -> Row {
        HEADER.iter().map(|label| self.text(label)).collect()
    }

    fn text(&self, msgid: &str) -> Cell {
        Cell::Text(self.catalog.gettext(msgid))
    }

    fn invoice_line_row(&self, line: InvoiceLineRecord) -> Row {
        vec![
            Cell::Text(line.full_invoice_no),
            Cell::Integer(line.position.into()),
            Cell::Text(line.description),
            Cell::Decimal(line.gross_value),
            Cell::Decimal(line.net_value),
            Cell::Decimal(line.tax_value),
            Cell::Decimal(line.tax_rate),
            Cell::Text(line.tax_name),
            Cell::Date(line.invoice_date),
            Cell::Text(line.order_code),
            self.text("Invoice"),
            Cell::from(line.refers_invoice_no),
            Cell::Empty,
        ]
    }

    async fn transaction_row(
        &self,
        record: TransactionRecord,
        movement: Movement,
    ) -> Result<Row, ExportError> {
        let is_gift_card = record.provider == GIFT_CARD_PROVIDER;
        let gift_card_origin = if is_gift_card {
            self.gift_card_origin(&record).await?
        } else {
            None
        };

        let kind = if is_gift_card {
            "Gift card"
        } else {
            movement.label()
        };
        // Payments are reported as negative gross amounts, refunds as positive.
        let amount = match movement {
            Movement::Payment => -record.amount,
            Movement::Refund => record.amount,
        };
        let date = record.occurred_utc.map_or(Cell::Empty, |ts| {
            Cell::DateTime(ts.with_timezone(&self.timezone).fixed_offset())
        });
        let provider_name = self.text(self.providers.verbose_name(&record.provider)?);

        Ok(vec![
            Cell::from(record.last_invoice_number),
            Cell::Empty,
            self.text(kind),
            Cell::Decimal(amount),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            date,
            Cell::Text(record.order_code),
            provider_name,
            Cell::Empty,
            Cell::from(gift_card_origin),
        ])
    }

    /// Invoice number of the order the used gift card was bought with.
    async fn gift_card_origin(
        &self,
        record: &TransactionRecord,
    ) -> Result<Option<String>, ExportError> {
        let Some(reference) = gift_card_reference(record.info.as_deref()) else {
            return Ok(None);
        };

        let gift_card_id = match &reference {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| ExportError::GiftCardNotFound(reference.to_string()))?;

        let gift_card = self
            .store
            .gift_card(gift_card_id)
            .await?
            .ok_or_else(|| ExportError::GiftCardNotFound(gift_card_id.to_string()))?;

        let first = self
            .store
            .first_gift_card_transaction(gift_card.gift_card_id)
            .await?
            .ok_or(ExportError::GiftCardWithoutTransactions(gift_card.gift_card_id))?;

        debug!(
            gift_card_id = gift_card.gift_card_id,
            order_id = ?first.order_id,
            "Resolving gift card origin"
        );

        match first.order_id {
            Some(order_id) => Ok(self.store.last_invoice_number(order_id).await?),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Exporter for InvoicePaymentsReport {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn verbose_name(&self) -> &'static str {
        "Invoices and payments"
    }

    fn form_fields(&self) -> Vec<FormField> {
        vec![
            FormField::optional_date("date_from", "Start date"),
            FormField::optional_date("date_to", "End date"),
        ]
    }

    #[instrument(skip(self, context), fields(events = context.events.len(), locale = %context.locale))]
    async fn iterate_list(&self, context: ExportContext) -> Result<RowStream, ExportError> {
        let timezone = reporting_timezone(&context.events)?;
        let (date_from, date_to) = context.form.date_range()?;

        let query = RecordQuery {
            event_ids: context.events.iter().map(|e| e.event_id).collect(),
            timezone,
            date_from,
            date_to,
        };

        let lines = context.store.invoice_lines(&query).await?;
        let payments = context.store.payments(&query).await?;
        let refunds = context.store.refunds(&query).await?;

        info!(
            tz = %timezone,
            date_from = ?date_from,
            date_to = ?date_to,
            invoice_lines = lines.len(),
            payments = payments.len(),
            refunds = refunds.len(),
            "Invoice/payment report queried"
        );
        record_rows("invoice_line", lines.len());
        record_rows("payment", payments.len());
        record_rows("refund", refunds.len());

        let builder = Arc::new(RowBuilder {
            store: context.store,
            providers: self.providers.clone(),
            catalog: self.translations.catalog(&context.locale),
            timezone,
        });

        let header = stream::once(future::ready(Ok::<Row, ExportError>(builder.header())));

        let line_rows = {
            let builder = builder.clone();
            stream::iter(lines).map(move |line| Ok(builder.invoice_line_row(line)))
        };

        let payment_rows = {
            let builder = builder.clone();
            stream::iter(payments).then(move |record| {
                let builder = builder.clone();
                async move { builder.transaction_row(record, Movement::Payment).await }
            })
        };

        let refund_rows = stream::iter(refunds).then(move |record| {
            let builder = builder.clone();
            async move { builder.transaction_row(record, Movement::Refund).await }
        });

        Ok(header
            .chain(line_rows)
            .chain(payment_rows)
            .chain(refund_rows)
            .boxed())
    }
}
