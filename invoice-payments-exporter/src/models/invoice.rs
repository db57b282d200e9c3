//! Invoice and invoice line models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Invoice document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: i64,
    pub order_id: i64,
    pub event_id: i64,
    #[serde(default)]
    pub prefix: String,
    pub invoice_no: String,
    pub full_invoice_no: String,
    pub date: NaiveDate,
    /// The invoice this one cancels or corrects.
    #[serde(default)]
    pub refers: Option<i64>,
}

/// One billable line on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub invoice_line_id: i64,
    pub invoice_id: i64,
    pub position: i32,
    pub description: String,
    pub gross_value: Decimal,
    pub net_value: Decimal,
    pub tax_value: Decimal,
    pub tax_rate: Decimal,
    #[serde(default)]
    pub tax_name: String,
}

/// An invoice line joined with the invoice, order and referred invoice it
/// belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceLineRecord {
    pub invoice_line_id: i64,
    pub position: i32,
    pub description: String,
    pub gross_value: Decimal,
    pub net_value: Decimal,
    pub tax_value: Decimal,
    pub tax_rate: Decimal,
    pub tax_name: String,
    pub full_invoice_no: String,
    pub invoice_date: NaiveDate,
    pub order_code: String,
    pub refers_invoice_no: Option<String>,
}
