//! Payment and refund models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Created,
    Pending,
    Confirmed,
    Canceled,
    Failed,
    Refunded,
}

impl PaymentState {
    /// States whose payments show up in the report.
    pub const REPORTED: [PaymentState; 2] = [PaymentState::Confirmed, PaymentState::Refunded];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Created => "created",
            PaymentState::Pending => "pending",
            PaymentState::Confirmed => "confirmed",
            PaymentState::Canceled => "canceled",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        }
    }

    pub fn is_reported(&self) -> bool {
        Self::REPORTED.contains(self)
    }
}

/// Refund state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundState {
    External,
    Transit,
    Created,
    Canceled,
    Failed,
    Done,
}

impl RefundState {
    pub const REPORTED: [RefundState; 1] = [RefundState::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundState::External => "external",
            RefundState::Transit => "transit",
            RefundState::Created => "created",
            RefundState::Canceled => "canceled",
            RefundState::Failed => "failed",
            RefundState::Done => "done",
        }
    }

    pub fn is_reported(&self) -> bool {
        Self::REPORTED.contains(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayment {
    pub payment_id: i64,
    pub order_id: i64,
    pub amount: Decimal,
    pub state: PaymentState,
    pub provider: String,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    /// Provider specific JSON payload.
    #[serde(default)]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRefund {
    pub refund_id: i64,
    pub order_id: i64,
    pub amount: Decimal,
    pub state: RefundState,
    pub provider: String,
    #[serde(default)]
    pub execution_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub info: Option<String>,
}

/// A payment or refund as the report sees it: scoped, dated in the
/// reporting timezone and annotated with its order's last invoice number.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub order_id: i64,
    pub order_code: String,
    pub amount: Decimal,
    pub provider: String,
    /// `payment_date` for payments, `execution_date` for refunds.
    pub occurred_utc: Option<DateTime<Utc>>,
    pub local_date: Option<NaiveDate>,
    pub info: Option<String>,
    pub last_invoice_number: Option<String>,
}

/// Parse an info payload into a JSON object. Missing or malformed payloads
/// yield an empty object.
pub fn info_data(info: Option<&str>) -> serde_json::Map<String, serde_json::Value> {
    info.and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
        .and_then(|value| match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default()
}
