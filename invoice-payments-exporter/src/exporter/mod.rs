//! Data exporters: list-shaped reports rendered into files.

mod csv;
mod form;
mod invoice_payments;
mod registry;
mod row;

pub use self::csv::{render_csv, ExportFile};
pub use form::{parse_date, DateInput, ExportForm, FieldKind, FormField};
pub use invoice_payments::InvoicePaymentsReport;
pub use registry::ExporterRegistry;
pub use row::{Cell, Row, RowStream};

use crate::models::Event;
use crate::services::ReportStore;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid date: '{0}'")]
    InvalidDate(String),

    #[error("Unknown timezone: '{0}'")]
    InvalidTimezone(String),

    #[error("Gift card {0} does not exist")]
    GiftCardNotFound(String),

    #[error("Gift card {0} has no transactions")]
    GiftCardWithoutTransactions(i64),

    #[error("Unknown payment provider: '{0}'")]
    UnknownProvider(String),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl ExportError {
    /// Short label for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ExportError::InvalidDate(_) => "invalid_date",
            ExportError::InvalidTimezone(_) => "invalid_timezone",
            ExportError::GiftCardNotFound(_) => "gift_card_not_found",
            ExportError::GiftCardWithoutTransactions(_) => "gift_card_without_transactions",
            ExportError::UnknownProvider(_) => "unknown_provider",
            ExportError::Csv(_) | ExportError::Io(_) => "render",
            ExportError::Storage(_) => "storage",
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidDate(_) | ExportError::InvalidTimezone(_) => {
                AppError::BadRequest(anyhow::Error::new(err))
            }
            ExportError::Storage(inner) => inner,
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

/// Everything an exporter run needs.
#[derive(Clone)]
pub struct ExportContext {
    pub store: Arc<dyn ReportStore>,
    /// Events to report on, in storage order. The first one decides the
    /// reporting timezone.
    pub events: Vec<Event>,
    pub form: ExportForm,
    pub locale: String,
}

#[async_trait]
pub trait Exporter: Send + Sync {
    /// Stable identifier used in URLs.
    fn identifier(&self) -> &'static str;

    /// Display name as a message id.
    fn verbose_name(&self) -> &'static str;

    /// Extra options the exporter accepts besides the event selection.
    fn form_fields(&self) -> Vec<FormField>;

    /// Produce the report: a header row followed by data rows.
    async fn iterate_list(&self, context: ExportContext) -> Result<RowStream, ExportError>;
}
