//! Services module for invoice-payments-exporter.

pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::Database;
pub use memory::{InMemoryStore, ReportDataset};
pub use metrics::{get_metrics, init_metrics, record_error, record_export, record_rows};
pub use store::{RecordQuery, ReportStore};
