//! HTTP handlers for invoice-payments-exporter.

pub mod exports;

pub use exports::{list_exporters, plugin_info, run_export};
