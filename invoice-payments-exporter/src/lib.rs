//! Invoice & Payment exporter - invoice lines, payments and refunds of a set
//! of events in one sheet.

pub mod config;
pub mod exporter;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod plugin;
pub mod providers;
pub mod services;
pub mod startup;
