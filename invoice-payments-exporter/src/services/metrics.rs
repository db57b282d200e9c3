//! Prometheus metrics for invoice-payments-exporter.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Export runs by exporter and outcome.
pub static EXPORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "exporter_exports_total",
        "Total number of export runs",
        &["exporter", "status"] // ok, error
    )
    .expect("Failed to register exports_total")
});

/// Export duration histogram by exporter.
pub static EXPORT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "exporter_export_duration_seconds",
        "Export duration in seconds",
        &["exporter"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to register export_duration")
});

/// Emitted data rows by record type.
pub static ROWS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "exporter_rows_total",
        "Total number of exported rows by record type",
        &["record_type"] // invoice_line, payment, refund
    )
    .expect("Failed to register rows_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "exporter_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "exporter_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Recorder for the `metrics` macros of the HTTP middleware.
static HTTP_METRICS: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

/// Initialize all metrics (forces lazy initialization). Safe to call more
/// than once.
pub fn init_metrics() {
    HTTP_METRICS.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "HTTP metrics recorder not installed");
            None
        }
    });
    Lazy::force(&EXPORTS_TOTAL);
    Lazy::force(&EXPORT_DURATION);
    Lazy::force(&ROWS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut output = encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default();

    if let Some(Some(handle)) = HTTP_METRICS.get() {
        output.push_str(&handle.render());
    }
    output
}

/// Record a finished export run.
pub fn record_export(exporter: &str, status: &str, duration_secs: f64) {
    EXPORTS_TOTAL.with_label_values(&[exporter, status]).inc();
    EXPORT_DURATION
        .with_label_values(&[exporter])
        .observe(duration_secs);
}

/// Record emitted rows of one record type.
pub fn record_rows(record_type: &str, count: usize) {
    ROWS_TOTAL
        .with_label_values(&[record_type])
        .inc_by(count as f64);
}

/// Record an error.
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_exports_are_rendered() {
        init_metrics();
        init_metrics();
        record_export("invoice_payments", "ok", 0.2);
        record_rows("payment", 3);

        let text = get_metrics();
        assert!(text.contains("exporter_exports_total"));
        assert!(text.contains("exporter_rows_total"));
    }
}
