//! Common test utilities for invoice-payments-exporter integration tests.

use invoice_payments_exporter::config::{ExportSettings, ExporterConfig, StoreConfig};
use invoice_payments_exporter::startup::Application;
use service_core::config::Config as CommonConfig;
use std::path::PathBuf;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,invoice_payments_exporter=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/report.json")
}

/// Test configuration reading the bundled fixture on an ephemeral port.
#[allow(dead_code)]
pub fn test_config() -> ExporterConfig {
    ExporterConfig {
        common: CommonConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service_name: "invoice-payments-exporter-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        store: StoreConfig::Fixture {
            path: fixture_path(),
        },
        export: ExportSettings::default(),
    }
}

/// Test application wrapper.
#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub http_port: u16,
    pub client: reqwest::Client,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Spawn the application with the default test configuration.
#[allow(dead_code)]
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

/// Spawn the application in the background and return its address.
#[allow(dead_code)]
pub async fn spawn_app_with(config: ExporterConfig) -> TestApp {
    init_tracing();

    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let http_port = app.http_port();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", http_port),
        http_port,
        client: reqwest::Client::new(),
    }
}
