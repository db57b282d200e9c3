//! Application startup and lifecycle management.

use crate::config::{ExporterConfig, StoreConfig};
use crate::exporter::ExporterRegistry;
use crate::handlers::{list_exporters, plugin_info, run_export};
use crate::i18n::Translations;
use crate::plugin::register_exporters;
use crate::providers::ProviderRegistry;
use crate::services::{get_metrics, init_metrics, Database, InMemoryStore, ReportStore};
use axum::{
    extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get, Json,
    Router,
};
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ExporterConfig,
    pub store: Arc<dyn ReportStore>,
    pub registry: Arc<ExporterRegistry>,
    pub translations: Arc<Translations>,
    pub providers: Arc<ProviderRegistry>,
}

impl AppState {
    /// Wire translations, providers and exporters around a store.
    pub fn new(config: ExporterConfig, store: Arc<dyn ReportStore>) -> Result<Self, AppError> {
        let translations = match &config.export.translations_path {
            Some(path) => {
                let translations = Translations::load(path)?;
                tracing::info!(path = %path.display(), "Loaded translations");
                translations
            }
            None => Translations::builtin(),
        };

        let mut providers = ProviderRegistry::builtin();
        for (id, name) in &config.export.payment_providers {
            providers.register(id.as_str(), name.as_str());
        }

        let translations = Arc::new(translations);
        let providers = Arc::new(providers);

        let mut registry = ExporterRegistry::new();
        register_exporters(&mut registry, providers.clone(), translations.clone());

        Ok(Self {
            config,
            store,
            registry: Arc::new(registry),
            translations,
            providers,
        })
    }
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": state.config.service_name,
                    "version": state.config.service_version
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": state.config.service_name,
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::ServiceUnavailable
    })?;
    Ok(StatusCode::OK)
}

/// Metrics endpoint for Prometheus scraping.
async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/plugin", get(plugin_info))
        .route("/exporters", get(list_exporters))
        .route("/exports/:identifier", get(run_export))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Open the store named by the configuration.
async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn ReportStore>, AppError> {
    match config {
        StoreConfig::Postgres(database) => {
            let db = Database::new(
                &database.url,
                database.max_connections,
                database.min_connections,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                e
            })?;

            if database.run_migrations {
                db.run_migrations().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to run migrations");
                    e
                })?;
            }

            Ok(Arc::new(db))
        }
        StoreConfig::Fixture { path } => Ok(Arc::new(InMemoryStore::from_path(path)?)),
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ExporterConfig) -> Result<Self, AppError> {
        let store = connect_store(&config.store).await?;
        Self::build_with_store(config, store).await
    }

    /// Build the application around an already opened store.
    pub async fn build_with_store(
        config: ExporterConfig,
        store: Arc<dyn ReportStore>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let state = AppState::new(config, store)?;

        let addr = state.config.common.bind_address();
        let http_listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            exporters = state.registry.len(),
            "Exporter service listener bound"
        );

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = %self.state.config.service_name,
            version = %self.state.config.service_version,
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        let app = router(self.state);
        axum::serve(self.http_listener, app).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
