//! Configuration module for invoice-payments-exporter.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub export: ExportSettings,
}

/// Where report records are read from.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Postgres(DatabaseConfig),
    /// JSON dataset, for demos and tests.
    Fixture { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Locale used when a request names none.
    pub locale: String,
    /// Optional JSON catalog layered over the built-in translations.
    pub translations_path: Option<PathBuf>,
    /// Extra `(identifier, display name)` pairs for payment providers.
    pub payment_providers: Vec<(String, String)>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            translations_path: None,
            payment_providers: Vec::new(),
        }
    }
}

impl ExporterConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "invoice-payments-exporter".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            store: store_from_env()?,
            export: ExportSettings {
                locale: env::var("EXPORT_LOCALE").unwrap_or_else(|_| "en".to_string()),
                translations_path: env::var("TRANSLATIONS_PATH").ok().map(PathBuf::from),
                payment_providers: env::var("PAYMENT_PROVIDERS")
                    .map(|raw| parse_providers(&raw))
                    .unwrap_or_else(|_| Ok(Vec::new()))?,
            },
        })
    }
}

/// `DATABASE_URL` wins over `FIXTURE_PATH`; one of them is required.
fn store_from_env() -> Result<StoreConfig, AppError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(StoreConfig::Postgres(DatabaseConfig {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            run_migrations: env::var("DATABASE_RUN_MIGRATIONS")
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
        }));
    }

    match env::var("FIXTURE_PATH") {
        Ok(path) => Ok(StoreConfig::Fixture {
            path: PathBuf::from(path),
        }),
        Err(_) => Err(AppError::ConfigError(anyhow::anyhow!(
            "DATABASE_URL or FIXTURE_PATH is required"
        ))),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse `id=Name;id=Name`. Empty entries are skipped.
pub fn parse_providers(raw: &str) -> Result<Vec<(String, String)>, AppError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((id, name)) if !id.trim().is_empty() && !name.trim().is_empty() => {
                Ok((id.trim().to_string(), name.trim().to_string()))
            }
            _ => Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid PAYMENT_PROVIDERS entry '{}', expected id=Name",
                entry
            ))),
        })
        .collect()
}
