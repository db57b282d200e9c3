//! Export handlers.
//!
//! Exporters are listed with their options and run against the events named
//! in the query string. Results are served as CSV downloads.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::exporter::{render_csv, DateInput, ExportContext, ExportFile, ExportForm, FieldKind};
use crate::plugin::{PluginInfo, PLUGIN_META};
use crate::services::{record_error, record_export};
use crate::startup::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Query string of an export run.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Comma separated event slugs.
    pub events: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub locale: Option<String>,
}

impl ExportQuery {
    pub fn event_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = Vec::new();
        for slug in self.events.as_deref().unwrap_or_default().split(',') {
            let slug = slug.trim();
            if !slug.is_empty() && !slugs.iter().any(|s| s == slug) {
                slugs.push(slug.to_string());
            }
        }
        slugs
    }

    fn form(&self) -> ExportForm {
        ExportForm {
            date_from: self.date_from.as_deref().map(DateInput::from),
            date_to: self.date_to.as_deref().map(DateInput::from),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormFieldResponse {
    pub name: &'static str,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub widget_class: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ExporterResponse {
    pub identifier: &'static str,
    pub name: String,
    pub fields: Vec<FormFieldResponse>,
}

#[derive(Debug, Serialize)]
pub struct ProviderResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PluginInfoResponse {
    #[serde(flatten)]
    pub plugin: PluginInfo,
    pub locales: Vec<String>,
    pub providers: Vec<ProviderResponse>,
}

impl IntoResponse for ExportFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.data,
        )
            .into_response()
    }
}

fn resolve_locale(state: &AppState, requested: Option<&str>) -> String {
    requested
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(&state.config.export.locale)
        .to_string()
}

// ============================================================================
// Handlers
// ============================================================================

/// Run an exporter and return its CSV.
///
/// GET /exports/{identifier}?events=a,b&date_from=&date_to=&locale=
#[instrument(skip_all, fields(exporter = %identifier))]
pub async fn run_export(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let exporter = state.registry.get(&identifier).ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Exporter '{}' not found", identifier))
    })?;

    let slugs = query.event_slugs();
    if slugs.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "At least one event is required"
        )));
    }

    let events = state.store.events_by_slug(&slugs).await?;
    if let Some(missing) = slugs
        .iter()
        .find(|slug| !events.iter().any(|e| &e.slug == *slug))
    {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Event '{}' not found",
            missing
        )));
    }

    let basename = match events.as_slice() {
        [event] => format!("{}_{}", event.slug, exporter.identifier()),
        _ => exporter.identifier().to_string(),
    };
    let context = ExportContext {
        store: state.store.clone(),
        events,
        form: query.form(),
        locale: resolve_locale(&state, query.locale.as_deref()),
    };

    let started = Instant::now();
    let result = match exporter.iterate_list(context).await {
        Ok(rows) => render_csv(rows).await,
        Err(e) => Err(e),
    };
    let duration = started.elapsed().as_secs_f64();

    match result {
        Ok(data) => {
            record_export(exporter.identifier(), "ok", duration);
            let file = ExportFile::csv(&basename, data);
            info!(
                filename = %file.filename,
                bytes = file.data.len(),
                duration_secs = duration,
                "Export completed"
            );
            Ok(file.into_response())
        }
        Err(e) => {
            record_export(exporter.identifier(), "error", duration);
            record_error(e.error_type());
            warn!(error = %e, error_type = e.error_type(), "Export failed");
            Err(e.into())
        }
    }
}

/// List registered exporters with their options.
///
/// GET /exporters?locale=
pub async fn list_exporters(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Json<Vec<ExporterResponse>> {
    let catalog = state
        .translations
        .catalog(&resolve_locale(&state, query.locale.as_deref()));

    let exporters = state
        .registry
        .iter()
        .map(|exporter| ExporterResponse {
            identifier: exporter.identifier(),
            name: catalog.gettext(exporter.verbose_name()),
            fields: exporter
                .form_fields()
                .into_iter()
                .map(|field| FormFieldResponse {
                    name: field.name,
                    label: catalog.gettext(field.label),
                    kind: field.kind,
                    required: field.required,
                    widget_class: field.widget_class,
                })
                .collect(),
        })
        .collect();

    Json(exporters)
}

/// Plugin metadata, available locales and known payment providers.
///
/// GET /plugin?locale=
pub async fn plugin_info(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Json<PluginInfoResponse> {
    let catalog = state
        .translations
        .catalog(&resolve_locale(&state, query.locale.as_deref()));

    let mut locales: Vec<String> = state.translations.locales().map(str::to_string).collect();
    locales.sort();

    Json(PluginInfoResponse {
        plugin: PLUGIN_META.localized(&catalog),
        locales,
        providers: state
            .providers
            .iter()
            .map(|(id, name)| ProviderResponse {
                id: id.to_string(),
                name: catalog.gettext(name),
            })
            .collect(),
    })
}
