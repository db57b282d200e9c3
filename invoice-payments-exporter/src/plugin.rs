//! Plugin metadata and exporter registration.

use crate::exporter::{ExporterRegistry, InvoicePaymentsReport};
use crate::i18n::{Catalog, Translations};
use crate::providers::ProviderRegistry;
use serde::Serialize;
use std::sync::Arc;

/// Static description of the plugin. Name and description are message ids.
#[derive(Debug, Clone, Copy)]
pub struct PluginMeta {
    pub name: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub visible: bool,
    pub version: &'static str,
    pub category: &'static str,
    pub compatibility: &'static str,
}

pub const PLUGIN_META: PluginMeta = PluginMeta {
    name: "Invoice & Payment exporter",
    author: "pretix team",
    description: "Export payments and invoices in the same sheet",
    visible: true,
    version: env!("CARGO_PKG_VERSION"),
    category: "FORMAT",
    compatibility: "pretix>=3.10.0",
};

/// Plugin metadata with texts resolved for one locale.
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub author: &'static str,
    pub description: String,
    pub visible: bool,
    pub version: &'static str,
    pub category: &'static str,
    pub compatibility: &'static str,
}

impl PluginMeta {
    pub fn localized(&self, catalog: &Catalog) -> PluginInfo {
        PluginInfo {
            name: catalog.gettext(self.name),
            author: self.author,
            description: catalog.gettext(self.description),
            visible: self.visible,
            version: self.version,
            category: self.category,
            compatibility: self.compatibility,
        }
    }
}

/// Register every exporter this plugin provides.
pub fn register_exporters(
    registry: &mut ExporterRegistry,
    providers: Arc<ProviderRegistry>,
    translations: Arc<Translations>,
) {
    registry.register(Arc::new(InvoicePaymentsReport::new(providers, translations)));
}
