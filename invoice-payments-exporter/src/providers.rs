//! Payment provider names.

use crate::exporter::ExportError;
use std::collections::BTreeMap;

/// Identifier of the provider that pays with gift cards.
pub const GIFT_CARD_PROVIDER: &str = "giftcard";

const BUILTIN: &[(&str, &str)] = &[
    ("free", "Free of charge"),
    ("boxoffice", "Box office"),
    ("manual", "Manual payment"),
    ("offsetting", "Offsetting"),
    (GIFT_CARD_PROVIDER, "Gift card"),
    ("banktransfer", "Bank transfer"),
    ("paypal", "PayPal"),
    ("stripe", "Credit card"),
];

/// Maps provider identifiers to their display names (message ids, see
/// [`crate::i18n`]).
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    names: BTreeMap<String, String>,
}

impl ProviderRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for (id, name) in BUILTIN {
            registry.register(*id, *name);
        }
        registry
    }

    /// Add or rename a provider.
    pub fn register(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    pub fn verbose_name(&self, id: &str) -> Result<&str, ExportError> {
        self.names
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| ExportError::UnknownProvider(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }
}
