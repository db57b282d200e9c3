//! Message catalogs keyed by locale.
//!
//! Messages are looked up gettext style: the English text is the message id
//! and a catalog maps it to the translated text. Anything missing falls back
//! to the message id itself.

use service_core::error::AppError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

type Messages = HashMap<String, String>;

const GERMAN: &[(&str, &str)] = &[
    ("Invoices and payments", "Rechnungen und Zahlungen"),
    ("Invoice & Payment exporter", "Rechnungs- und Zahlungsexport"),
    (
        "Export payments and invoices in the same sheet",
        "Zahlungen und Rechnungen in derselben Tabelle exportieren",
    ),
    ("Start date", "Startdatum"),
    ("End date", "Enddatum"),
    ("Invoice number", "Rechnungsnummer"),
    ("Line number", "Zeilennummer"),
    ("Description", "Beschreibung"),
    ("Gross price", "Bruttopreis"),
    ("Net price", "Nettopreis"),
    ("Tax", "Steuern"),
    ("Tax rate", "Steuersatz"),
    ("Tax name", "Steuername"),
    ("Date", "Datum"),
    ("Order code", "Bestellnummer"),
    ("Type", "Typ"),
    ("Cancellation of", "Storno von"),
    ("Gift card created in", "Gutschein erstellt in"),
    ("Invoice", "Rechnung"),
    ("Payment", "Zahlung"),
    ("Refund", "Erstattung"),
    ("Gift card", "Gutschein"),
    ("Free of charge", "Kostenlos"),
    ("Box office", "Abendkasse"),
    ("Manual payment", "Manuelle Zahlung"),
    ("Offsetting", "Verrechnung"),
    ("Bank transfer", "Überweisung"),
    ("Credit card", "Kreditkarte"),
];

/// All known catalogs.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    catalogs: HashMap<String, Arc<Messages>>,
}

/// Messages of one resolved locale. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: Option<Arc<Messages>>,
}

impl Translations {
    /// Catalogs shipped with the exporter.
    pub fn builtin() -> Self {
        let mut translations = Self::default();
        translations.merge(
            "de",
            GERMAN
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string())),
        );
        translations
    }

    /// Built-in catalogs overlaid with the ones from a JSON file shaped as
    /// `{"<locale>": {"<message id>": "<text>"}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let extra: HashMap<String, Messages> = serde_json::from_str(&raw).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid translations file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut translations = Self::builtin();
        for (locale, messages) in extra {
            translations.merge(&locale, messages);
        }
        Ok(translations)
    }

    pub fn merge(&mut self, locale: &str, messages: impl IntoIterator<Item = (String, String)>) {
        let entry = self.catalogs.entry(normalize(locale)).or_default();
        Arc::make_mut(entry).extend(messages);
    }

    /// Catalog for a locale tag. Tries the exact tag, then its primary
    /// language (`de-AT` falls back to `de`).
    pub fn catalog(&self, locale: &str) -> Catalog {
        let tag = normalize(locale);
        let messages = self.catalogs.get(&tag).or_else(|| {
            tag.split('-')
                .next()
                .and_then(|primary| self.catalogs.get(primary))
        });
        Catalog {
            messages: messages.cloned(),
        }
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }
}

impl Catalog {
    pub fn gettext(&self, msgid: &str) -> String {
        self.messages
            .as_ref()
            .and_then(|m| m.get(msgid))
            .cloned()
            .unwrap_or_else(|| msgid.to_string())
    }
}

fn normalize(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_falls_back_to_message_ids() {
        let catalog = Translations::builtin().catalog("en");
        assert_eq!(catalog.gettext("Invoice number"), "Invoice number");
    }

    #[test]
    fn german_catalog_is_builtin() {
        let catalog = Translations::builtin().catalog("de");
        assert_eq!(catalog.gettext("Invoice number"), "Rechnungsnummer");
        assert_eq!(catalog.gettext("Something else"), "Something else");
    }

    #[test]
    fn regional_tags_fall_back_to_primary_language() {
        let translations = Translations::builtin();
        assert_eq!(translations.catalog("de_AT").gettext("Refund"), "Erstattung");
        assert_eq!(translations.catalog("DE-ch").gettext("Refund"), "Erstattung");
    }

    #[test]
    fn file_catalogs_extend_builtins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"fr": {"Refund": "Remboursement"}, "de": {"Refund": "Rückerstattung"}}"#,
        )
        .unwrap();

        let translations = Translations::load(file.path()).unwrap();
        assert_eq!(translations.catalog("fr").gettext("Refund"), "Remboursement");
        assert_eq!(translations.catalog("de").gettext("Refund"), "Rückerstattung");
        assert_eq!(translations.catalog("de").gettext("Payment"), "Zahlung");
    }
}
