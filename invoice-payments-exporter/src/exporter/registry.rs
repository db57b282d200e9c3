//! Explicit exporter registration.

use super::Exporter;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Default, Clone)]
pub struct ExporterRegistry {
    exporters: Vec<Arc<dyn Exporter>>,
}

impl ExporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an exporter. A later registration with the same identifier
    /// replaces the earlier one.
    pub fn register(&mut self, exporter: Arc<dyn Exporter>) {
        let identifier = exporter.identifier();
        if let Some(slot) = self
            .exporters
            .iter_mut()
            .find(|e| e.identifier() == identifier)
        {
            warn!(identifier, "Replacing registered exporter");
            *slot = exporter;
            return;
        }

        info!(identifier, "Exporter registered");
        self.exporters.push(exporter);
    }

    pub fn get(&self, identifier: &str) -> Option<Arc<dyn Exporter>> {
        self.exporters
            .iter()
            .find(|e| e.identifier() == identifier)
            .cloned()
    }

    /// Registered exporters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Exporter>> {
        self.exporters.iter()
    }

    pub fn len(&self) -> usize {
        self.exporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::{ExportContext, ExportError, FormField, RowStream};
    use async_trait::async_trait;
    use futures::{stream, StreamExt};

    struct Fixed(&'static str, &'static str);

    #[async_trait]
    impl Exporter for Fixed {
        fn identifier(&self) -> &'static str {
            self.0
        }

        fn verbose_name(&self) -> &'static str {
            self.1
        }

        fn form_fields(&self) -> Vec<FormField> {
            Vec::new()
        }

        async fn iterate_list(&self, _context: ExportContext) -> Result<RowStream, ExportError> {
            Ok(stream::empty().boxed())
        }
    }

    #[test]
    fn lookup_by_identifier() {
        let mut registry = ExporterRegistry::new();
        registry.register(Arc::new(Fixed("a", "First")));
        registry.register(Arc::new(Fixed("b", "Second")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("b").unwrap().verbose_name(), "Second");
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn same_identifier_replaces() {
        let mut registry = ExporterRegistry::new();
        registry.register(Arc::new(Fixed("a", "First")));
        registry.register(Arc::new(Fixed("a", "Replacement")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().verbose_name(), "Replacement");
    }
}
