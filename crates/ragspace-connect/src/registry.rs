//! Connector registry.

use ragspace_core::Connector;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps connector kinds to implementations.
///
/// Built once at startup and passed by reference; not a process-wide
/// singleton, so tests can register fakes.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in connectors registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::FilesystemConnector::new());
        registry
    }

    /// Register a connector under its own kind.
    pub fn register<C: Connector + 'static>(&mut self, connector: C) {
        self.connectors
            .insert(connector.kind().to_string(), Arc::new(connector));
    }

    /// Look up a connector by kind.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(kind).cloned()
    }

    /// All registered kinds.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.connectors.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ConnectorRegistry::new();
        assert!(registry.kinds().is_empty());
        assert!(registry.get("filesystem").is_none());
    }

    #[test]
    fn test_with_defaults_registers_filesystem() {
        let registry = ConnectorRegistry::with_defaults();
        assert!(registry.get("filesystem").is_some());
        assert_eq!(registry.kinds(), vec!["filesystem".to_string()]);
    }

    #[test]
    fn test_get_unknown_kind() {
        let registry = ConnectorRegistry::with_defaults();
        assert!(registry.get("gdrive").is_none());
    }
}
