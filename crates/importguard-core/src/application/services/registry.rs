//! Explicit sector-code to extension-validator registry.

use std::collections::BTreeMap;

use tracing::debug;

use crate::application::validators::{DamValidator, Validator, sectors::dam::SECTOR_CODE as DAM};

/// Builds a fresh extension validator for one run.
pub type ValidatorFactory = Box<dyn Fn() -> Box<dyn Validator> + Send + Sync>;

/// Sector-specific validators, keyed by lower-cased sector code.
///
/// Populated once at startup; a sector with no entry simply gets the
/// standard pipeline.
#[derive(Default)]
pub struct SectorRegistry {
    factories: BTreeMap<String, ValidatorFactory>,
}

impl SectorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every extension shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(DAM, || Box::new(DamValidator::new()));
        registry
    }

    /// Register (or replace) the extension for `code`.
    pub fn register<F>(&mut self, code: &str, factory: F)
    where
        F: Fn() -> Box<dyn Validator> + Send + Sync + 'static,
    {
        let code = code.trim().to_ascii_lowercase();
        debug!(sector = %code, "sector validator registered");
        self.factories.insert(code, Box::new(factory));
    }

    /// A new extension validator for `code`, if one is registered.
    pub fn create(&self, code: &str) -> Option<Box<dyn Validator>> {
        self.factories
            .get(&code.trim().to_ascii_lowercase())
            .map(|factory| factory())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.factories
            .contains_key(&code.trim().to_ascii_lowercase())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for SectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectorRegistry")
            .field("codes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::validators::SchemaValidator;

    #[test]
    fn builtin_registry_knows_dam() {
        let registry = SectorRegistry::with_builtin();

        assert!(registry.contains("DAM"));
        assert_eq!(registry.create("dam").map(|v| v.name()), Some("dam"));
        assert!(registry.create("archive").is_none());
    }

    #[test]
    fn registration_replaces_existing_entries() {
        let mut registry = SectorRegistry::with_builtin();
        registry.register("dam", || Box::new(SchemaValidator::new()));

        assert_eq!(registry.create("dam").map(|v| v.name()), Some("schema"));
        assert_eq!(registry.codes().collect::<Vec<_>>(), vec!["dam"]);
    }
}
