//! In-memory rule source, for embedding and tests.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use importguard_core::{
    application::{ApplicationError, ports::RuleSource},
    domain::RuleDocument,
    error::CoreResult,
};

/// Thread-safe map of sector code to rule document.
#[derive(Clone, Default)]
pub struct InMemoryRuleSource {
    inner: Arc<RwLock<HashMap<String, RuleDocument>>>,
}

impl InMemoryRuleSource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, sector: &str, rules: RuleDocument) -> CoreResult<Self> {
        self.insert(sector, rules)?;
        Ok(self)
    }

    /// Add or replace the document for `sector`.
    pub fn insert(&self, sector: &str, rules: RuleDocument) -> CoreResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.insert(sector.to_string(), rules);
        Ok(())
    }

    /// Remove the document for `sector`, returning it if present.
    pub fn remove(&self, sector: &str) -> CoreResult<Option<RuleDocument>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.remove(sector))
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RuleSource for InMemoryRuleSource {
    fn load(&self, sector: &str) -> CoreResult<Option<RuleDocument>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.get(sector).cloned())
    }
}
