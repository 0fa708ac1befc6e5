//! In-memory catalog: records, the legacy-id keymap, and slugs.

use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock, RwLockReadGuard,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::{Deserialize, Serialize};

use importguard_core::{
    application::{ApplicationError, ports::CatalogStore},
    error::CoreResult,
};

/// One existing catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: i64,
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
}

impl CatalogRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            identifier: None,
            title: None,
            date: None,
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

#[derive(Default)]
struct Catalog {
    records: Vec<CatalogRecord>,
    /// Source-system legacy id to target record id.
    keymap: HashMap<String, i64>,
    /// Slug to target id; zero or negative means "no target".
    slugs: HashMap<String, i64>,
}

/// Thread-safe in-memory [`CatalogStore`].
///
/// Every lookup is counted, which makes it a convenient stand-in for a
/// database when checking how many queries a run issues.
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    inner: Arc<RwLock<Catalog>>,
    queries: Arc<AtomicUsize>,
}

impl InMemoryCatalogStore {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_record(&self, record: CatalogRecord) -> CoreResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.records.retain(|r| r.id != record.id);
        inner.records.push(record);
        Ok(())
    }

    /// Map a source-system legacy id to an existing record id.
    pub fn map_legacy_id(&self, legacy_id: impl Into<String>, target_id: i64) -> CoreResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.keymap.insert(legacy_id.into(), target_id);
        Ok(())
    }

    pub fn insert_slug(&self, slug: impl Into<String>, target_id: i64) -> CoreResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.slugs.insert(slug.into(), target_id);
        Ok(())
    }

    /// Number of lookups answered so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|c| c.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, Catalog>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?)
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn id_by_identifier(&self, identifier: &str) -> CoreResult<Option<i64>> {
        let inner = self.read()?;
        Ok(inner
            .records
            .iter()
            .find(|r| r.identifier.as_deref() == Some(identifier))
            .map(|r| r.id))
    }

    fn id_by_legacy_id(&self, legacy_id: &str) -> CoreResult<Option<i64>> {
        let inner = self.read()?;
        Ok(inner.keymap.get(legacy_id).copied())
    }

    fn id_by_title_and_date(&self, title: &str, date: Option<&str>) -> CoreResult<Option<i64>> {
        let inner = self.read()?;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.title.as_deref() == Some(title))
            .find(|r| date.is_none() || r.date.as_deref() == date)
            .map(|r| r.id))
    }

    fn slug_exists_with_target(&self, slug: &str) -> CoreResult<bool> {
        let inner = self.read()?;
        Ok(inner.slugs.get(slug).is_some_and(|target| *target > 0))
    }
}
