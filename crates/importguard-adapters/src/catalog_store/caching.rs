//! Memoizing wrapper around any [`CatalogStore`].
//!
//! A validation run asks the same questions many times (every child of an
//! external parent resolves that parent again). Answers are cached for the
//! lifetime of the wrapper; faults are never cached.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use tracing::debug;

use importguard_core::{
    application::{ApplicationError, ports::CatalogStore},
    error::CoreResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Lookup {
    Identifier(String),
    LegacyId(String),
    TitleDate(String, Option<String>),
    Slug(String),
}

#[derive(Debug, Clone, Copy)]
enum Answer {
    Id(Option<i64>),
    Exists(bool),
}

/// Caches every answer of the wrapped store.
///
/// Build one per run (or call [`clear`](Self::clear) between runs) so that
/// catalog changes become visible.
pub struct CachingCatalogStore {
    inner: Arc<dyn CatalogStore>,
    cache: Mutex<HashMap<Lookup, Answer>>,
    hits: AtomicUsize,
}

impl CachingCatalogStore {
    pub fn new(inner: Arc<dyn CatalogStore>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
        }
    }

    /// Forget every cached answer.
    pub fn clear(&self) -> CoreResult<()> {
        self.cache
            .lock()
            .map_err(|_| ApplicationError::StoreLockError)?
            .clear();
        Ok(())
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Distinct lookups cached so far.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(
        &self,
        key: Lookup,
        fetch: impl FnOnce(&dyn CatalogStore) -> CoreResult<Answer>,
    ) -> CoreResult<Answer> {
        {
            let cache = self
                .cache
                .lock()
                .map_err(|_| ApplicationError::StoreLockError)?;
            if let Some(answer) = cache.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(*answer);
            }
        }

        // The lock is not held across the inner call.
        let answer = fetch(self.inner.as_ref())?;
        debug!(lookup = ?key, "catalog answer cached");
        self.cache
            .lock()
            .map_err(|_| ApplicationError::StoreLockError)?
            .insert(key, answer);
        Ok(answer)
    }

    fn id(
        &self,
        key: Lookup,
        fetch: impl FnOnce(&dyn CatalogStore) -> CoreResult<Option<i64>>,
    ) -> CoreResult<Option<i64>> {
        match self.cached(key, |store| fetch(store).map(Answer::Id))? {
            Answer::Id(id) => Ok(id),
            Answer::Exists(_) => Ok(None),
        }
    }
}

impl CatalogStore for CachingCatalogStore {
    fn id_by_identifier(&self, identifier: &str) -> CoreResult<Option<i64>> {
        self.id(Lookup::Identifier(identifier.to_string()), |store| {
            store.id_by_identifier(identifier)
        })
    }

    fn id_by_legacy_id(&self, legacy_id: &str) -> CoreResult<Option<i64>> {
        self.id(Lookup::LegacyId(legacy_id.to_string()), |store| {
            store.id_by_legacy_id(legacy_id)
        })
    }

    fn id_by_title_and_date(&self, title: &str, date: Option<&str>) -> CoreResult<Option<i64>> {
        let key = Lookup::TitleDate(title.to_string(), date.map(String::from));
        self.id(key, |store| store.id_by_title_and_date(title, date))
    }

    fn slug_exists_with_target(&self, slug: &str) -> CoreResult<bool> {
        let answer = self.cached(Lookup::Slug(slug.to_string()), |store| {
            store.slug_exists_with_target(slug).map(Answer::Exists)
        })?;
        Ok(matches!(answer, Answer::Exists(true)))
    }
}
