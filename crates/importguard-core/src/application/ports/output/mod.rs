//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the validators need from external systems.
//! The `importguard-adapters` crate provides implementations.

use crate::domain::RuleDocument;
use crate::error::CoreResult;

/// Port for resolving a sector code to its rule document.
///
/// Implemented by:
/// - `importguard_adapters::rule_source::FileRuleSource` (`<dir>/<sector>.toml|json`)
/// - `importguard_adapters::rule_source::InMemoryRuleSource` (tests, embedding)
pub trait RuleSource: Send + Sync {
    /// Load the document for `sector`.
    ///
    /// `Ok(None)` means no document exists. `Err` means one exists but is
    /// malformed, or the source itself failed.
    fn load(&self, sector: &str) -> CoreResult<Option<RuleDocument>>;
}

/// Port for the persistent catalog consulted by duplicate and referential
/// checks.
///
/// Each method is a single optional lookup. Failures are real faults and
/// propagate to the caller; "not found" is `Ok(None)` / `Ok(false)`.
///
/// Implemented by:
/// - `importguard_adapters::catalog_store::InMemoryCatalogStore`
/// - `importguard_adapters::catalog_store::CachingCatalogStore` (memoizing wrapper)
pub trait CatalogStore: Send + Sync {
    /// Record id whose identifier equals `identifier` exactly.
    fn id_by_identifier(&self, identifier: &str) -> CoreResult<Option<i64>>;

    /// Target id mapped from a source-system legacy id (the keymap).
    fn id_by_legacy_id(&self, legacy_id: &str) -> CoreResult<Option<i64>>;

    /// Record id matching `title` and, when given, `date`.
    fn id_by_title_and_date(&self, title: &str, date: Option<&str>) -> CoreResult<Option<i64>>;

    /// Whether `slug` exists and points at a real (positive) target.
    fn slug_exists_with_target(&self, slug: &str) -> CoreResult<bool>;
}
