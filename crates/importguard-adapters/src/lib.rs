//! Infrastructure adapters for importguard.
//!
//! This crate implements the ports defined in
//! `importguard-core::application::ports`. It contains all external
//! dependencies and I/O operations: reading rule documents from disk,
//! catalog lookups, and layered settings.

pub mod catalog_store;
pub mod rule_source;
pub mod settings;

// Re-export commonly used adapters
pub use catalog_store::{CachingCatalogStore, CatalogRecord, InMemoryCatalogStore};
pub use rule_source::{FileRuleSource, InMemoryRuleSource};
pub use settings::{SettingsError, ValidationSettings};
