//! Catalog store implementations.

mod caching;
mod memory;

pub use caching::CachingCatalogStore;
pub use memory::{CatalogRecord, InMemoryCatalogStore};
