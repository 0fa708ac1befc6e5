//! Importguard Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for importguard,
//! a batch validation engine that checks a set of import rows against
//! sector rules before anything is committed to the catalog.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Import tooling (callers)         │
//! │      (parse files into Row batches)     │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (ValidatorCollection, RuleLoader,      │
//! │   SectorRegistry, the validators)       │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │     (Driven: RuleSource, CatalogStore)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   importguard-adapters (Infrastructure) │
//! │ (FileRuleSource, InMemoryCatalogStore)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │  (Row, RuleDocument, ValidationReport)  │
//! │         No External Dependencies        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use importguard_core::prelude::*;
//! # struct NoRules;
//! # impl RuleSource for NoRules {
//! #     fn load(&self, _: &str) -> CoreResult<Option<RuleDocument>> {
//! #         Ok(None)
//! #     }
//! # }
//! # struct EmptyCatalog;
//! # impl CatalogStore for EmptyCatalog {
//! #     fn id_by_identifier(&self, _: &str) -> CoreResult<Option<i64>> {
//! #         Ok(None)
//! #     }
//! #     fn id_by_legacy_id(&self, _: &str) -> CoreResult<Option<i64>> {
//! #         Ok(None)
//! #     }
//! #     fn id_by_title_and_date(&self, _: &str, _: Option<&str>) -> CoreResult<Option<i64>> {
//! #         Ok(None)
//! #     }
//! #     fn slug_exists_with_target(&self, _: &str) -> CoreResult<bool> {
//! #         Ok(false)
//! #     }
//! # }
//!
//! # fn main() -> CoreResult<()> {
//! # let rule_source: Arc<dyn RuleSource> = Arc::new(NoRules);
//! # let catalog_store: Arc<dyn CatalogStore> = Arc::new(EmptyCatalog);
//! let rows = vec![
//!     Row::new(1).with("identifier", "M-1").with("title", "Vase"),
//!     Row::new(2).with("identifier", "M-2").with("parentId", "M-1"),
//! ];
//!
//! // 1. Inject adapters
//! let loader = RuleLoader::lenient(rule_source);
//! let deps = PipelineDeps::new(loader).with_store(catalog_store);
//!
//! // 2. Build the sector pipeline and run it
//! let mut pipeline = ValidatorCollection::create_for_sector("museum", "objects.csv", &deps)?;
//! let report = pipeline.validate(&rows)?;
//!
//! // 3. Gate the commit
//! if !report.is_valid() {
//!     for line in report.to_lines(50) {
//!         eprintln!("{line}");
//!     }
//! }
//! assert!(report.is_valid());
//! # Ok(())
//! # }
//! ```

// Re-export domain layer (stable, well-defined API)
pub mod domain;

// Re-export application layer (orchestration logic)
pub mod application;

// Re-export error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        DuplicateDetector, PipelineDeps, ReferentialValidator, RuleLoader, RuleLoading,
        SchemaValidator, SectorRegistry, ValidationOptions, Validator, ValidatorCollection,
        ports::{CatalogStore, RuleSource},
    };
    pub use crate::domain::{
        DuplicateStrategy, FieldType, ReportSummary, Row, RowNumber, RuleDocument, Severity,
        ValidationIssue, ValidationReport,
    };
    pub use crate::error::{CoreResult, ImportGuardError};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
