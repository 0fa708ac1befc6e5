//! Application layer for importguard.
//!
//! This layer contains:
//! - **Validators**: The `Validator` trait and the schema, referential,
//!   duplicate, and sector-specific implementations
//! - **Services**: Pipeline orchestration (ValidatorCollection, RuleLoader,
//!   SectorRegistry)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! Field-level rules live in `crate::domain`; this layer decides which
//! rules run, in what order, and against which ports.

pub mod error;
pub mod ports;
pub mod services;
pub mod validators;

// Re-export main services
pub use services::{PipelineDeps, RuleLoader, RuleLoading, SectorRegistry, ValidatorCollection};

// Re-export validators
pub use validators::{
    DamValidator, DuplicateDetector, DuplicateSummary, ReferentialValidator, SchemaValidator,
    ValidationOptions, Validator,
};

// Re-export port traits (for adapter implementation)
pub use ports::{CatalogStore, RuleSource};

pub use error::ApplicationError;
