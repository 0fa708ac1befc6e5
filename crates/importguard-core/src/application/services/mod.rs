//! Application services - orchestrate validation runs.
//!
//! Services coordinate the validators and the driven ports to accomplish
//! use cases like "validate this batch for sector X".

pub mod collection;
pub mod registry;
pub mod rule_loader;

pub use collection::{PipelineDeps, ValidatorCollection};
pub use registry::{SectorRegistry, ValidatorFactory};
pub use rule_loader::{RuleLoader, RuleLoading};
