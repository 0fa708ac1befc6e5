//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `importguard-adapters`
//! implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by validators, implemented by infrastructure
//!   - `RuleSource`: Sector code to rule document
//!   - `CatalogStore`: Existing-record and parent-existence lookups
//!
//! - **Driving (Input) Ports**: The `Validator` trait and `ValidatorCollection`

pub mod output;

pub use output::{CatalogStore, RuleSource};
