//! Sector-specific validators.
//!
//! Each extension is registered by sector code in
//! [`SectorRegistry`](crate::application::services::SectorRegistry) and runs
//! after the standard schema/referential/duplicate pipeline.

pub mod dam;

pub use dam::DamValidator;
