//! Batch validators.
//!
//! Every validator owns exactly one [`ValidationReport`] for its run and
//! writes issues into it; nothing is shared across validators while they
//! execute. The collection merges the finished reports afterwards.

pub mod duplicate;
pub mod referential;
pub mod schema;
pub mod sectors;

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    domain::{Row, RowNumber, RuleDocument, Severity, ValidationReport},
    error::CoreResult,
};

pub use duplicate::{DuplicateDetector, DuplicateSummary};
pub use referential::{IdentifierEntry, ReferentialValidator};
pub use schema::SchemaValidator;
pub use sectors::DamValidator;

/// Default ceiling on hierarchy depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Per-run knobs passed to every validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Consult the catalog store for existing records and parents.
    pub check_database: bool,
    /// Hierarchy depth ceiling, unless the rule document overrides it.
    pub max_depth: usize,
    /// Validator names to skip (`schema`, `duplicate`, `referential`, ...).
    pub disabled: BTreeSet<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_database: true,
            max_depth: DEFAULT_MAX_DEPTH,
            disabled: BTreeSet::new(),
        }
    }
}

impl ValidationOptions {
    /// File-only checks: no catalog lookups.
    pub fn offline() -> Self {
        Self {
            check_database: false,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn disable(mut self, validator: impl Into<String>) -> Self {
        self.disabled.insert(validator.into());
        self
    }

    pub fn is_enabled(&self, validator: &str) -> bool {
        !self.disabled.contains(validator)
    }
}

/// A batch validator.
///
/// Object-safe so the collection can hold a heterogeneous pipeline.
pub trait Validator: Send {
    /// Stable short name, used for option lookups and logs.
    fn name(&self) -> &'static str;

    /// Human-facing title.
    fn title(&self) -> &str;

    /// Install a sector's rules.
    fn set_sector(&mut self, sector: &str, rules: Arc<RuleDocument>);

    /// Replace the scoped report (metadata carries over into each run).
    fn set_report(&mut self, report: ValidationReport);

    /// The report of the last run.
    fn report(&self) -> &ValidationReport;

    /// Validate the whole batch and return the finished report.
    ///
    /// Each call starts from a fresh report, so repeated calls on the same
    /// batch yield the same issue set.
    fn validate_file(
        &mut self,
        rows: &[Row],
        options: &ValidationOptions,
    ) -> CoreResult<ValidationReport>;

    /// Drop all per-run state and start a fresh report.
    fn reset(&mut self);
}

/// State every validator carries: its sector, rules, and scoped report.
#[derive(Debug, Clone)]
pub struct ValidatorState {
    pub sector: Option<String>,
    pub rules: Arc<RuleDocument>,
    pub report: ValidationReport,
}

impl Default for ValidatorState {
    fn default() -> Self {
        Self {
            sector: None,
            rules: Arc::new(RuleDocument::empty()),
            report: ValidationReport::new(),
        }
    }
}

impl ValidatorState {
    pub fn set_sector(&mut self, sector: &str, rules: Arc<RuleDocument>) {
        self.sector = Some(sector.to_string());
        self.rules = rules;
        self.report.set_sector(sector);
    }

    /// Fresh report for a new run, sized to the batch.
    pub fn begin(&mut self, total_rows: usize) {
        self.report = self.report.fresh();
        self.report.set_total_rows(total_rows);
    }

    pub fn add(
        &mut self,
        row: RowNumber,
        column: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        rule: impl Into<String>,
    ) {
        self.report.add(row, column, message, severity, rule);
    }

    /// Finish the report and hand back a copy.
    pub fn finish(&mut self) -> ValidationReport {
        self.report.finish();
        self.report.clone()
    }

    pub fn reset(&mut self) {
        self.report = self.report.fresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_database_checks() {
        let opts = ValidationOptions::default();
        assert!(opts.check_database);
        assert_eq!(opts.max_depth, 10);
        assert!(opts.is_enabled("schema"));

        let offline = ValidationOptions::offline().disable("duplicate");
        assert!(!offline.check_database);
        assert!(!offline.is_enabled("duplicate"));
    }

    #[test]
    fn state_begin_keeps_metadata() {
        let mut state = ValidatorState::default();
        state.set_sector("museum", Arc::new(RuleDocument::empty()));
        state.add(1, "title", "missing", Severity::Error, "required");

        state.begin(4);

        assert_eq!(state.report.sector(), Some("museum"));
        assert_eq!(state.report.issue_count(), 0);
        assert_eq!(state.report.total_rows(), 4);
    }
}
