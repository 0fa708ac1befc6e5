//! Validator collection - runs a pipeline and merges its reports.
//!
//! The collection owns its validators. Each runs to completion against its
//! own scoped report; the combined report is assembled afterwards, so no
//! validator ever sees another's issues.

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ports::CatalogStore,
        services::{RuleLoader, SectorRegistry},
        validators::{
            DuplicateDetector, ReferentialValidator, SchemaValidator, ValidationOptions, Validator,
        },
    },
    domain::{DomainError, DuplicateStrategy, Row, RuleDocument, ValidationReport},
    error::CoreResult,
};

/// What [`ValidatorCollection::create_for_sector`] wires into a pipeline.
#[derive(Clone)]
pub struct PipelineDeps {
    pub loader: RuleLoader,
    pub store: Option<Arc<dyn CatalogStore>>,
    pub strategy: DuplicateStrategy,
    pub case_sensitive: bool,
    pub registry: Arc<SectorRegistry>,
}

impl PipelineDeps {
    /// File-only pipeline with the built-in sector extensions.
    pub fn new(loader: RuleLoader) -> Self {
        Self {
            loader,
            store: None,
            strategy: DuplicateStrategy::default(),
            case_sensitive: false,
            registry: Arc::new(SectorRegistry::with_builtin()),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_strategy(mut self, strategy: DuplicateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn with_registry(mut self, registry: Arc<SectorRegistry>) -> Self {
        self.registry = registry;
        self
    }
}

/// An ordered pipeline of validators sharing one sector.
pub struct ValidatorCollection {
    validators: Vec<Box<dyn Validator>>,
    loader: Option<RuleLoader>,
    sector: Option<String>,
    rules: Arc<RuleDocument>,
    report: ValidationReport,
}

impl Default for ValidatorCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorCollection {
    /// Empty collection; sectors resolve to empty rules.
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
            loader: None,
            sector: None,
            rules: Arc::new(RuleDocument::empty()),
            report: ValidationReport::new(),
        }
    }

    /// Empty collection resolving sectors through `loader`.
    pub fn with_loader(loader: RuleLoader) -> Self {
        Self {
            loader: Some(loader),
            ..Self::new()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.report.set_filename(filename);
        self
    }

    /// The standard pipeline for `code`: schema, referential, duplicate,
    /// then the sector's registered extension if there is one.
    #[instrument(skip(deps), fields(strategy = %deps.strategy))]
    pub fn create_for_sector(code: &str, filename: &str, deps: &PipelineDeps) -> CoreResult<Self> {
        let mut collection = Self::with_loader(deps.loader.clone()).with_filename(filename);
        collection.set_sector(code)?;

        let mut referential = ReferentialValidator::new();
        let mut duplicate =
            DuplicateDetector::new(deps.strategy.clone()).case_sensitive(deps.case_sensitive);
        if let Some(store) = &deps.store {
            referential = referential.with_store(Arc::clone(store));
            duplicate = duplicate.with_store(Arc::clone(store));
        }

        collection.add_validator(Box::new(
            SchemaValidator::new().case_sensitive_enums(deps.case_sensitive),
        ));
        collection.add_validator(Box::new(referential));
        collection.add_validator(Box::new(duplicate));

        match deps.registry.create(code) {
            Some(extension) => {
                debug!(extension = extension.name(), "sector extension added");
                collection.add_validator(extension);
            }
            None => debug!("no sector extension registered"),
        }

        info!(validators = collection.len(), "pipeline created");
        Ok(collection)
    }

    /// Load `code`'s rules and install them into every validator.
    pub fn set_sector(&mut self, code: &str) -> CoreResult<()> {
        self.rules = match &self.loader {
            Some(loader) => loader.load(code)?,
            None => Arc::new(RuleDocument::empty()),
        };
        self.sector = Some(code.to_string());
        self.report.set_sector(code);

        for validator in &mut self.validators {
            validator.set_sector(code, Arc::clone(&self.rules));
        }
        Ok(())
    }

    /// Append `validator` with a fresh scoped report and, if a sector is
    /// set, that sector's rules.
    pub fn add_validator(&mut self, mut validator: Box<dyn Validator>) {
        validator.set_report(self.report.fresh());
        if let Some(sector) = &self.sector {
            validator.set_sector(sector, Arc::clone(&self.rules));
        }
        self.validators.push(validator);
    }

    /// [`validate_with_options`](Self::validate_with_options) with defaults.
    pub fn validate(&mut self, rows: &[Row]) -> CoreResult<ValidationReport> {
        self.validate_with_options(rows, &ValidationOptions::default())
    }

    /// Run every enabled validator and merge the results into one finished
    /// report. A store fault from any validator aborts the whole run.
    ///
    /// Rows must carry unique, 1-based numbers; issues are keyed by them.
    #[instrument(
        skip_all,
        fields(sector = self.sector.as_deref().unwrap_or("-"), rows = rows.len())
    )]
    pub fn validate_with_options(
        &mut self,
        rows: &[Row],
        options: &ValidationOptions,
    ) -> CoreResult<ValidationReport> {
        check_row_numbers(rows)?;
        let mut combined = self.report.fresh();

        for validator in &mut self.validators {
            if !options.is_enabled(validator.name()) {
                debug!(validator = validator.name(), "skipped (disabled)");
                continue;
            }
            let report = validator.validate_file(rows, options)?;
            debug!(
                validator = validator.name(),
                issues = report.issue_count(),
                "validator finished"
            );
            combined.merge(&report);
        }

        combined.set_total_rows(rows.len());
        combined.finish();
        info!(
            errors = combined.error_count(),
            warnings = combined.warning_count(),
            info = combined.info_count(),
            invalid_rows = combined.invalid_rows(),
            elapsed_ms = combined.elapsed().map(|d| d.num_milliseconds()),
            "validation run finished"
        );

        self.report = combined;
        Ok(self.report.clone())
    }

    /// Reset every validator and start a fresh combined report.
    pub fn reset(&mut self) {
        for validator in &mut self.validators {
            validator.reset();
        }
        self.report = self.report.fresh();
    }

    /// The combined report of the last run.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn sector(&self) -> Option<&str> {
        self.sector.as_deref()
    }

    pub fn rules(&self) -> &RuleDocument {
        &self.rules
    }

    /// Validator names, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn validator(&self, name: &str) -> Option<&dyn Validator> {
        self.validators
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

fn check_row_numbers(rows: &[Row]) -> Result<(), DomainError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if row.number() == 0 {
            return Err(DomainError::InvalidRow {
                row: 0,
                reason: "row numbers start at 1".into(),
            });
        }
        if !seen.insert(row.number()) {
            return Err(DomainError::InvalidRow {
                row: row.number(),
                reason: "row number appears more than once".into(),
            });
        }
    }
    Ok(())
}
