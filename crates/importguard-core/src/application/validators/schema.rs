//! Per-row field validation against the sector's rule document.

use std::{collections::BTreeMap, sync::Arc};

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::validators::{ValidationOptions, Validator, ValidatorState},
    domain::{
        FieldType, Row, RuleDocument, Severity, ValidationReport, compile_pattern, validate_enum,
        validate_max_length, validate_pattern, validate_type,
    },
    error::CoreResult,
};

pub const RULE_REQUIRED: &str = "required";
pub const RULE_TYPE: &str = "type_mismatch";
pub const RULE_PATTERN: &str = "pattern_mismatch";
pub const RULE_MAX_LENGTH: &str = "max_length";
pub const RULE_ENUM: &str = "enum_value";

/// Checks required, type, pattern, max-length, and enum constraints.
///
/// Every violation on a row is reported; checking never stops at the first.
pub struct SchemaValidator {
    state: ValidatorState,
    types: BTreeMap<String, FieldType>,
    patterns: BTreeMap<String, Regex>,
    case_sensitive_enums: bool,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            state: ValidatorState::default(),
            types: BTreeMap::new(),
            patterns: BTreeMap::new(),
            case_sensitive_enums: false,
        }
    }

    /// Standalone validator with `rules` already installed.
    pub fn with_rules(sector: &str, rules: RuleDocument) -> Self {
        let mut validator = Self::new();
        validator.set_sector(sector, Arc::new(rules));
        validator
    }

    pub fn case_sensitive_enums(mut self, yes: bool) -> Self {
        self.case_sensitive_enums = yes;
        self
    }

    /// Compile the document's types and patterns once per sector.
    ///
    /// Entries that do not parse are skipped with a warning; strict loading
    /// has already rejected such documents before they get here.
    fn prepare(&mut self) {
        let rules = Arc::clone(&self.state.rules);

        self.types = rules
            .types
            .iter()
            .filter_map(|(field, name)| match name.parse::<FieldType>() {
                Ok(t) => Some((field.clone(), t)),
                Err(e) => {
                    warn!(field = %field, error = %e, "skipping unknown field type");
                    None
                }
            })
            .collect();

        self.patterns = rules
            .patterns
            .iter()
            .filter_map(|(field, raw)| match compile_pattern(raw) {
                Ok(re) => Some((field.clone(), re)),
                Err(e) => {
                    warn!(field = %field, error = %e, "skipping uncompilable pattern");
                    None
                }
            })
            .collect();
    }

    /// Run every check on one row; returns `false` if any error was added.
    pub fn validate_row(&mut self, row: &Row) -> bool {
        let before = self.state.report.error_count();
        let n = row.number();
        let rules = Arc::clone(&self.state.rules);

        // 1. required
        for field in &rules.required {
            if row.get_trimmed(field).is_none() {
                self.state.add(
                    n,
                    field.as_str(),
                    format!("Required field '{field}' is missing or empty"),
                    Severity::Error,
                    RULE_REQUIRED,
                );
            }
        }

        // 2. type
        for (field, field_type) in &self.types {
            if let Some(value) = row.get(field) {
                if !validate_type(value, *field_type) {
                    self.state.add(
                        n,
                        field.as_str(),
                        format!("Value '{}' is not a valid {field_type}", value.trim()),
                        Severity::Error,
                        RULE_TYPE,
                    );
                }
            }
        }

        // 3. pattern
        for (field, pattern) in &self.patterns {
            if let Some(value) = row.get(field) {
                if !validate_pattern(value, pattern) {
                    self.state.add(
                        n,
                        field.as_str(),
                        format!(
                            "Value '{}' does not match the required format",
                            value.trim()
                        ),
                        Severity::Error,
                        RULE_PATTERN,
                    );
                }
            }
        }

        // 4. max length
        for (field, max) in &rules.max_lengths {
            if let Some(value) = row.get(field) {
                if !validate_max_length(value, *max) {
                    self.state.add(
                        n,
                        field.as_str(),
                        format!(
                            "Value is {} characters long; maximum is {max}",
                            value.chars().count()
                        ),
                        Severity::Error,
                        RULE_MAX_LENGTH,
                    );
                }
            }
        }

        // 5. enum
        for (field, allowed) in &rules.enums {
            if let Some(value) = row.get(field) {
                if !validate_enum(value, allowed, self.case_sensitive_enums) {
                    self.state.add(
                        n,
                        field.as_str(),
                        format!(
                            "Value '{}' is not one of: {}",
                            value.trim(),
                            allowed.join(", ")
                        ),
                        Severity::Error,
                        RULE_ENUM,
                    );
                }
            }
        }

        self.state.report.error_count() == before
    }
}

impl Validator for SchemaValidator {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn title(&self) -> &str {
        "Schema Validation"
    }

    fn set_sector(&mut self, sector: &str, rules: Arc<RuleDocument>) {
        self.state.set_sector(sector, rules);
        self.prepare();
    }

    fn set_report(&mut self, report: ValidationReport) {
        self.state.report = report;
    }

    fn report(&self) -> &ValidationReport {
        &self.state.report
    }

    #[instrument(skip_all, fields(validator = "schema", rows = rows.len()))]
    fn validate_file(
        &mut self,
        rows: &[Row],
        _options: &ValidationOptions,
    ) -> CoreResult<ValidationReport> {
        self.state.begin(rows.len());

        let failed = rows
            .iter()
            .filter(|row| !self.validate_row(row))
            .count();
        debug!(failed, "schema pass complete");

        let report = self.state.finish();
        info!(
            errors = report.error_count(),
            invalid_rows = report.invalid_rows(),
            "schema validation finished"
        );
        Ok(report)
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}
