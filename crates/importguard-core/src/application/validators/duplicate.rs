//! Duplicate detection: within the batch, and against the catalog.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    application::{
        ports::CatalogStore,
        validators::{ValidationOptions, Validator, ValidatorState},
    },
    domain::{
        DuplicateStrategy, EMPTY_KEY_HASH, Row, RowNumber, RuleDocument, Severity,
        ValidationReport, strategy::DATE_FIELDS, strategy::TITLE_FIELDS,
    },
    error::CoreResult,
};

pub const RULE_DUPLICATE_IN_FILE: &str = "duplicate_in_file";
pub const RULE_DUPLICATE_IN_DATABASE: &str = "duplicate_in_database";

/// Duplicate counts derived from the rule histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSummary {
    pub within_file: usize,
    pub in_database: usize,
}

/// Flags repeated keys inside a batch and records that already exist.
///
/// In-file repeats are warnings; catalog hits are info, since re-importing an
/// existing record is often intentional.
pub struct DuplicateDetector {
    state: ValidatorState,
    strategy: DuplicateStrategy,
    case_sensitive: bool,
    check_existing: bool,
    store: Option<Arc<dyn CatalogStore>>,
    hashes: HashMap<String, Vec<RowNumber>>,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(DuplicateStrategy::default())
    }
}

impl DuplicateDetector {
    pub fn new(strategy: DuplicateStrategy) -> Self {
        Self {
            state: ValidatorState::default(),
            strategy,
            case_sensitive: false,
            check_existing: true,
            store: None,
            hashes: HashMap::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// Turn catalog existence checks on or off for this detector.
    pub fn check_existing(mut self, yes: bool) -> Self {
        self.check_existing = yes;
        self
    }

    pub fn strategy(&self) -> &DuplicateStrategy {
        &self.strategy
    }

    /// Hash of `row`'s key under the configured strategy and the sector's
    /// identifier and legacy-id columns.
    pub fn generate_hash(&self, row: &Row) -> String {
        self.strategy.generate_hash(row, &self.state.rules.referential, self.case_sensitive)
    }

    /// Single pass over the batch; returns how many rows repeat an earlier key.
    ///
    /// The 2nd+ occurrence is reported against every earlier row sharing its
    /// hash. Blank keys are never tracked.
    pub fn detect_within_file(&mut self, rows: &[Row]) -> usize {
        self.hashes.clear();
        let rules = Arc::clone(&self.state.rules);
        let column = self.strategy.primary_column(&rules.referential);
        let mut found = 0;

        for row in rows {
            let hash = self.generate_hash(row);
            if hash == EMPTY_KEY_HASH {
                continue;
            }

            let bucket = self.hashes.entry(hash).or_default();
            if !bucket.is_empty() {
                let prior = bucket
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let message = format!(
                    "Duplicate of row(s) {prior} by {}: {}",
                    self.strategy.name(),
                    self.strategy.display(row, &rules.referential)
                );
                self.state.report.add(
                    row.number(),
                    column.as_str(),
                    message,
                    Severity::Warning,
                    RULE_DUPLICATE_IN_FILE,
                );
                found += 1;
            }
            bucket.push(row.number());
        }

        debug!(found, distinct = self.hashes.len(), "within-file pass complete");
        found
    }

    /// One catalog lookup per row; returns how many rows already exist.
    ///
    /// Does nothing when no store is configured. Store faults propagate.
    pub fn detect_existing(&mut self, rows: &[Row]) -> CoreResult<usize> {
        let Some(store) = self.store.clone() else {
            return Ok(0);
        };
        let rules = Arc::clone(&self.state.rules);
        let column = self.strategy.primary_column(&rules.referential);
        let mut found = 0;

        for row in rows {
            let Some((id, matched_by)) = self.lookup(store.as_ref(), &rules, row)? else {
                continue;
            };
            self.state.add(
                row.number(),
                column.as_str(),
                format!(
                    "Record already exists in the catalog (id {id}) matched by {matched_by}: {}",
                    self.strategy.display(row, &rules.referential)
                ),
                Severity::Info,
                RULE_DUPLICATE_IN_DATABASE,
            );
            found += 1;
        }

        debug!(found, "existing-record pass complete");
        Ok(found)
    }

    fn lookup(
        &self,
        store: &dyn CatalogStore,
        rules: &RuleDocument,
        row: &Row,
    ) -> CoreResult<Option<(i64, &'static str)>> {
        let identifier = || row.get_trimmed(rules.referential.identifier_field());
        let legacy_id = || row.first_of_owned(&rules.referential.legacy_id_fields());

        let hit = match &self.strategy {
            DuplicateStrategy::Identifier => match identifier() {
                Some(value) => store.id_by_identifier(value)?.map(|id| (id, "identifier")),
                None => None,
            },
            DuplicateStrategy::LegacyId => match legacy_id() {
                Some(value) => store.id_by_legacy_id(value)?.map(|id| (id, "legacy id")),
                None => None,
            },
            DuplicateStrategy::TitleDate => match row.first_of(TITLE_FIELDS) {
                Some(title) => store
                    .id_by_title_and_date(title, row.first_of(DATE_FIELDS))?
                    .map(|id| (id, "title and date")),
                None => None,
            },
            DuplicateStrategy::Composite(_) => {
                let by_identifier = match identifier() {
                    Some(value) => store.id_by_identifier(value)?.map(|id| (id, "identifier")),
                    None => None,
                };
                match (by_identifier, legacy_id()) {
                    (Some(hit), _) => Some(hit),
                    (None, Some(value)) => {
                        store.id_by_legacy_id(value)?.map(|id| (id, "legacy id"))
                    }
                    (None, None) => None,
                }
            }
        };
        Ok(hit)
    }

    /// `{within_file, in_database}` counts from the last run.
    pub fn duplicate_summary(&self) -> DuplicateSummary {
        let report = &self.state.report;
        DuplicateSummary {
            within_file: report.rule_count(RULE_DUPLICATE_IN_FILE),
            in_database: report.rule_count(RULE_DUPLICATE_IN_DATABASE),
        }
    }

    /// Rows sharing each repeated hash, from the last within-file pass.
    pub fn duplicate_groups(&self) -> Vec<Vec<RowNumber>> {
        let mut groups: Vec<Vec<RowNumber>> = self
            .hashes
            .values()
            .filter(|rows| rows.len() > 1)
            .cloned()
            .collect();
        groups.sort();
        groups
    }
}

impl Validator for DuplicateDetector {
    fn name(&self) -> &'static str {
        "duplicate"
    }

    fn title(&self) -> &str {
        "Duplicate Detection"
    }

    fn set_sector(&mut self, sector: &str, rules: Arc<RuleDocument>) {
        self.state.set_sector(sector, rules);
    }

    fn set_report(&mut self, report: ValidationReport) {
        self.state.report = report;
    }

    fn report(&self) -> &ValidationReport {
        &self.state.report
    }

    #[instrument(
        skip_all,
        fields(validator = "duplicate", strategy = %self.strategy, rows = rows.len())
    )]
    fn validate_file(
        &mut self,
        rows: &[Row],
        options: &ValidationOptions,
    ) -> CoreResult<ValidationReport> {
        self.state.begin(rows.len());

        self.detect_within_file(rows);
        if options.check_database && self.check_existing {
            self.detect_existing(rows)?;
        }

        let report = self.state.finish();
        let summary = self.duplicate_summary();
        info!(
            within_file = summary.within_file,
            in_database = summary.in_database,
            "duplicate detection finished"
        );
        Ok(report)
    }

    fn reset(&mut self) {
        self.hashes.clear();
        self.state.reset();
    }
}
