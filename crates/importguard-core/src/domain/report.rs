//! Validation report: the shared sink every validator writes into.
//!
//! A report is created at run start, mutated through [`ValidationReport::add_issue`],
//! and frozen by [`ValidationReport::finish`]. Aggregate row counts are only
//! meaningful after `finish()`.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::row::RowNumber;

// ── Severity ─────────────────────────────────────────────────────────────────

/// How much an issue matters. Only `Error` blocks a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ValidationIssue ──────────────────────────────────────────────────────────

/// One finding, tied to a row and column and tagged with a stable rule name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub row: RowNumber,
    pub column: String,
    pub message: String,
    pub severity: Severity,
    pub rule: String,
}

impl ValidationIssue {
    pub fn new(
        row: RowNumber,
        column: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column: column.into(),
            message: message.into(),
            severity,
            rule: rule.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {} [{}] {}: {} ({})",
            self.row,
            self.column,
            self.severity.as_str().to_uppercase(),
            self.message,
            self.rule
        )
    }
}

// ── Counters ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

/// Condensed view for dashboards and exit-code decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run_id: Uuid,
    pub filename: Option<String>,
    pub sector: Option<String>,
    pub is_valid: bool,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub warning_rows: usize,
    pub counts: SeverityCounts,
    pub rule_violations: BTreeMap<String, usize>,
    pub elapsed_ms: Option<i64>,
}

/// Row → column → issues, in row then column order.
pub type IssueDetail = BTreeMap<RowNumber, BTreeMap<String, Vec<ValidationIssue>>>;

// ── ValidationReport ─────────────────────────────────────────────────────────

/// Accumulated issues plus run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    run_id: Uuid,
    filename: Option<String>,
    sector: Option<String>,
    issues: IssueDetail,
    counts: SeverityCounts,
    rule_violations: BTreeMap<String, usize>,
    total_rows: usize,
    valid_rows: usize,
    invalid_rows: usize,
    warning_rows: usize,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// Start a new, empty report; the clock starts now.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            filename: None,
            sector: None,
            issues: BTreeMap::new(),
            counts: SeverityCounts::default(),
            rule_violations: BTreeMap::new(),
            total_rows: 0,
            valid_rows: 0,
            invalid_rows: 0,
            warning_rows: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// A fresh report carrying this one's filename and sector.
    pub fn fresh(&self) -> Self {
        Self {
            filename: self.filename.clone(),
            sector: self.sector.clone(),
            ..Self::new()
        }
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Record an issue. Repeats append; nothing is merged or deduplicated.
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.counts.bump(issue.severity);
        *self.rule_violations.entry(issue.rule.clone()).or_insert(0) += 1;
        self.issues
            .entry(issue.row)
            .or_default()
            .entry(issue.column.clone())
            .or_default()
            .push(issue);
    }

    /// Shorthand for [`add_issue`](Self::add_issue).
    pub fn add(
        &mut self,
        row: RowNumber,
        column: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        rule: impl Into<String>,
    ) {
        self.add_issue(ValidationIssue::new(row, column, message, severity, rule));
    }

    pub fn set_total_rows(&mut self, total: usize) {
        self.total_rows = total;
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    pub fn set_sector(&mut self, sector: impl Into<String>) {
        self.sector = Some(sector.into());
    }

    /// Fold every issue of `other` into this report, one by one.
    pub fn merge(&mut self, other: &ValidationReport) {
        for issue in other.iter_issues() {
            self.add_issue(issue.clone());
        }
    }

    /// Freeze timing and compute row aggregates in one scan.
    ///
    /// `invalid_rows` counts rows with at least one error and `warning_rows`
    /// rows with at least one warning; a row may appear in both.
    pub fn finish(&mut self) -> &Self {
        let mut invalid = BTreeSet::new();
        let mut warned = BTreeSet::new();

        for issue in self.iter_issues() {
            match issue.severity {
                Severity::Error => {
                    invalid.insert(issue.row);
                }
                Severity::Warning => {
                    warned.insert(issue.row);
                }
                Severity::Info => {}
            }
        }

        self.invalid_rows = invalid.len();
        self.warning_rows = warned.len();
        self.valid_rows = self.total_rows.saturating_sub(self.invalid_rows);
        self.finished_at = Some(Utc::now());
        self
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// True when no error-severity issue was recorded.
    pub fn is_valid(&self) -> bool {
        self.counts.error == 0
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn sector(&self) -> Option<&str> {
        self.sector.as_deref()
    }

    pub fn counts(&self) -> SeverityCounts {
        self.counts
    }

    pub fn error_count(&self) -> usize {
        self.counts.error
    }

    pub fn warning_count(&self) -> usize {
        self.counts.warning
    }

    pub fn info_count(&self) -> usize {
        self.counts.info
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn valid_rows(&self) -> usize {
        self.valid_rows
    }

    pub fn invalid_rows(&self) -> usize {
        self.invalid_rows
    }

    pub fn warning_rows(&self) -> usize {
        self.warning_rows
    }

    /// Rule name → number of issues tagged with it.
    pub fn rule_violations(&self) -> &BTreeMap<String, usize> {
        &self.rule_violations
    }

    pub fn rule_count(&self, rule: &str) -> usize {
        self.rule_violations.get(rule).copied().unwrap_or(0)
    }

    /// Elapsed run time, once finished.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    /// Full per-row/column structure for UI highlighting.
    pub fn details(&self) -> &IssueDetail {
        &self.issues
    }

    /// Every issue recorded against `row`, in column order.
    pub fn issues_for_row(&self, row: RowNumber) -> Vec<&ValidationIssue> {
        self.issues
            .get(&row)
            .map(|cols| cols.values().flatten().collect())
            .unwrap_or_default()
    }

    /// Every issue, in row then column then insertion order.
    pub fn iter_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.values().flat_map(|cols| cols.values().flatten())
    }

    pub fn issue_count(&self) -> usize {
        self.counts.total()
    }

    /// Counts-only view.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.run_id,
            filename: self.filename.clone(),
            sector: self.sector.clone(),
            is_valid: self.is_valid(),
            total_rows: self.total_rows,
            valid_rows: self.valid_rows,
            invalid_rows: self.invalid_rows,
            warning_rows: self.warning_rows,
            counts: self.counts,
            rule_violations: self.rule_violations.clone(),
            elapsed_ms: self.elapsed().map(|d| d.num_milliseconds()),
        }
    }

    /// Human-readable lines, capped at `limit` with a trailing overflow marker.
    pub fn to_lines(&self, limit: usize) -> Vec<String> {
        let total = self.issue_count();
        let mut lines: Vec<String> = self
            .iter_issues()
            .take(limit)
            .map(ToString::to_string)
            .collect();

        if total > limit {
            lines.push(format!("... and {} more", total - limit));
        }
        lines
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} valid, {} invalid, {} with warnings ({} errors, {} warnings, {} info)",
            self.total_rows,
            self.valid_rows,
            self.invalid_rows,
            self.warning_rows,
            self.counts.error,
            self.counts.warning,
            self.counts.info
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(row: RowNumber, severity: Severity, rule: &str) -> ValidationIssue {
        ValidationIssue::new(row, "title", format!("{rule} on {row}"), severity, rule)
    }

    #[test]
    fn finish_counts_invalid_and_warning_rows_independently() {
        let mut report = ValidationReport::new();
        report.set_total_rows(10);
        report.add_issue(issue(2, Severity::Error, "required"));
        report.add_issue(issue(2, Severity::Warning, "hierarchy_depth"));
        report.add_issue(issue(5, Severity::Error, "type_mismatch"));
        report.add_issue(issue(5, Severity::Error, "max_length"));
        report.add_issue(issue(7, Severity::Warning, "hierarchy_ordering"));
        report.add_issue(issue(9, Severity::Info, "duplicate_in_database"));

        report.finish();

        assert_eq!(report.total_rows(), 10);
        assert_eq!(report.invalid_rows(), 2);
        // rows 2 and 7 both carry a warning
        assert_eq!(report.warning_rows(), 2);
        assert_eq!(report.valid_rows(), 8);
        assert!(!report.is_valid());
        assert!(report.is_finished());
    }

    #[test]
    fn warning_only_row_is_still_valid() {
        let mut report = ValidationReport::new();
        report.set_total_rows(10);
        report.add_issue(issue(2, Severity::Error, "required"));
        report.add_issue(issue(5, Severity::Error, "required"));
        report.add_issue(issue(7, Severity::Warning, "hierarchy_ordering"));
        report.finish();

        assert_eq!(report.invalid_rows(), 2);
        assert_eq!(report.warning_rows(), 1);
        assert_eq!(report.valid_rows(), 8);
    }

    #[test]
    fn repeated_issues_append() {
        let mut report = ValidationReport::new();
        report.add_issue(issue(1, Severity::Error, "required"));
        report.add_issue(issue(1, Severity::Error, "required"));

        assert_eq!(report.details()[&1]["title"].len(), 2);
        assert_eq!(report.rule_count("required"), 2);
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn merge_preserves_severity_and_rule() {
        let mut errors = ValidationReport::new();
        errors.add_issue(issue(1, Severity::Error, "parent_not_found"));
        let mut warnings = ValidationReport::new();
        warnings.add_issue(issue(3, Severity::Warning, "duplicate_in_file"));

        let mut combined = ValidationReport::new();
        combined.merge(&errors);
        combined.merge(&warnings);

        assert_eq!(combined.error_count(), 1);
        assert_eq!(combined.warning_count(), 1);
        assert!(!combined.is_valid());
        assert_eq!(combined.rule_count("duplicate_in_file"), 1);
        assert_eq!(combined.issues_for_row(3)[0].severity, Severity::Warning);
    }

    #[test]
    fn lines_are_capped_with_overflow_marker() {
        let mut report = ValidationReport::new();
        for row in 1..=5 {
            report.add_issue(issue(row, Severity::Error, "required"));
        }

        let lines = report.to_lines(3);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Row 1 [title] ERROR"));
        assert_eq!(lines[3], "... and 2 more");

        assert_eq!(report.to_lines(10).len(), 5);
    }

    #[test]
    fn summary_mirrors_counts() {
        let mut report = ValidationReport::new()
            .with_filename("fonds.csv")
            .with_sector("archive");
        report.set_total_rows(3);
        report.add_issue(issue(1, Severity::Info, "dc_type_recommended"));
        report.finish();

        let summary = report.summary();
        assert!(summary.is_valid);
        assert_eq!(summary.counts.info, 1);
        assert_eq!(summary.valid_rows, 3);
        assert_eq!(summary.filename.as_deref(), Some("fonds.csv"));
        assert!(summary.elapsed_ms.is_some());
    }

    #[test]
    fn fresh_keeps_metadata_but_drops_issues() {
        let mut report = ValidationReport::new().with_sector("museum");
        report.add_issue(issue(1, Severity::Error, "required"));

        let fresh = report.fresh();
        assert_eq!(fresh.sector(), Some("museum"));
        assert_eq!(fresh.issue_count(), 0);
        assert_ne!(fresh.run_id(), report.run_id());
    }
}
