// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for importguard.
//!
//! Pure, synchronous logic with no I/O: rows, rule documents, primitive
//! checks, duplicate strategies, and the validation report. Anything that
//! talks to a catalog store or a rule repository goes through the ports in
//! `crate::application::ports`.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or database calls
//! - **Immutable inputs**: Rows and rule documents are never mutated by checks
//! - **Issues, not errors**: Row problems are data, see [`ValidationIssue`]

pub mod error;
pub mod primitives;
pub mod report;
pub mod row;
pub mod rules;
pub mod strategy;

pub use error::{DomainError, ErrorCategory};
pub use primitives::{
    FieldType, compile_pattern, validate_enum, validate_max_length, validate_pattern,
    validate_type,
};
pub use report::{
    IssueDetail, ReportSummary, Severity, SeverityCounts, ValidationIssue, ValidationReport,
};
pub use row::{Row, RowNumber, number_rows};
pub use rules::{ReferentialRules, RuleDocument};
pub use strategy::{DuplicateStrategy, EMPTY_KEY_HASH};
