// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reports and errors travel across validators)
/// - Categorizable (for display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Rule document for sector '{sector}' is invalid: {reason}")]
    InvalidRuleDocument { sector: String, reason: String },

    #[error("Invalid pattern for field '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("Unknown field type '{type_name}'")]
    UnknownFieldType { type_name: String },

    #[error("Unknown duplicate strategy '{name}'")]
    UnknownStrategy { name: String },

    // ========================================================================
    // Input Errors
    // ========================================================================
    #[error("Invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidRuleDocument { sector, reason } => vec![
                format!("Fix the rule document for '{}'", sector),
                format!("Details: {}", reason),
                "Recognized keys: required, types, patterns, maxLengths, enums, referential"
                    .into(),
            ],
            Self::InvalidPattern { field, .. } => vec![
                format!("The pattern for '{}' does not compile", field),
                "Patterns may be bare regexes or delimited like /^[A-Z]+$/i".into(),
            ],
            Self::UnknownFieldType { .. } => vec![
                "Supported types: integer, float, boolean, date, datetime, email, url, string"
                    .into(),
            ],
            Self::UnknownStrategy { .. } => vec![
                "Supported strategies: identifier, legacy_id, title_date, composite".into(),
            ],
            Self::InvalidRow { .. } => vec!["Row numbers are 1-based and unique per batch".into()],
        }
    }

    /// Error category for display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRuleDocument { .. }
            | Self::InvalidPattern { .. }
            | Self::UnknownFieldType { .. }
            | Self::UnknownStrategy { .. } => ErrorCategory::Configuration,
            Self::InvalidRow { .. } => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
}
