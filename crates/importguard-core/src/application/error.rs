//! Application layer errors.
//!
//! These errors represent failures in orchestration and in the driven ports,
//! not row-level findings. Rule-document problems are `DomainError`s.

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while running validators against their ports.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The catalog store could not answer a lookup.
    #[error("Catalog store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        operation: &'static str,
        reason: String,
    },

    /// The rule source failed for reasons other than a malformed document.
    #[error("Rule source failed for sector '{sector}': {reason}")]
    RuleSourceFailed { sector: String, reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Catalog store lock error")]
    StoreLockError,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::StoreUnavailable { operation, .. } => vec![
                format!("Lookup '{}' failed", operation),
                "Check the catalog database connection".into(),
                "Or re-run with check_database disabled for file-only checks".into(),
            ],
            Self::RuleSourceFailed { sector, .. } => vec![
                format!("Could not read rules for '{}'", sector),
                "Check the rules directory and file permissions".into(),
            ],
            Self::StoreLockError => vec![
                "The catalog store is locked".into(),
                "Try again in a moment".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StoreUnavailable { .. } | Self::StoreLockError => ErrorCategory::Store,
            Self::RuleSourceFailed { .. } => ErrorCategory::Configuration,
        }
    }
}
