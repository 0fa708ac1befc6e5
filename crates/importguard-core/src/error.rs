//! Unified error handling for importguard core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.
//!
//! Row-level findings are never errors: they are
//! [`ValidationIssue`](crate::domain::ValidationIssue)s collected in a report.
//! Errors here are reserved for faults that abort a run (store outages,
//! strict-mode configuration failures, misnumbered input).

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for importguard core operations.
#[derive(Debug, Error, Clone)]
pub enum ImportGuardError {
    /// Errors from the domain layer (rule documents, strategies, rows).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (ports, orchestration).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ImportGuardError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check the settings file and IMPORTGUARD__* environment variables".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Configuration => ErrorCategory::Configuration,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Only store-side faults are; configuration problems will fail again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Application(ApplicationError::StoreUnavailable { .. })
                | Self::Application(ApplicationError::StoreLockError)
        )
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Store,
}

/// Convenient result type alias.
pub type CoreResult<T> = Result<T, ImportGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_faults_are_retryable() {
        let err: ImportGuardError = ApplicationError::StoreUnavailable {
            operation: "id_by_identifier",
            reason: "connection reset".into(),
        }
        .into();

        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Store);
    }

    #[test]
    fn rule_document_errors_are_not_retryable() {
        let err: ImportGuardError = DomainError::InvalidRuleDocument {
            sector: "museum".into(),
            reason: "unknown key".into(),
        }
        .into();

        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.suggestions().is_empty());
    }
}
