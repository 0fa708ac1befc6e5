//! Rule loading with an explicit strictness policy.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{application::ports::RuleSource, domain::RuleDocument, error::CoreResult};

/// How to treat a rule document that cannot be used.
///
/// Lenient (the default) degrades to empty constraints so one bad document
/// never aborts an import. Strict fails fast, for CI and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLoading {
    pub strict: bool,
}

impl RuleLoading {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn lenient() -> Self {
        Self { strict: false }
    }
}

/// Resolves sector codes to rule documents through a [`RuleSource`].
#[derive(Clone)]
pub struct RuleLoader {
    source: Arc<dyn RuleSource>,
    mode: RuleLoading,
}

impl RuleLoader {
    pub fn new(source: Arc<dyn RuleSource>, mode: RuleLoading) -> Self {
        Self { source, mode }
    }

    pub fn lenient(source: Arc<dyn RuleSource>) -> Self {
        Self::new(source, RuleLoading::lenient())
    }

    pub fn mode(&self) -> RuleLoading {
        self.mode
    }

    /// Load `sector`'s rules.
    ///
    /// A missing document is empty in both modes. In strict mode a document
    /// that fails to parse or [`validate`](RuleDocument::validate) is an error.
    #[instrument(skip(self), fields(strict = self.mode.strict))]
    pub fn load(&self, sector: &str) -> CoreResult<Arc<RuleDocument>> {
        match self.source.load(sector) {
            Ok(Some(doc)) => {
                if self.mode.strict {
                    doc.validate(sector)?;
                }
                debug!(
                    required = doc.required.len(),
                    typed = doc.types.len(),
                    patterns = doc.patterns.len(),
                    "rule document loaded"
                );
                Ok(Arc::new(doc))
            }
            Ok(None) => {
                debug!("no rule document, using empty constraints");
                Ok(Arc::new(RuleDocument::empty()))
            }
            Err(e) if !self.mode.strict => {
                warn!(error = %e, "unusable rule document, using empty constraints");
                Ok(Arc::new(RuleDocument::empty()))
            }
            Err(e) => Err(e),
        }
    }
}
