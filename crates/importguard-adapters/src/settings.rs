//! Layered validation settings.
//!
//! [`ValidationSettings`] is loaded once at startup and handed to the
//! pipeline by value. The core crate never sees it; it only sees the
//! [`ValidationOptions`], [`RuleLoading`], and [`DuplicateStrategy`] derived
//! from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. Environment variables: `IMPORTGUARD__MAX_DEPTH=6`,
//!    `IMPORTGUARD__COMPOSITE_FIELDS=title,date`, ...
//! 2. Settings file (`importguard.toml` / `.json` in the working directory,
//!    or an explicit path)
//! 3. Built-in defaults (always present)

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use importguard_core::{
    application::{
        PipelineDeps, RuleLoader, RuleLoading, ValidationOptions, ports::CatalogStore,
        validators::DEFAULT_MAX_DEPTH,
    },
    domain::{DuplicateStrategy, ValidationReport},
    error::ImportGuardError,
};

use crate::rule_source::FileRuleSource;

/// Prefix for environment overrides; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "IMPORTGUARD";
/// Settings file looked up in the working directory (any supported extension).
pub const DEFAULT_FILE: &str = "importguard";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<SettingsError> for ImportGuardError {
    fn from(e: SettingsError) -> Self {
        ImportGuardError::Configuration {
            message: e.to_string(),
        }
    }
}

/// Everything an import run can be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Fail fast on malformed rule documents instead of degrading to empty.
    pub strict: bool,
    /// Consult the catalog for existing records and external parents.
    pub check_database: bool,
    pub max_depth: usize,
    /// Directory holding `<sector>.toml` / `<sector>.json`.
    pub rules_dir: PathBuf,
    /// `identifier`, `legacy_id`, `title_date`, or `composite`.
    pub duplicate_strategy: String,
    /// Columns for the `composite` strategy.
    pub composite_fields: Vec<String>,
    pub case_sensitive: bool,
    pub disabled_validators: Vec<String>,
    /// Cap for human-readable report output.
    pub max_report_lines: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            strict: false,
            check_database: true,
            max_depth: DEFAULT_MAX_DEPTH,
            rules_dir: PathBuf::from("rules"),
            duplicate_strategy: DuplicateStrategy::Identifier.name().to_string(),
            composite_fields: Vec::new(),
            case_sensitive: false,
            disabled_validators: Vec::new(),
            max_report_lines: 50,
        }
    }
}

impl ValidationSettings {
    /// Defaults, then the settings file, then `IMPORTGUARD__*` variables.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::build(path, Self::environment())
    }

    /// Like [`load`](Self::load) but reads overrides from `vars` instead of
    /// the process environment.
    pub fn load_with_env(
        path: Option<&Path>,
        vars: config::Map<String, String>,
    ) -> Result<Self, SettingsError> {
        Self::build(path, Self::environment().source(Some(vars)))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("composite_fields")
            .with_list_parse_key("disabled_validators")
    }

    #[instrument(skip(environment))]
    fn build(path: Option<&Path>, environment: Environment) -> Result<Self, SettingsError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_FILE).required(false)),
        };

        let settings: Self = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        settings.validate()?;

        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_depth == 0 {
            return Err(SettingsError::Invalid {
                key: "max_depth",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_report_lines == 0 {
            return Err(SettingsError::Invalid {
                key: "max_report_lines",
                reason: "must be at least 1".into(),
            });
        }
        self.strategy().map(|_| ())
    }

    /// The configured duplicate strategy.
    ///
    /// `composite` takes its columns from `composite_fields`.
    pub fn strategy(&self) -> Result<DuplicateStrategy, SettingsError> {
        let name = self.duplicate_strategy.trim();
        if name.eq_ignore_ascii_case("composite") {
            if self.composite_fields.is_empty() {
                return Err(SettingsError::Invalid {
                    key: "composite_fields",
                    reason: "the composite strategy needs at least one field".into(),
                });
            }
            return Ok(DuplicateStrategy::Composite(self.composite_fields.clone()));
        }

        name.parse::<DuplicateStrategy>().map_err(|e| SettingsError::Invalid {
            key: "duplicate_strategy",
            reason: e.to_string(),
        })
    }

    pub fn options(&self) -> ValidationOptions {
        let mut options = ValidationOptions {
            check_database: self.check_database,
            max_depth: self.max_depth,
            ..ValidationOptions::default()
        };
        for name in &self.disabled_validators {
            options = options.disable(name.trim());
        }
        options
    }

    pub fn rule_loading(&self) -> RuleLoading {
        RuleLoading {
            strict: self.strict,
        }
    }

    pub fn rule_source(&self) -> FileRuleSource {
        FileRuleSource::new(&self.rules_dir)
    }

    /// Pipeline wiring for these settings, reading rules from `rules_dir`.
    pub fn pipeline_deps(
        &self,
        store: Option<Arc<dyn CatalogStore>>,
    ) -> Result<PipelineDeps, SettingsError> {
        let loader = RuleLoader::new(Arc::new(self.rule_source()), self.rule_loading());
        let mut deps = PipelineDeps::new(loader)
            .with_strategy(self.strategy()?)
            .case_sensitive(self.case_sensitive);
        if let Some(store) = store {
            deps = deps.with_store(store);
        }
        Ok(deps)
    }

    /// Human-readable report lines, capped at `max_report_lines`.
    pub fn report_lines(&self, report: &ValidationReport) -> Vec<String> {
        report.to_lines(self.max_report_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_lenient_and_online() {
        let s = ValidationSettings::default();

        assert!(!s.strict);
        assert!(s.check_database);
        assert_eq!(s.max_depth, 10);
        assert_eq!(s.strategy().unwrap(), DuplicateStrategy::Identifier);
        assert_eq!(s.options(), ValidationOptions::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("importguard.toml");
        fs::write(
            &path,
            r#"
strict = true
max_depth = 4
rules_dir = "/srv/rules"
duplicate_strategy = "title_date"
disabled_validators = ["duplicate"]
"#,
        )
        .unwrap();

        let s = ValidationSettings::load_with_env(Some(&path), vars(&[])).unwrap();

        assert!(s.strict);
        assert_eq!(s.max_depth, 4);
        assert_eq!(s.rules_dir, PathBuf::from("/srv/rules"));
        assert_eq!(s.strategy().unwrap(), DuplicateStrategy::TitleDate);
        assert!(!s.options().is_enabled("duplicate"));
        assert!(s.check_database);
    }

    #[test]
    fn environment_beats_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "max_depth = 4\n").unwrap();

        let s = ValidationSettings::load_with_env(
            Some(&path),
            vars(&[
                ("IMPORTGUARD__MAX_DEPTH", "7"),
                ("IMPORTGUARD__CHECK_DATABASE", "false"),
                ("IMPORTGUARD__DUPLICATE_STRATEGY", "composite"),
                ("IMPORTGUARD__COMPOSITE_FIELDS", "title,repository"),
            ]),
        )
        .unwrap();

        assert_eq!(s.max_depth, 7);
        assert!(!s.options().check_database);
        assert_eq!(
            s.strategy().unwrap(),
            DuplicateStrategy::Composite(vec!["title".into(), "repository".into()])
        );
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = ValidationSettings::load_with_env(Some(&missing), vars(&[])).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }

    #[test]
    fn rejects_unusable_values() {
        let s = ValidationSettings {
            max_depth: 0,
            ..ValidationSettings::default()
        };
        assert!(s.validate().is_err());

        let s = ValidationSettings {
            duplicate_strategy: "fuzzy".into(),
            ..ValidationSettings::default()
        };
        assert!(matches!(
            s.strategy(),
            Err(SettingsError::Invalid { key: "duplicate_strategy", .. })
        ));

        let s = ValidationSettings {
            duplicate_strategy: "composite".into(),
            ..ValidationSettings::default()
        };
        let err: ImportGuardError = s.validate().unwrap_err().into();
        assert!(matches!(err, ImportGuardError::Configuration { .. }));
    }
}
