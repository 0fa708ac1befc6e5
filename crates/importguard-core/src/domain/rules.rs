//! Sector rule documents.
//!
//! A [`RuleDocument`] is the declarative constraint set for one sector
//! (archives, museum, library, gallery, dam...). It is loaded once per run
//! and never mutated afterwards.
//!
//! Recognized top-level keys, exactly:
//!
//! ```toml
//! required   = ["identifier", "title"]
//!
//! [types]
//! extent = "integer"
//!
//! [patterns]
//! identifier = "/^[A-Z]{2}-\\d+$/"
//!
//! [maxLengths]
//! title = 1024
//!
//! [enums]
//! levelOfDescription = ["Fonds", "Series", "File", "Item"]
//!
//! [referential]
//! identifierField = "identifier"
//! parentField     = "parentId"
//! maxDepth        = 12
//! ```
//!
//! Any other top-level key makes the document malformed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    primitives::{FieldType, compile_pattern},
};

/// Column holding a record's identifier unless the document overrides it.
pub const DEFAULT_IDENTIFIER_FIELD: &str = "identifier";
/// Columns tried, in order, for the parent reference.
pub const DEFAULT_PARENT_FIELDS: &[&str] = &["parentId", "parent_id", "qubitParentSlug"];
/// Columns tried, in order, for the legacy id.
pub const DEFAULT_LEGACY_ID_FIELDS: &[&str] = &["legacyId", "legacy_id"];

/// Declarative per-sector constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    /// Fields that must be present and non-blank.
    #[serde(default)]
    pub required: Vec<String>,

    /// Field name to type name (see [`FieldType`]).
    #[serde(default)]
    pub types: BTreeMap<String, String>,

    /// Field name to regex, bare or `/delimited/flags`.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,

    /// Field name to maximum character length.
    #[serde(default, rename = "maxLengths")]
    pub max_lengths: BTreeMap<String, usize>,

    /// Field name to allowed values (case-insensitive by default).
    #[serde(default)]
    pub enums: BTreeMap<String, Vec<String>>,

    /// Which columns carry identity and hierarchy.
    #[serde(default)]
    pub referential: ReferentialRules,
}

/// Referential semantics: where identity and parent links live in a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferentialRules {
    pub identifier_field: Option<String>,
    pub parent_field: Option<String>,
    pub legacy_id_field: Option<String>,
    pub max_depth: Option<usize>,
}

impl ReferentialRules {
    pub fn identifier_field(&self) -> &str {
        self.identifier_field
            .as_deref()
            .unwrap_or(DEFAULT_IDENTIFIER_FIELD)
    }

    /// Parent columns to consult, configured one first.
    pub fn parent_fields(&self) -> Vec<String> {
        fields_with_fallback(self.parent_field.as_deref(), DEFAULT_PARENT_FIELDS)
    }

    /// Legacy-id columns to consult, configured one first.
    pub fn legacy_id_fields(&self) -> Vec<String> {
        fields_with_fallback(self.legacy_id_field.as_deref(), DEFAULT_LEGACY_ID_FIELDS)
    }
}

fn fields_with_fallback(configured: Option<&str>, defaults: &[&str]) -> Vec<String> {
    match configured {
        Some(field) => vec![field.to_string()],
        None => defaults.iter().map(|f| f.to_string()).collect(),
    }
}

impl RuleDocument {
    /// The no-constraints document used when a sector has none.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Parse a JSON rule document.
    pub fn from_json_str(sector: &str, raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|e| DomainError::InvalidRuleDocument {
            sector: sector.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parsed type for `field`, if one is declared.
    ///
    /// Unknown type names yield `Some(Err(..))` so lenient callers can skip
    /// them while strict loading rejects the document.
    pub fn field_type(&self, field: &str) -> Option<Result<FieldType, DomainError>> {
        self.types.get(field).map(|t| t.parse())
    }

    /// Strict structural check: every pattern compiles, every type is known.
    pub fn validate(&self, sector: &str) -> Result<(), DomainError> {
        for (field, type_name) in &self.types {
            type_name
                .parse::<FieldType>()
                .map_err(|e| DomainError::InvalidRuleDocument {
                    sector: sector.to_string(),
                    reason: format!("field '{field}': {e}"),
                })?;
        }

        for (field, pattern) in &self.patterns {
            compile_pattern(pattern).map_err(|e| DomainError::InvalidPattern {
                field: field.clone(),
                reason: e.to_string(),
            })?;
        }

        if self.referential.max_depth == Some(0) {
            return Err(DomainError::InvalidRuleDocument {
                sector: sector.to_string(),
                reason: "referential.maxDepth must be at least 1".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_recognized_keys() {
        let raw = r#"{
            "required": ["identifier", "title"],
            "types": {"extent": "integer"},
            "patterns": {"identifier": "/^[A-Z]+-\\d+$/"},
            "maxLengths": {"title": 5},
            "enums": {"level": ["Fonds", "Item"]},
            "referential": {"parentField": "parent", "maxDepth": 4}
        }"#;

        let doc = RuleDocument::from_json_str("archive", raw).unwrap();

        assert_eq!(doc.required, vec!["identifier", "title"]);
        assert_eq!(doc.max_lengths.get("title"), Some(&5));
        assert_eq!(doc.referential.parent_fields(), vec!["parent"]);
        assert_eq!(doc.referential.max_depth, Some(4));
        assert!(doc.validate("archive").is_ok());
    }

    #[test]
    fn unknown_top_level_key_is_malformed() {
        let err = RuleDocument::from_json_str("museum", r#"{"mandatory": ["x"]}"#).unwrap_err();
        assert!(matches!(err, DomainError::InvalidRuleDocument { .. }));
    }

    #[test]
    fn empty_document_has_no_constraints() {
        let doc = RuleDocument::from_json_str("library", "{}").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.referential.identifier_field(), "identifier");
        assert_eq!(
            doc.referential.parent_fields(),
            vec!["parentId", "parent_id", "qubitParentSlug"]
        );
    }

    #[test]
    fn validate_rejects_unknown_type_and_bad_pattern() {
        let mut doc = RuleDocument::empty();
        doc.types.insert("extent".into(), "decimal128".into());
        assert!(doc.validate("s").is_err());

        let mut doc = RuleDocument::empty();
        doc.patterns.insert("code".into(), "([unclosed".into());
        assert!(matches!(
            doc.validate("s"),
            Err(DomainError::InvalidPattern { field, .. }) if field == "code"
        ));
    }

    #[test]
    fn field_type_reports_unknown_names() {
        let mut doc = RuleDocument::empty();
        doc.types.insert("a".into(), "integer".into());
        doc.types.insert("b".into(), "money".into());

        assert_eq!(doc.field_type("a"), Some(Ok(FieldType::Integer)));
        assert!(matches!(doc.field_type("b"), Some(Err(_))));
        assert_eq!(doc.field_type("c"), None);
    }
}
