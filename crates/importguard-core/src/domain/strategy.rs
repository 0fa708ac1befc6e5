//! Duplicate-detection strategies.
//!
//! A strategy decides which fields of a row form its duplicate key. Each
//! variant has one pure key/hash/display path; there is no string dispatch.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{
    error::DomainError,
    row::Row,
    rules::{DEFAULT_LEGACY_ID_FIELDS, ReferentialRules},
};

/// Hash of an all-blank key. Rows hashing to this are never duplicates.
///
/// This is the SHA-256 of the empty string.
pub const EMPTY_KEY_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Columns tried for a title.
pub const TITLE_FIELDS: &[&str] = &["title", "objectName", "object_name"];
/// Columns tried for a date.
pub const DATE_FIELDS: &[&str] = &["date", "dateCreated", "date_created", "eventDates"];

const KEY_SEPARATOR: &str = "|";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy", content = "fields")]
pub enum DuplicateStrategy {
    /// Exact identifier.
    #[default]
    Identifier,
    /// Legacy id from the source system (`legacyId`, then `legacy_id`,
    /// unless the rule document names the column).
    LegacyId,
    /// Title plus date, in that order.
    TitleDate,
    /// Any ordered list of columns.
    Composite(Vec<String>),
}

impl DuplicateStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::LegacyId => "legacy_id",
            Self::TitleDate => "title_date",
            Self::Composite(_) => "composite",
        }
    }

    /// Column a duplicate issue is reported against.
    ///
    /// Identifier and legacy-id strategies follow `columns`, so issues land
    /// on the column the sector actually uses.
    pub fn primary_column(&self, columns: &ReferentialRules) -> String {
        match self {
            Self::Identifier => columns.identifier_field().to_string(),
            Self::LegacyId => columns
                .legacy_id_fields()
                .into_iter()
                .next()
                .unwrap_or_else(|| DEFAULT_LEGACY_ID_FIELDS[0].to_string()),
            Self::TitleDate => TITLE_FIELDS[0].to_string(),
            Self::Composite(fields) => fields
                .first()
                .cloned()
                .unwrap_or_else(|| columns.identifier_field().to_string()),
        }
    }

    /// Raw key components of `row`, blank where the field is missing.
    pub fn key_parts(&self, row: &Row, columns: &ReferentialRules) -> Vec<String> {
        let pick = |v: Option<&str>| v.unwrap_or_default().to_string();
        match self {
            Self::Identifier => vec![pick(row.get_trimmed(columns.identifier_field()))],
            Self::LegacyId => vec![pick(row.first_of_owned(&columns.legacy_id_fields()))],
            Self::TitleDate => vec![
                pick(row.first_of(TITLE_FIELDS)),
                pick(row.first_of(DATE_FIELDS)),
            ],
            Self::Composite(fields) => fields.iter().map(|f| pick(row.get_trimmed(f))).collect(),
        }
    }

    /// Normalized key: trimmed, lower-cased unless `case_sensitive`.
    ///
    /// Each part is length-prefixed, so separators inside values cannot make
    /// two different keys collide. An all-blank key normalizes to the empty
    /// string.
    pub fn normalized_key(
        &self,
        row: &Row,
        columns: &ReferentialRules,
        case_sensitive: bool,
    ) -> String {
        let parts: Vec<String> = self
            .key_parts(row, columns)
            .into_iter()
            .map(|p| {
                let p = p.trim();
                if case_sensitive {
                    p.to_string()
                } else {
                    p.to_lowercase()
                }
            })
            .collect();

        if parts.iter().all(String::is_empty) {
            return String::new();
        }
        parts
            .iter()
            .map(|p| format!("{}:{p}", p.len()))
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    /// Hex SHA-256 of the normalized key; [`EMPTY_KEY_HASH`] for blank keys.
    pub fn generate_hash(
        &self,
        row: &Row,
        columns: &ReferentialRules,
        case_sensitive: bool,
    ) -> String {
        let key = self.normalized_key(row, columns, case_sensitive);
        format!("{:x}", Sha256::digest(key.as_bytes()))
    }

    /// Human form of the key for messages, e.g. `"Minute book (1901)"`.
    pub fn display(&self, row: &Row, columns: &ReferentialRules) -> String {
        let parts = self.key_parts(row, columns);
        match self {
            Self::TitleDate => match (parts[0].as_str(), parts[1].as_str()) {
                (title, "") => title.to_string(),
                (title, date) => format!("{title} ({date})"),
            },
            _ => parts
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl fmt::Display for DuplicateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composite(fields) => write!(f, "composite({})", fields.join(", ")),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for DuplicateStrategy {
    type Err = DomainError;

    /// Parses `identifier`, `legacy_id`, `title_date`, or
    /// `composite:field_a,field_b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, args) = s.split_once(':').unwrap_or((s, ""));
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "identifier" | "id" => Ok(Self::Identifier),
            "legacy_id" | "legacyid" => Ok(Self::LegacyId),
            "title_date" | "titledate" => Ok(Self::TitleDate),
            "composite" => {
                let fields: Vec<String> = args
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect();
                if fields.is_empty() {
                    Err(DomainError::UnknownStrategy {
                        name: format!("{s} (composite needs at least one field)"),
                    })
                } else {
                    Ok(Self::Composite(fields))
                }
            }
            _ => Err(DomainError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}
