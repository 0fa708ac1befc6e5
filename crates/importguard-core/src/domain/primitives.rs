//! Primitive field checks shared by every validator.
//!
//! All checks are total and non-panicking. Each is vacuously true on blank
//! input: presence is the job of the `required` rule, not of the type,
//! pattern, length, or enum checks.

use std::{fmt, str::FromStr, sync::OnceLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

// ── FieldType ────────────────────────────────────────────────────────────────

/// Declared type of a field in a rule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Email,
    Url,
    String,
}

impl FieldType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Email => "email",
            Self::Url => "url",
            Self::String => "string",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "float" | "double" | "decimal" | "number" | "numeric" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" | "timestamp" => Ok(Self::DateTime),
            "email" => Ok(Self::Email),
            "url" | "uri" => Ok(Self::Url),
            "string" | "text" => Ok(Self::String),
            other => Err(DomainError::UnknownFieldType {
                type_name: other.to_string(),
            }),
        }
    }
}

// ── Type check ───────────────────────────────────────────────────────────────

/// Absolute date layouts accepted for `date` fields.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d %B %Y",
    "%d %b %Y", "%B %d, %Y", "%b %d, %Y",
];

/// Layouts accepted for `datetime` fields (RFC 3339 is tried first).
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const BOOLEAN_LITERALS: &[&str] = &["true", "false", "1", "0", "yes", "no", "on", "off", "y", "n"];

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("static regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("static regex")
    })
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)(https?|ftp|sftp)://[^\s/?#]+\.[^\s/?#]+(?::\d+)?(?:[/?#]\S*)?$|^(?i)(https?)://localhost(?::\d+)?(?:[/?#]\S*)?$")
            .expect("static regex")
    })
}

/// Free-text archival dates: years, year-months, circa, ranges, decades.
fn fuzzy_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)^(
                (c\.?|ca\.?|circa)\s*\d{3,4}s?           # c. 1920, circa 1850s
              | \d{3,4}\s*[-–/]\s*\d{3,4}                # 1914-1918
              | \d{3,4}s                                 # 1960s
              | \d{4}(-\d{2})?                           # 1999, 1999-07
              | (c\.?|ca\.?|circa)\s*\d{3,4}\s*[-–]\s*\d{3,4}
            )$",
        )
        .expect("static regex")
    })
}

/// Whether `value` is a well-formed instance of `field_type`.
///
/// Blank input is vacuously valid.
pub fn validate_type(value: &str, field_type: FieldType) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }

    match field_type {
        FieldType::Integer => integer_re().is_match(value),
        FieldType::Float => value.parse::<f64>().is_ok_and(f64::is_finite),
        FieldType::Boolean => BOOLEAN_LITERALS
            .iter()
            .any(|b| b.eq_ignore_ascii_case(value)),
        FieldType::Date => is_date(value),
        FieldType::DateTime => is_datetime(value),
        FieldType::Email => email_re().is_match(value),
        FieldType::Url => url_re().is_match(value),
        FieldType::String => true,
    }
}

/// Absolute date in one of [`DATE_FORMATS`], or an archival free-text date.
pub fn is_date(value: &str) -> bool {
    parse_date(value).is_some() || fuzzy_date_re().is_match(value.trim())
}

/// Parse an absolute date, ignoring free-text forms.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse a date-time, falling back to a bare date at midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date(value).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn is_datetime(value: &str) -> bool {
    parse_datetime(value).is_some()
}

// ── Pattern check ────────────────────────────────────────────────────────────

/// Compile a rule-document pattern.
///
/// Accepts bare regexes (`^\d+$`) and delimited ones (`/^\d+$/i`). Flags
/// `i`, `m`, `s`, `x` map onto the regex builder; `u` is accepted and ignored
/// since matching is always Unicode-aware.
pub fn compile_pattern(raw: &str) -> Result<Regex, regex::Error> {
    let (body, flags) = split_delimited(raw).unwrap_or((raw, ""));

    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            _ => {}
        }
    }
    builder.build()
}

/// `/body/flags` → `(body, flags)`, or `None` when not delimited.
fn split_delimited(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    flags
        .chars()
        .all(|c| "imsxuU".contains(c))
        .then_some((body, flags))
}

/// Whether `value` matches `pattern`. Blank input is vacuously valid.
pub fn validate_pattern(value: &str, pattern: &Regex) -> bool {
    let value = value.trim();
    value.is_empty() || pattern.is_match(value)
}

// ── Length check ─────────────────────────────────────────────────────────────

/// Whether `value` has at most `max` characters (not bytes).
pub fn validate_max_length(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

// ── Enum check ───────────────────────────────────────────────────────────────

/// Whether `value` is one of `allowed`. Blank input is vacuously valid.
pub fn validate_enum(value: &str, allowed: &[String], case_sensitive: bool) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    allowed.iter().any(|candidate| {
        let candidate = candidate.trim();
        if case_sensitive {
            candidate == value
        } else {
            candidate.to_lowercase() == value.to_lowercase()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Type checks
    // ========================================================================

    #[test]
    fn integer_rejects_fractions_and_accepts_blank() {
        assert!(validate_type("12", FieldType::Integer));
        assert!(validate_type("-7", FieldType::Integer));
        assert!(!validate_type("12.5", FieldType::Integer));
        assert!(!validate_type("twelve", FieldType::Integer));
        assert!(validate_type("", FieldType::Integer));
        assert!(validate_type("   ", FieldType::Integer));
    }

    #[test]
    fn float_and_boolean() {
        assert!(validate_type("12.5", FieldType::Float));
        assert!(validate_type("3", FieldType::Float));
        assert!(!validate_type("NaN", FieldType::Float));
        assert!(!validate_type("1,5", FieldType::Float));

        assert!(validate_type("Yes", FieldType::Boolean));
        assert!(validate_type("0", FieldType::Boolean));
        assert!(!validate_type("maybe", FieldType::Boolean));
    }

    #[test]
    fn date_accepts_absolute_and_archival_forms() {
        for ok in [
            "2024-02-29",
            "29/02/2024",
            "2024/02/29",
            "12 March 1901",
            "March 12, 1901",
            "c. 1920",
            "circa 1850",
            "ca.1700",
            "1914-1918",
            "1960s",
            "1999",
            "1999-07",
        ] {
            assert!(validate_type(ok, FieldType::Date), "expected '{ok}' to pass");
        }

        for bad in ["2023-02-30", "yesterday", "19", "12/13/14/15"] {
            assert!(!validate_type(bad, FieldType::Date), "expected '{bad}' to fail");
        }
    }

    #[test]
    fn datetime_formats() {
        assert!(validate_type("2024-01-05 10:30:00", FieldType::DateTime));
        assert!(validate_type("2024-01-05T10:30:00Z", FieldType::DateTime));
        assert!(validate_type("2024-01-05", FieldType::DateTime));
        assert!(!validate_type("10:30", FieldType::DateTime));
    }

    #[test]
    fn email_and_url() {
        assert!(validate_type("archivist@example.org", FieldType::Email));
        assert!(!validate_type("archivist@", FieldType::Email));
        assert!(!validate_type("no at sign", FieldType::Email));

        assert!(validate_type("https://example.org/item/1?x=2", FieldType::Url));
        assert!(validate_type("http://localhost:8080/", FieldType::Url));
        assert!(!validate_type("example.org", FieldType::Url));
        assert!(!validate_type("https://", FieldType::Url));
    }

    #[test]
    fn string_always_passes() {
        assert!(validate_type("anything at all", FieldType::String));
    }

    #[test]
    fn field_type_parses_aliases() {
        assert_eq!("INT".parse::<FieldType>().unwrap(), FieldType::Integer);
        assert_eq!("number".parse::<FieldType>().unwrap(), FieldType::Float);
        assert_eq!("text".parse::<FieldType>().unwrap(), FieldType::String);
        assert!("blob".parse::<FieldType>().is_err());
    }

    // ========================================================================
    // Pattern / length / enum
    // ========================================================================

    #[test]
    fn delimited_patterns_honour_flags() {
        let re = compile_pattern("/^ab-\\d+$/i").unwrap();
        assert!(validate_pattern("AB-12", &re));
        assert!(!validate_pattern("AB-x", &re));
        assert!(validate_pattern("", &re));

        let bare = compile_pattern(r"^\d{4}$").unwrap();
        assert!(validate_pattern("1999", &bare));
        assert!(!validate_pattern("99", &bare));
    }

    #[test]
    fn slash_inside_bare_pattern_is_not_a_delimiter() {
        let re = compile_pattern(r"^\d+/\d+$").unwrap();
        assert!(re.is_match("3/4"));
    }

    #[test]
    fn max_length_counts_characters() {
        assert!(validate_max_length("hello", 5));
        assert!(!validate_max_length("hello!", 5));
        assert!(validate_max_length("ééééé", 5));
        assert!(validate_max_length("", 0));
    }

    #[test]
    fn enum_is_case_insensitive_by_default() {
        let allowed = vec!["Fonds".to_string(), "Item".to_string()];
        assert!(validate_enum("fonds", &allowed, false));
        assert!(!validate_enum("fonds", &allowed, true));
        assert!(validate_enum("Fonds", &allowed, true));
        assert!(!validate_enum("Series", &allowed, false));
        assert!(validate_enum("", &allowed, true));
    }
}
