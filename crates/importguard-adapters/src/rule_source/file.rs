//! Filesystem rule source.
//!
//! # Directory layout expected
//!
//! ```text
//! rules/
//! ├── archive.toml
//! ├── museum.json
//! └── dam.toml
//! ```
//!
//! # `<sector>.toml` format
//!
//! ```toml
//! required = ["identifier", "title"]
//!
//! [types]
//! extent = "integer"
//! dateCreated = "date"
//!
//! [patterns]
//! identifier = "/^[A-Z]{2}-\\d+$/i"
//!
//! [maxLengths]
//! title = 1024
//!
//! [enums]
//! levelOfDescription = ["Fonds", "Series", "File", "Item"]
//!
//! [referential]
//! identifierField = "identifier"
//! parentField = "parentId"
//! maxDepth = 8
//! ```
//!
//! Any other top-level key makes the document malformed.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use importguard_core::{
    application::{ApplicationError, ports::RuleSource},
    domain::{DomainError, RuleDocument},
    error::CoreResult,
};

/// Reads `<dir>/<sector>.toml`, falling back to `<dir>/<sector>.json`.
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    dir: PathBuf,
}

impl FileRuleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sector codes with a document in the directory, sorted.
    pub fn sectors(&self) -> CoreResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| self.failed("*", &e))?;

        let mut sectors: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("toml" | "json")
                )
            })
            .filter_map(|path| path.file_stem()?.to_str().map(String::from))
            .collect();
        sectors.sort();
        sectors.dedup();
        Ok(sectors)
    }

    fn failed(&self, sector: &str, e: &io::Error) -> ApplicationError {
        ApplicationError::RuleSourceFailed {
            sector: sector.to_string(),
            reason: format!("{}: {e}", self.dir.display()),
        }
    }

    /// Contents of `path`, or `None` if it does not exist.
    fn read(&self, sector: &str, path: &Path) -> CoreResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.failed(sector, &e).into()),
        }
    }
}

/// Sector codes become file names, so only plain names are accepted.
fn is_plain_code(sector: &str) -> bool {
    !sector.is_empty()
        && sector
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl RuleSource for FileRuleSource {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    fn load(&self, sector: &str) -> CoreResult<Option<RuleDocument>> {
        if !is_plain_code(sector) {
            return Err(ApplicationError::RuleSourceFailed {
                sector: sector.to_string(),
                reason: "sector codes may only contain letters, digits, '-' and '_'".into(),
            }
            .into());
        }

        let toml_path = self.dir.join(format!("{sector}.toml"));
        if let Some(raw) = self.read(sector, &toml_path)? {
            debug!(path = %toml_path.display(), "reading TOML rules");
            let doc = toml::from_str(&raw).map_err(|e| DomainError::InvalidRuleDocument {
                sector: sector.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Some(doc));
        }

        let json_path = self.dir.join(format!("{sector}.json"));
        if let Some(raw) = self.read(sector, &json_path)? {
            debug!(path = %json_path.display(), "reading JSON rules");
            return Ok(Some(RuleDocument::from_json_str(sector, &raw)?));
        }

        debug!("no rule document on disk");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use importguard_core::error::ImportGuardError;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) {
        fs::write(dir.path().join(name), body).unwrap();
    }

    #[test]
    fn reads_toml_documents() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "archive.toml",
            r#"
required = ["identifier"]

[maxLengths]
title = 10

[referential]
parentField = "partOf"
"#,
        );

        let doc = FileRuleSource::new(dir.path())
            .load("archive")
            .unwrap()
            .unwrap();

        assert_eq!(doc.required, vec!["identifier"]);
        assert_eq!(doc.max_lengths.get("title"), Some(&10));
        assert_eq!(doc.referential.parent_fields(), vec!["partOf"]);
    }

    #[test]
    fn falls_back_to_json() {
        let dir = TempDir::new().unwrap();
        write(&dir, "museum.json", r#"{"enums": {"level": ["Item"]}}"#);

        let doc = FileRuleSource::new(dir.path())
            .load("museum")
            .unwrap()
            .unwrap();
        assert_eq!(doc.enums["level"], vec!["Item"]);
    }

    #[test]
    fn missing_document_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(FileRuleSource::new(dir.path()).load("dam").unwrap().is_none());
    }

    #[test]
    fn unknown_keys_are_malformed() {
        let dir = TempDir::new().unwrap();
        write(&dir, "library.toml", "requird = [\"title\"]\n");

        let err = FileRuleSource::new(dir.path())
            .load("library")
            .unwrap_err();
        assert!(matches!(
            err,
            ImportGuardError::Domain(DomainError::InvalidRuleDocument { .. })
        ));
    }

    #[test]
    fn rejects_path_like_sector_codes() {
        let dir = TempDir::new().unwrap();
        assert!(FileRuleSource::new(dir.path()).load("../etc").is_err());
    }

    #[test]
    fn lists_sectors() {
        let dir = TempDir::new().unwrap();
        write(&dir, "dam.toml", "");
        write(&dir, "archive.json", "{}");
        write(&dir, "archive.toml", "");
        write(&dir, "notes.txt", "");

        let sectors = FileRuleSource::new(dir.path()).sectors().unwrap();
        assert_eq!(sectors, vec!["archive", "dam"]);
    }
}
