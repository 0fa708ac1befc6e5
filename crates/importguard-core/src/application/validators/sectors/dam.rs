//! Digital asset management: Dublin Core and IPTC conventions.
//!
//! Almost everything here is advisory. Only a malformed MIME type and
//! out-of-range GPS coordinates are errors.

use std::{path::Path, sync::Arc, sync::OnceLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::{info, instrument};

use crate::{
    application::validators::{ValidationOptions, Validator, ValidatorState},
    domain::{Row, RuleDocument, Severity, ValidationReport},
    error::CoreResult,
};

pub const SECTOR_CODE: &str = "dam";

/// Dublin Core type vocabulary.
pub const DC_TYPES: &[&str] = &[
    "Collection",
    "Dataset",
    "Event",
    "Image",
    "InteractiveResource",
    "MovingImage",
    "PhysicalObject",
    "Service",
    "Software",
    "Sound",
    "StillImage",
    "Text",
];

/// Known file extensions and the MIME type each implies.
pub const FILE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("obj", "model/obj"),
    ("stl", "model/stl"),
    ("gltf", "model/gltf+json"),
    ("glb", "model/gltf-binary"),
];

/// Substrings that mark a recognised rights statement.
pub const RIGHTS_STATEMENTS: &[&str] = &[
    "Public Domain",
    "Creative Commons",
    "CC BY",
    "CC BY-SA",
    "CC BY-NC",
    "CC BY-NC-SA",
    "CC BY-ND",
    "CC BY-NC-ND",
    "CC0",
    "All Rights Reserved",
    "Copyright",
    "In Copyright",
    "No Known Copyright",
    "Orphan Work",
];

const TYPE_FIELDS: &[&str] = &["type", "dc_type", "dcType"];
const FORMAT_FIELDS: &[&str] = &["format", "dc_format", "fileFormat"];
const FILENAME_FIELDS: &[&str] = &["filename", "file_name"];
const MIME_FIELDS: &[&str] = &["formatMimeType", "mimeType", "mime_type"];
const DIMENSION_FIELDS: &[&str] = &["dimensions", "imageDimensions"];
const RESOLUTION_FIELDS: &[&str] = &["resolution", "dpi"];
const SIZE_FIELDS: &[&str] = &["fileSize", "file_size"];
const RIGHTS_FIELDS: &[&str] = &["rights", "dc_rights", "dcRights"];
const LATITUDE_FIELDS: &[&str] = &["gpsLatitude", "latitude", "lat"];
const LONGITUDE_FIELDS: &[&str] = &["gpsLongitude", "longitude", "lon", "lng"];
const DATE_CREATED_FIELDS: &[&str] = &["dateCreated", "date_created", "dc_date"];

const MAX_DIMENSION: u64 = 50_000;
const MIN_DPI: u64 = 72;
const MAX_DPI: u64 = 2_400;
const MIN_FILE_BYTES: u64 = 100;
const LARGE_FILE_BYTES: u64 = 10 * 1024 * 1024 * 1024;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn mime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[a-z]+/[a-z0-9.+-]+$").expect("static regex"))
}

fn dimensions_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+)\s*[x×]\s*(\d+)$").expect("static regex"))
}

fn first_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

fn size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(B|KB|MB|GB|TB)?$").expect("static regex")
    })
}

/// MIME type implied by a lower-case file extension.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    FILE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Lower-cased extension of `filename`, if it has one.
fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Parse `"2048"`, `"1.5 MB"`, `"3gb"`, ... into bytes.
pub fn parse_size_to_bytes(raw: &str) -> Option<u64> {
    let caps = size_re().captures(raw.trim())?;
    let value: f64 = caps[1].parse().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_uppercase())
        .unwrap_or_else(|| "B".to_string());
    let factor = match unit.as_str() {
        "KB" => 1024.0,
        "MB" => 1024.0 * 1024.0,
        "GB" => GIB,
        "TB" => GIB * 1024.0,
        _ => 1.0,
    };
    Some((value * factor) as u64)
}

/// ISO date, `date time`, or a full ISO 8601 timestamp.
fn parse_iso_created(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
}

/// Dublin Core / IPTC checks for digital asset batches.
pub struct DamValidator {
    state: ValidatorState,
    now: Option<DateTime<Utc>>,
}

impl Default for DamValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DamValidator {
    pub fn new() -> Self {
        Self {
            state: ValidatorState::default(),
            now: None,
        }
    }

    /// Pin "now" for the future-date check.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn add(&mut self, row: &Row, column: &str, message: String, severity: Severity, rule: &str) {
        self.state.add(row.number(), column, message, severity, rule);
    }

    /// Run every DAM check on one row; returns `false` if any error was added.
    pub fn validate_row(&mut self, row: &Row) -> bool {
        let before = self.state.report.error_count();

        self.check_dc_type(row);
        self.check_file_format(row);
        self.check_mime_type(row);
        self.check_dimensions(row);
        self.check_file_size(row);
        self.check_rights(row);
        self.check_gps(row);
        self.check_date_created(row);

        self.state.report.error_count() == before
    }

    fn check_dc_type(&mut self, row: &Row) {
        let Some(value) = row.first_of(TYPE_FIELDS) else {
            self.add(
                row,
                "type",
                "Dublin Core type is recommended for digital assets".into(),
                Severity::Info,
                "dc_type_recommended",
            );
            return;
        };

        if !DC_TYPES.iter().any(|t| t.eq_ignore_ascii_case(value)) {
            let message = format!(
                "Type '{value}' is not a standard Dublin Core type. Valid types: {}",
                DC_TYPES.join(", ")
            );
            self.add(row, "type", message, Severity::Warning, "dc_type_nonstandard");
        }
    }

    fn check_file_format(&mut self, row: &Row) {
        let filename = row.first_of(FILENAME_FIELDS);
        if filename.is_none() && row.first_of(FORMAT_FIELDS).is_none() {
            self.add(
                row,
                "format",
                "File format or filename is recommended for digital assets".into(),
                Severity::Info,
                "dc_format_recommended",
            );
            return;
        }

        let Some(filename) = filename else {
            return;
        };
        match extension(filename) {
            None => self.add(
                row,
                "filename",
                "Filename should include a file extension".into(),
                Severity::Warning,
                "dam_filename_extension",
            ),
            Some(ext) if mime_for_extension(&ext).is_none() => self.add(
                row,
                "filename",
                format!("File extension '{ext}' is not a recognized format"),
                Severity::Info,
                "dam_extension_unknown",
            ),
            Some(_) => {}
        }
    }

    fn check_mime_type(&mut self, row: &Row) {
        let Some(mime) = row.first_of(MIME_FIELDS).map(str::to_ascii_lowercase) else {
            return;
        };

        if !mime_re().is_match(&mime) {
            self.add(
                row,
                "formatMimeType",
                format!("Invalid MIME type format: '{mime}'"),
                Severity::Error,
                "dam_mimetype_format",
            );
            return;
        }

        let expected = row
            .first_of(FILENAME_FIELDS)
            .and_then(extension)
            .and_then(|ext| mime_for_extension(&ext).map(|m| (ext, m)));
        if let Some((ext, expected)) = expected {
            if mime != expected {
                self.add(
                    row,
                    "formatMimeType",
                    format!(
                        "MIME type '{mime}' does not match file extension '{ext}' (expected '{expected}')"
                    ),
                    Severity::Warning,
                    "dam_mimetype_mismatch",
                );
            }
        }
    }

    fn check_dimensions(&mut self, row: &Row) {
        if let Some(dimensions) = row.first_of(DIMENSION_FIELDS) {
            match dimensions_re().captures(dimensions) {
                None => self.add(
                    row,
                    "dimensions",
                    format!(
                        "Dimensions '{dimensions}' should be in format 'Width x Height' (e.g., '1920x1080')"
                    ),
                    Severity::Warning,
                    "dam_dimensions_format",
                ),
                Some(caps) => {
                    let width: u64 = caps[1].parse().unwrap_or(u64::MAX);
                    let height: u64 = caps[2].parse().unwrap_or(u64::MAX);
                    if width > MAX_DIMENSION || height > MAX_DIMENSION {
                        self.add(
                            row,
                            "dimensions",
                            format!(
                                "Image dimensions ({width}x{height}) are unusually large - please verify"
                            ),
                            Severity::Warning,
                            "dam_dimensions_large",
                        );
                    }
                }
            }
        }

        let dpi = row
            .first_of(RESOLUTION_FIELDS)
            .and_then(|r| first_number_re().find(r))
            .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX));
        match dpi {
            Some(dpi) if dpi < MIN_DPI => self.add(
                row,
                "resolution",
                format!("Resolution ({dpi} dpi) is below web standard ({MIN_DPI} dpi)"),
                Severity::Info,
                "dam_resolution_low",
            ),
            Some(dpi) if dpi > MAX_DPI => self.add(
                row,
                "resolution",
                format!("Resolution ({dpi} dpi) is unusually high - please verify"),
                Severity::Info,
                "dam_resolution_high",
            ),
            _ => {}
        }
    }

    fn check_file_size(&mut self, row: &Row) {
        let Some(raw) = row.first_of(SIZE_FIELDS) else {
            return;
        };

        let Some(bytes) = parse_size_to_bytes(raw) else {
            self.add(
                row,
                "fileSize",
                format!("Could not parse file size: '{raw}'"),
                Severity::Warning,
                "dam_filesize_format",
            );
            return;
        };

        if bytes < MIN_FILE_BYTES {
            self.add(
                row,
                "fileSize",
                format!("File size ({bytes} bytes) is suspiciously small"),
                Severity::Warning,
                "dam_filesize_small",
            );
        }
        if bytes > LARGE_FILE_BYTES {
            self.add(
                row,
                "fileSize",
                format!("File size ({:.2} GB) is very large", bytes as f64 / GIB),
                Severity::Info,
                "dam_filesize_large",
            );
        }
    }

    fn check_rights(&mut self, row: &Row) {
        let Some(rights) = row.first_of(RIGHTS_FIELDS) else {
            self.add(
                row,
                "rights",
                "Rights information is important for digital assets".into(),
                Severity::Warning,
                "dc_rights_recommended",
            );
            return;
        };

        let lowered = rights.to_lowercase();
        let known = RIGHTS_STATEMENTS
            .iter()
            .any(|s| lowered.contains(&s.to_lowercase()));
        if !known {
            self.add(
                row,
                "rights",
                "Consider using a standard rights statement (e.g., Creative Commons, Public Domain)"
                    .into(),
                Severity::Info,
                "dc_rights_nonstandard",
            );
        }
    }

    fn check_gps(&mut self, row: &Row) {
        let lat = row.first_of(LATITUDE_FIELDS);
        let lon = row.first_of(LONGITUDE_FIELDS);

        if let Some(lat) = lat {
            if !lat.parse::<f64>().is_ok_and(|v| (-90.0..=90.0).contains(&v)) {
                self.add(
                    row,
                    "gpsLatitude",
                    format!("Latitude '{lat}' is out of valid range (-90 to 90)"),
                    Severity::Error,
                    "dam_latitude_range",
                );
                return;
            }
        }
        if let Some(lon) = lon {
            if !lon
                .parse::<f64>()
                .is_ok_and(|v| (-180.0..=180.0).contains(&v))
            {
                self.add(
                    row,
                    "gpsLongitude",
                    format!("Longitude '{lon}' is out of valid range (-180 to 180)"),
                    Severity::Error,
                    "dam_longitude_range",
                );
                return;
            }
        }

        if lat.is_some() != lon.is_some() {
            self.add(
                row,
                "gpsLatitude",
                "Both latitude and longitude should be provided together".into(),
                Severity::Warning,
                "dam_gps_incomplete",
            );
        }
    }

    fn check_date_created(&mut self, row: &Row) {
        let Some(raw) = row.first_of(DATE_CREATED_FIELDS) else {
            self.add(
                row,
                "dateCreated",
                "Date created is recommended for digital assets".into(),
                Severity::Info,
                "dc_date_recommended",
            );
            return;
        };

        match parse_iso_created(raw) {
            None => self.add(
                row,
                "dateCreated",
                format!("Date '{raw}' should preferably be in ISO format (YYYY-MM-DD)"),
                Severity::Info,
                "dc_date_format",
            ),
            Some(created) => {
                let now = self.now.unwrap_or_else(Utc::now).naive_utc();
                if created > now {
                    self.add(
                        row,
                        "dateCreated",
                        "Date created is in the future".into(),
                        Severity::Warning,
                        "dc_date_future",
                    );
                }
            }
        }
    }
}

impl Validator for DamValidator {
    fn name(&self) -> &'static str {
        SECTOR_CODE
    }

    fn title(&self) -> &str {
        "DAM (Dublin Core/IPTC) Validation"
    }

    fn set_sector(&mut self, sector: &str, rules: Arc<RuleDocument>) {
        self.state.set_sector(sector, rules);
    }

    fn set_report(&mut self, report: ValidationReport) {
        self.state.report = report;
    }

    fn report(&self) -> &ValidationReport {
        &self.state.report
    }

    #[instrument(skip_all, fields(validator = "dam", rows = rows.len()))]
    fn validate_file(
        &mut self,
        rows: &[Row],
        _options: &ValidationOptions,
    ) -> CoreResult<ValidationReport> {
        self.state.begin(rows.len());
        for row in rows {
            self.validate_row(row);
        }

        let report = self.state.finish();
        info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "dam validation finished"
        );
        Ok(report)
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowNumber;
    use chrono::TimeZone;

    fn validator() -> DamValidator {
        DamValidator::new().at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    fn complete() -> Row {
        Row::new(1)
            .with("type", "StillImage")
            .with("filename", "harbour.jpg")
            .with("mimeType", "image/jpeg")
            .with("dimensions", "1920 x 1080")
            .with("resolution", "300 dpi")
            .with("fileSize", "2.5 MB")
            .with("rights", "CC BY-SA 4.0")
            .with("gpsLatitude", "-33.9")
            .with("gpsLongitude", "18.4")
            .with("dateCreated", "2019-03-14")
    }

    fn rules_of(v: &DamValidator, row: RowNumber) -> Vec<String> {
        let mut rules: Vec<String> = v
            .report()
            .issues_for_row(row)
            .iter()
            .map(|i| i.rule.clone())
            .collect();
        rules.sort();
        rules
    }

    #[test]
    fn complete_asset_is_clean() {
        let mut v = validator();
        assert!(v.validate_row(&complete()));
        assert_eq!(v.report().issue_count(), 0);
    }

    #[test]
    fn bare_row_only_gets_advice() {
        let mut v = validator();
        assert!(v.validate_row(&Row::new(3)));

        let rules = rules_of(&v, 3);
        assert_eq!(
            rules,
            vec![
                "dc_date_recommended",
                "dc_format_recommended",
                "dc_rights_recommended",
                "dc_type_recommended",
            ]
        );
    }

    #[test]
    fn nonstandard_type_is_a_warning() {
        let mut v = validator();
        v.validate_row(&complete().with("type", "photograph"));
        assert_eq!(v.report().rule_count("dc_type_nonstandard"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("type", "stillimage"));
        assert_eq!(v.report().issue_count(), 0);
    }

    #[test]
    fn filename_and_mime_consistency() {
        let mut v = validator();
        v.validate_row(&complete().with("mimeType", "image/png"));
        assert_eq!(v.report().rule_count("dam_mimetype_mismatch"), 1);

        let mut v = validator();
        assert!(!v.validate_row(&complete().with("mimeType", "jpeg")));
        assert_eq!(v.report().rule_count("dam_mimetype_format"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("filename", "README").with("mimeType", ""));
        assert_eq!(v.report().rule_count("dam_filename_extension"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("filename", "scan.xyz").with("mimeType", ""));
        assert_eq!(v.report().rule_count("dam_extension_unknown"), 1);
    }

    #[test]
    fn dimension_and_resolution_bounds() {
        let mut v = validator();
        v.validate_row(&complete().with("dimensions", "1920 by 1080"));
        assert_eq!(v.report().rule_count("dam_dimensions_format"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("dimensions", "60000×200"));
        assert_eq!(v.report().rule_count("dam_dimensions_large"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("resolution", "30"));
        assert_eq!(v.report().rule_count("dam_resolution_low"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("dpi", "4800").with("resolution", ""));
        assert_eq!(v.report().rule_count("dam_resolution_high"), 1);
    }

    #[test]
    fn parses_sizes_with_units() {
        assert_eq!(parse_size_to_bytes("2048"), Some(2048));
        assert_eq!(parse_size_to_bytes("1.5 kb"), Some(1536));
        assert_eq!(parse_size_to_bytes("2GB"), Some(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_size_to_bytes("big"), None);
    }

    #[test]
    fn file_size_sanity() {
        let mut v = validator();
        v.validate_row(&complete().with("fileSize", "12"));
        assert_eq!(v.report().rule_count("dam_filesize_small"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("fileSize", "11 GB"));
        assert_eq!(v.report().rule_count("dam_filesize_large"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("fileSize", "lots"));
        assert_eq!(v.report().rule_count("dam_filesize_format"), 1);
    }

    #[test]
    fn gps_range_and_pairing() {
        let mut v = validator();
        assert!(!v.validate_row(&complete().with("gpsLatitude", "91")));
        assert_eq!(v.report().rule_count("dam_latitude_range"), 1);

        let mut v = validator();
        assert!(!v.validate_row(&complete().with("gpsLongitude", "-180.5")));
        assert_eq!(v.report().rule_count("dam_longitude_range"), 1);

        let mut v = validator();
        assert!(v.validate_row(&complete().with("gpsLongitude", "")));
        assert_eq!(v.report().rule_count("dam_gps_incomplete"), 1);
    }

    #[test]
    fn date_created_format_and_future() {
        let mut v = validator();
        v.validate_row(&complete().with("dateCreated", "March 2019"));
        assert_eq!(v.report().rule_count("dc_date_format"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("dateCreated", "2030-01-01T10:00:00+02:00"));
        assert_eq!(v.report().rule_count("dc_date_future"), 1);

        let mut v = validator();
        v.validate_row(&complete().with("dateCreated", "2024-05-31 23:59:59"));
        assert_eq!(v.report().issue_count(), 0);
    }

    #[test]
    fn validate_file_counts_rows() {
        let mut v = validator();
        let rows = vec![complete(), Row::new(2).with("mimeType", "bad mime")];

        let report = v
            .validate_file(&rows, &ValidationOptions::offline())
            .unwrap();

        assert_eq!(report.total_rows(), 2);
        assert_eq!(report.invalid_rows(), 1);
        assert!(!report.is_valid());
    }
}
