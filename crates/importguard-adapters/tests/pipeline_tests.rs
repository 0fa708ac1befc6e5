//! End-to-end runs: rules on disk, an in-memory catalog, the full pipeline.

use std::{fs, path::Path, sync::Arc};

use importguard_adapters::{
    CachingCatalogStore, CatalogRecord, FileRuleSource, InMemoryCatalogStore, ValidationSettings,
};
use importguard_core::prelude::*;
use tempfile::TempDir;

const ARCHIVE_RULES: &str = r#"
required = ["identifier", "title"]

[types]
extent = "integer"

[enums]
level = ["Fonds", "Series", "File", "Item"]
"#;

fn rules_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, body) in files {
        fs::write(dir.path().join(name), body).unwrap();
    }
    dir
}

fn catalog() -> InMemoryCatalogStore {
    let store = InMemoryCatalogStore::new();
    store
        .insert_record(
            CatalogRecord::new(10)
                .identifier("F-EXIST")
                .title("Existing fonds"),
        )
        .unwrap();
    store.map_legacy_id("OLD-1", 10).unwrap();
    store.insert_slug("external-fonds", 10).unwrap();
    store
}

fn archive_batch() -> Vec<Row> {
    let rows: Vec<Vec<(&str, &str)>> = vec![
        vec![("identifier", "F-1"), ("title", "Fonds one"), ("level", "Fonds")],
        vec![
            ("identifier", "S-1"),
            ("title", "Series"),
            ("level", "Series"),
            ("parentId", "F-1"),
        ],
        vec![
            ("identifier", "I-1"),
            ("title", "Item"),
            ("level", "Item"),
            ("parentId", "OLD-1"),
        ],
        vec![
            ("identifier", "I-2"),
            ("title", "Item two"),
            ("level", "Item"),
            ("qubitParentSlug", "external-fonds"),
        ],
        vec![("identifier", "F-EXIST"), ("title", "Again"), ("level", "Fonds")],
        vec![
            ("identifier", "I-3"),
            ("title", " "),
            ("extent", "12.5"),
            ("level", "Box"),
            ("parentId", "NOPE"),
        ],
        vec![
            ("identifier", "I-4"),
            ("title", "Orphan"),
            ("level", "Item"),
            ("parentId", "NOPE"),
        ],
    ];
    importguard_core::domain::number_rows(rows)
}

fn deps(dir: &Path, store: Arc<dyn CatalogStore>) -> PipelineDeps {
    let loader = RuleLoader::new(Arc::new(FileRuleSource::new(dir)), RuleLoading::strict());
    PipelineDeps::new(loader).with_store(store)
}

#[test]
fn archive_batch_end_to_end() {
    let dir = rules_dir(&[("archive.toml", ARCHIVE_RULES)]);
    let store = catalog();
    let caching = Arc::new(CachingCatalogStore::new(Arc::new(store.clone())));

    let mut pipeline = ValidatorCollection::create_for_sector(
        "archive",
        "archive.csv",
        &deps(dir.path(), caching.clone()),
    )
    .unwrap();
    let report = pipeline.validate(&archive_batch()).unwrap();

    // row 6: required, type, enum, parent; row 7: parent
    assert_eq!(report.error_count(), 5);
    assert_eq!(report.rule_count("parent_not_found"), 2);
    assert_eq!(report.rule_count("duplicate_in_database"), 1);
    assert_eq!(report.issues_for_row(5)[0].severity, Severity::Info);
    assert_eq!(report.warning_count(), 0);
    assert_eq!(report.total_rows(), 7);
    assert_eq!(report.invalid_rows(), 2);
    assert_eq!(report.valid_rows(), 5);
    assert!(!report.is_valid());

    // 7 duplicate lookups, 1 for OLD-1, 3 each for external-fonds and NOPE
    assert_eq!(store.queries(), 14);

    let again = pipeline.validate(&archive_batch()).unwrap();
    assert_eq!(again.details(), report.details());
    assert_eq!(store.queries(), 14);
    assert_eq!(caching.hits(), 14);
}

#[test]
fn offline_run_skips_the_catalog() {
    let dir = rules_dir(&[("archive.toml", ARCHIVE_RULES)]);
    let store = catalog();

    let mut pipeline = ValidatorCollection::create_for_sector(
        "archive",
        "archive.csv",
        &deps(dir.path(), Arc::new(store.clone())),
    )
    .unwrap();
    let report = pipeline
        .validate_with_options(&archive_batch(), &ValidationOptions::offline())
        .unwrap();

    // OLD-1 and external-fonds can no longer be resolved
    assert_eq!(report.rule_count("parent_not_found"), 4);
    assert_eq!(report.rule_count("duplicate_in_database"), 0);
    assert_eq!(store.queries(), 0);
}

#[test]
fn settings_drive_a_dam_pipeline() {
    let dir = rules_dir(&[("dam.toml", "required = [\"identifier\"]\n")]);
    let settings_path = dir.path().join("importguard.toml");
    fs::write(
        &settings_path,
        format!(
            "rules_dir = {:?}\n\
             check_database = false\n\
             duplicate_strategy = \"title_date\"\n\
             max_report_lines = 2\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();

    let settings =
        ValidationSettings::load_with_env(Some(&settings_path), Default::default()).unwrap();
    let deps = settings
        .pipeline_deps(Some(Arc::new(InMemoryCatalogStore::new())))
        .unwrap();
    let mut pipeline = ValidatorCollection::create_for_sector("dam", "assets.csv", &deps).unwrap();
    assert_eq!(pipeline.names(), vec!["schema", "referential", "duplicate", "dam"]);

    let rows = vec![
        Row::new(1)
            .with("identifier", "A-1")
            .with("title", "Harbour")
            .with("dateCreated", "2001-05-04")
            .with("type", "StillImage")
            .with("filename", "harbour.tif")
            .with("mimeType", "image/tiff")
            .with("rights", "Public Domain"),
        Row::new(2)
            .with("identifier", "A-2")
            .with("title", "Harbour")
            .with("dateCreated", "2001-05-04")
            .with("type", "StillImage")
            .with("filename", "harbour.tif")
            .with("mimeType", "not a mime")
            .with("rights", "Public Domain"),
    ];
    let report = pipeline
        .validate_with_options(&rows, &settings.options())
        .unwrap();

    assert_eq!(report.rule_count("dam_mimetype_format"), 1);
    assert_eq!(report.rule_count("duplicate_in_file"), 1);
    assert_eq!(report.invalid_rows(), 1);

    let lines = settings.report_lines(&report);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Row 2"));
}

#[test]
fn strictness_decides_what_a_bad_document_does() {
    let dir = rules_dir(&[("library.toml", "required = [\"title\"]\nrequird = []\n")]);
    let source = Arc::new(FileRuleSource::new(dir.path()));

    let strict = PipelineDeps::new(RuleLoader::new(source.clone(), RuleLoading::strict()));
    let err = ValidatorCollection::create_for_sector("library", "books.csv", &strict)
        .err()
        .unwrap();
    assert!(matches!(err, ImportGuardError::Domain(_)));

    let lenient = PipelineDeps::new(RuleLoader::lenient(source));
    let mut pipeline =
        ValidatorCollection::create_for_sector("library", "books.csv", &lenient).unwrap();
    assert!(pipeline.rules().is_empty());

    let report = pipeline
        .validate_with_options(&[Row::new(1)], &ValidationOptions::offline())
        .unwrap();
    assert!(report.is_valid());
}

#[test]
fn summary_is_serialisable_for_dashboards() {
    let dir = rules_dir(&[("archive.toml", ARCHIVE_RULES)]);
    let mut pipeline = ValidatorCollection::create_for_sector(
        "archive",
        "archive.csv",
        &deps(dir.path(), Arc::new(catalog())),
    )
    .unwrap();
    let report = pipeline.validate(&archive_batch()).unwrap();

    let json = serde_json::to_value(report.summary()).unwrap();
    assert_eq!(json["is_valid"], false);
    assert_eq!(json["invalid_rows"], 2);
    assert_eq!(json["sector"], "archive");
    assert_eq!(json["rule_violations"]["parent_not_found"], 2);
}
