//! Hierarchy integrity: identifiers, parent links, cycles, depth, ordering.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ports::CatalogStore,
        validators::{ValidationOptions, Validator, ValidatorState},
    },
    domain::{Row, RowNumber, RuleDocument, Severity, ValidationReport},
    error::CoreResult,
};

pub const RULE_DUPLICATE_IDENTIFIER: &str = "duplicate_identifier";
pub const RULE_PARENT_NOT_FOUND: &str = "parent_not_found";
pub const RULE_CIRCULAR_REFERENCE: &str = "circular_reference";
pub const RULE_HIERARCHY_DEPTH: &str = "hierarchy_depth";
pub const RULE_HIERARCHY_ORDERING: &str = "hierarchy_ordering";

/// One identifier's row in the batch, with its parent link resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierEntry {
    pub row: Row,
    /// Column the parent link was read from.
    pub parent_column: Option<String>,
    /// Trimmed parent reference; `None` for top-level rows.
    pub parent: Option<String>,
}

impl IdentifierEntry {
    pub fn row_number(&self) -> RowNumber {
        self.row.number()
    }
}

/// Validates parent/child structure across the batch.
///
/// The identifier map built in the first pass is read-only for every later
/// pass. The first occurrence of an identifier wins.
pub struct ReferentialValidator {
    state: ValidatorState,
    store: Option<Arc<dyn CatalogStore>>,
    identifiers: HashMap<String, IdentifierEntry>,
    /// Identifiers in batch order, so every walk is deterministic.
    order: Vec<String>,
    children: BTreeMap<String, Vec<RowNumber>>,
    cyclic: HashSet<String>,
    /// Parent reference to "found in store", for the current run.
    store_cache: HashMap<String, bool>,
}

impl Default for ReferentialValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferentialValidator {
    pub fn new() -> Self {
        Self {
            state: ValidatorState::default(),
            store: None,
            identifiers: HashMap::new(),
            order: Vec::new(),
            children: BTreeMap::new(),
            cyclic: HashSet::new(),
            store_cache: HashMap::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn parent_link(&self, row: &Row) -> Option<(String, String)> {
        self.state
            .rules
            .referential
            .parent_fields()
            .into_iter()
            .find_map(|column| {
                let value = row.get_trimmed(&column)?.to_string();
                Some((column, value))
            })
    }

    /// Index every non-blank identifier; returns the number indexed.
    ///
    /// A repeated identifier is an error at the later row and leaves the
    /// earlier entry in place. Parent links are recorded in the children
    /// map for every row, collisions included.
    pub fn build_identifier_map(&mut self, rows: &[Row]) -> usize {
        self.identifiers.clear();
        self.order.clear();
        self.children.clear();
        self.cyclic.clear();

        let rules = Arc::clone(&self.state.rules);
        let id_field = rules.referential.identifier_field();

        for row in rows {
            let link = self.parent_link(row);
            if let Some((_, parent)) = &link {
                self.children
                    .entry(parent.clone())
                    .or_default()
                    .push(row.number());
            }

            let Some(identifier) = row.get_trimmed(id_field) else {
                continue;
            };

            if let Some(first) = self.identifiers.get(identifier) {
                let message = format!(
                    "Identifier '{identifier}' is already used at row {}",
                    first.row_number()
                );
                self.state.add(
                    row.number(),
                    id_field,
                    message,
                    Severity::Error,
                    RULE_DUPLICATE_IDENTIFIER,
                );
                continue;
            }

            let (parent_column, parent) = link.unzip();
            self.order.push(identifier.to_string());
            self.identifiers.insert(
                identifier.to_string(),
                IdentifierEntry {
                    row: row.clone(),
                    parent_column,
                    parent,
                },
            );
        }

        debug!(
            identifiers = self.identifiers.len(),
            parents = self.children.len(),
            "identifier map built"
        );
        self.identifiers.len()
    }

    /// Report every parent reference that resolves neither in the batch
    /// nor, when `check_database` is set, in the catalog store.
    pub fn validate_parent_references(
        &mut self,
        rows: &[Row],
        check_database: bool,
    ) -> CoreResult<usize> {
        let store = if check_database {
            self.store.clone()
        } else {
            None
        };
        let mut missing = 0;

        for row in rows {
            let Some((column, parent)) = self.parent_link(row) else {
                continue;
            };
            if self.identifiers.contains_key(&parent) {
                continue;
            }
            if let Some(store) = &store {
                if self.parent_in_store(store.as_ref(), &parent)? {
                    continue;
                }
            }

            self.state.add(
                row.number(),
                column,
                format!("Parent '{parent}' was not found in this file or the catalog"),
                Severity::Error,
                RULE_PARENT_NOT_FOUND,
            );
            missing += 1;
        }

        debug!(missing, lookups = self.store_cache.len(), "parent references checked");
        Ok(missing)
    }

    /// Legacy id, then identifier, then slug; memoized for the run.
    fn parent_in_store(&mut self, store: &dyn CatalogStore, parent: &str) -> CoreResult<bool> {
        if let Some(found) = self.store_cache.get(parent) {
            return Ok(*found);
        }
        let found = store.id_by_legacy_id(parent)?.is_some()
            || store.id_by_identifier(parent)?.is_some()
            || store.slug_exists_with_target(parent)?;
        self.store_cache.insert(parent.to_string(), found);
        Ok(found)
    }

    /// Walk each identifier's parent chain; returns the number of cycles seen.
    ///
    /// Every walk that revisits a node is reported at its starting row, so
    /// each member of a cycle carries its own issue.
    pub fn detect_circular_references(&mut self) -> usize {
        let id_field = self.state.rules.referential.identifier_field().to_string();
        let mut pending = Vec::new();

        for start in &self.order {
            let mut visited = HashSet::new();
            let mut path: Vec<&str> = Vec::new();
            let mut current = start.as_str();

            loop {
                if !visited.insert(current) {
                    path.push(current);
                    pending.push((start.clone(), path.join(" -> ")));
                    break;
                }
                path.push(current);

                let next = self
                    .identifiers
                    .get(current)
                    .and_then(|entry| entry.parent.as_deref())
                    .filter(|parent| self.identifiers.contains_key(*parent));
                match next {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        let found = pending.len();
        for (start, path) in pending {
            let row = self.identifiers[&start].row_number();
            self.state.add(
                row,
                id_field.as_str(),
                format!("Circular reference detected: {path}"),
                Severity::Error,
                RULE_CIRCULAR_REFERENCE,
            );
            self.cyclic.insert(start);
        }
        found
    }

    /// Warn for every node deeper than `max_depth` (the node itself counts).
    ///
    /// Nodes already reported as cyclic are skipped.
    pub fn validate_hierarchy_depth(&mut self, max_depth: usize) -> usize {
        let id_field = self.state.rules.referential.identifier_field().to_string();
        let mut pending = Vec::new();

        for identifier in &self.order {
            if self.cyclic.contains(identifier) {
                continue;
            }
            let mut depth = 1;
            let mut parent = self.identifiers[identifier].parent.as_deref();
            while let Some(p) = parent {
                let Some(entry) = self.identifiers.get(p) else {
                    break;
                };
                depth += 1;
                if depth > max_depth {
                    break;
                }
                parent = entry.parent.as_deref();
            }

            if depth > max_depth {
                pending.push(self.identifiers[identifier].row_number());
            }
        }

        let found = pending.len();
        for row in pending {
            self.state.add(
                row,
                id_field.as_str(),
                format!("Hierarchy is deeper than the maximum of {max_depth} levels"),
                Severity::Warning,
                RULE_HIERARCHY_DEPTH,
            );
        }
        found
    }

    /// Warn where an in-batch parent appears after its child.
    pub fn validate_hierarchy_ordering(&mut self) -> usize {
        let mut pending = Vec::new();

        for identifier in &self.order {
            let entry = &self.identifiers[identifier];
            let (Some(parent), Some(column)) = (&entry.parent, &entry.parent_column) else {
                continue;
            };
            let Some(parent_entry) = self.identifiers.get(parent) else {
                continue;
            };
            if parent_entry.row_number() > entry.row_number() {
                pending.push((
                    entry.row_number(),
                    column.clone(),
                    format!(
                        "Parent '{parent}' appears later at row {}; \
                         parents should precede their children",
                        parent_entry.row_number()
                    ),
                ));
            }
        }

        let found = pending.len();
        for (row, column, message) in pending {
            self.state
                .add(row, column, message, Severity::Warning, RULE_HIERARCHY_ORDERING);
        }
        found
    }

    pub fn identifier_map(&self) -> &HashMap<String, IdentifierEntry> {
        &self.identifiers
    }

    /// Rows naming `parent` as their parent, in batch order.
    pub fn children_of(&self, parent: &str) -> &[RowNumber] {
        self.children
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Validator for ReferentialValidator {
    fn name(&self) -> &'static str {
        "referential"
    }

    fn title(&self) -> &str {
        "Referential Integrity"
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

    #[instrument(skip_all, fields(validator = "referential", rows = rows.len()))]
    fn validate_file(
        &mut self,
        rows: &[Row],
        options: &ValidationOptions,
    ) -> CoreResult<ValidationReport> {
        self.state.begin(rows.len());
        self.store_cache.clear();

        let max_depth = self
            .state
            .rules
            .referential
            .max_depth
            .unwrap_or(options.max_depth);

        self.build_identifier_map(rows);
        let missing = self.validate_parent_references(rows, options.check_database)?;
        let cycles = self.detect_circular_references();
        let too_deep = self.validate_hierarchy_depth(max_depth);
        let out_of_order = self.validate_hierarchy_ordering();

        let report = self.state.finish();
        info!(
            missing,
            cycles, too_deep, out_of_order, "referential validation finished"
        );
        Ok(report)
    }

    fn reset(&mut self) {
        self.identifiers.clear();
        self.order.clear();
        self.children.clear();
        self.cyclic.clear();
        self.store_cache.clear();
        self.state.reset();
    }
}
