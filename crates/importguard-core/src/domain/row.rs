use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stable 1-based position of a row within its batch.
pub type RowNumber = usize;

/// One record of a batch: column name to raw value.
///
/// Values are kept exactly as parsed; trimming happens at the point of
/// comparison so messages can echo the original text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    number: RowNumber,
    values: BTreeMap<String, String>,
}

impl Row {
    pub fn new(number: RowNumber) -> Self {
        Self {
            number,
            values: BTreeMap::new(),
        }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V>(number: RowNumber, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            number,
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn number(&self) -> RowNumber {
        self.number
    }

    /// Raw value of `column`, if the column is present at all.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Trimmed value of `column`; `None` when absent or blank.
    pub fn get_trimmed(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    /// First non-blank trimmed value among `columns`, in order.
    pub fn first_of<'a>(&'a self, columns: &[&str]) -> Option<&'a str> {
        columns.iter().find_map(|c| self.get_trimmed(c))
    }

    /// First non-blank trimmed value among owned column names.
    pub fn first_of_owned<'a>(&'a self, columns: &[String]) -> Option<&'a str> {
        columns.iter().find_map(|c| self.get_trimmed(c))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Number rows `1..=n` in iteration order.
///
/// Convenience for callers whose parser yields bare column maps.
pub fn number_rows<I, M, K, V>(rows: I) -> Vec<Row>
where
    I: IntoIterator<Item = M>,
    M: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    rows.into_iter()
        .enumerate()
        .map(|(i, pairs)| Row::from_pairs(i + 1, pairs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_lookup_treats_blank_as_absent() {
        let row = Row::new(1).with("title", "  ").with("identifier", " A-1 ");

        assert_eq!(row.get("title"), Some("  "));
        assert_eq!(row.get_trimmed("title"), None);
        assert_eq!(row.get_trimmed("identifier"), Some("A-1"));
        assert_eq!(row.get_trimmed("missing"), None);
    }

    #[test]
    fn first_of_respects_column_order() {
        let row = Row::new(3).with("parent_id", "P2").with("parentId", "");

        assert_eq!(row.first_of(&["parentId", "parent_id"]), Some("P2"));
        assert_eq!(row.first_of(&["nope"]), None);
    }

    #[test]
    fn number_rows_is_one_based() {
        let rows = number_rows(vec![
            vec![("a".to_string(), "1".to_string())],
            vec![("a".to_string(), "2".to_string())],
        ]);

        assert_eq!(rows[0].number(), 1);
        assert_eq!(rows[1].number(), 2);
        assert_eq!(rows[1].get("a"), Some("2"));
    }
}
