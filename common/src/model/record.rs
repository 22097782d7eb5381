//! In-memory tabular data: the rows a dispatch run fans out over.

use serde::{Deserialize, Serialize};

/// An ordered table of string cells with named columns.
///
/// Row `i` of the table is record `i` of a dispatch run; that index is the
/// only correlation key between a record, its task and its result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn record(&self, index: usize) -> Option<DispatchRecord<'_>> {
        self.rows.get(index).map(|cells| DispatchRecord {
            index,
            headers: &self.headers,
            cells,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = DispatchRecord<'_>> {
        (0..self.rows.len()).filter_map(move |i| self.record(i))
    }
}

/// A borrowed view of one table row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRecord<'a> {
    pub index: usize,
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> DispatchRecord<'a> {
    /// Raw value of `column`, or `None` if the table has no such column or
    /// this row is shorter than the header.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = self.headers.iter().position(|h| h == column)?;
        self.cells.get(position).map(String::as_str)
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["Name".into(), "Phone".into()],
            vec![vec!["Alice".into(), "111".into()], vec!["Bob".into()]],
        )
    }

    #[test]
    fn record_lookup_by_column_name() {
        let table = table();
        let record = table.record(0).unwrap();
        assert_eq!(record.index, 0);
        assert_eq!(record.get("Phone"), Some("111"));
        assert_eq!(record.get("Missing"), None);
    }

    #[test]
    fn short_rows_have_no_value_for_trailing_columns() {
        let table = table();
        assert_eq!(table.record(1).unwrap().get("Phone"), None);
        assert!(table.record(2).is_none());
    }
}
