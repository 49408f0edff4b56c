//! Rectangular table model
//!
//! A `Table` is an ordered set of column paths and rows of `Cell`s. Rows are
//! index-aligned with the column list.

use super::flatten::FlatRecord;
use crate::types::{JsonObject, JsonValue};
use std::collections::HashMap;

/// A single table cell
///
/// `Missing` marks "no value for this column in this row" and is distinct
/// from a JSON `null` that was present in the source record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A value taken from the record
    Value(JsonValue),
    /// No value
    Missing,
}

impl Cell {
    /// Whether this is the "no value" marker
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Whether this cell holds an (unexpanded) array
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Value(JsonValue::Array(_)))
    }

    /// Whether this cell holds a mapping
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Value(JsonValue::Object(_)))
    }

    /// The value, if any
    pub fn as_value(&self) -> Option<&JsonValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing => None,
        }
    }
}

impl From<JsonValue> for Cell {
    fn from(value: JsonValue) -> Self {
        Self::Value(value)
    }
}

/// A rectangular table built from flat records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub(super) columns: Vec<String>,
    pub(super) index: HashMap<String, usize>,
    pub(super) rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a table from flat records
    ///
    /// The column set is the union of every path in first-seen order. Each
    /// record becomes one row; absent paths are `Missing`.
    pub fn from_flat_records(records: Vec<FlatRecord>) -> Self {
        let mut table = Self::new();

        for record in &records {
            for key in record.keys() {
                if !table.index.contains_key(key) {
                    table.index.insert(key.clone(), table.columns.len());
                    table.columns.push(key.clone());
                }
            }
        }

        table.rows.reserve(records.len());
        for record in records {
            let mut row = vec![Cell::Missing; table.columns.len()];
            for (key, value) in record {
                row[table.index[&key]] = Cell::Value(value);
            }
            table.rows.push(row);
        }

        table
    }

    /// Column paths in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Cell at (row, column name)
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Iterate a column's cells top to bottom; empty if the column is unknown
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a Cell> + 'a {
        let idx = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |row| idx.map(|i| &row[i]))
    }

    /// A row as an ordered mapping, leaving out `Missing` cells
    pub fn row_map(&self, row: usize) -> Option<JsonObject> {
        let cells = self.rows.get(row)?;
        let mut object = JsonObject::new();
        for (name, cell) in self.columns.iter().zip(cells) {
            if let Cell::Value(v) = cell {
                object.insert(name.clone(), v.clone());
            }
        }
        Some(object)
    }

    /// Columns holding an array in at least one row, in column order
    pub fn array_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.iter().any(|row| row[*idx].is_array()))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Whether any cell still holds an array
    pub fn has_arrays(&self) -> bool {
        self.rows.iter().flatten().any(Cell::is_array)
    }

    pub(super) fn insert_column(&mut self, position: usize, name: String) -> usize {
        self.columns.insert(position, name);
        for row in &mut self.rows {
            row.insert(position, Cell::Missing);
        }
        self.reindex();
        position
    }

    pub(super) fn remove_column(&mut self, position: usize) {
        self.columns.remove(position);
        for row in &mut self.rows {
            row.remove(position);
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
    }
}
