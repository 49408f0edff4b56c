//! Array expansion
//!
//! Exploding a column turns each row holding an array of n elements into n
//! rows, one element each, with every other column copied. Elements that are
//! mappings are then flattened into sub-columns prefixed by the column path.

use super::flatten::{flatten_with_prefix, FlatRecord};
use super::table::{Cell, Table};
use crate::types::JsonValue;
use std::collections::HashSet;

/// What one column expansion did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnExpansion {
    /// Rows that held an array
    pub arrays_exploded: usize,
    /// Rows added by the explosion
    pub rows_added: usize,
    /// Sub-columns created from mapping elements
    pub sub_columns: usize,
    /// Whether the original column was dropped
    pub dropped: bool,
}

impl Table {
    /// Explode and then lift mappings for the column at `idx`
    pub(super) fn expand_column(&mut self, idx: usize, separator: &str) -> ColumnExpansion {
        let before = self.rows.len();
        let arrays_exploded = self.explode(idx);
        let rows_added = self.rows.len().saturating_sub(before);
        let (sub_columns, dropped) = self.lift_objects(idx, separator);

        ColumnExpansion {
            arrays_exploded,
            rows_added,
            sub_columns,
            dropped,
        }
    }

    /// Replace each array cell in the column with one row per element
    ///
    /// Row blocks keep their relative order. An empty array yields a single
    /// row holding `Missing`; non-array cells pass through.
    fn explode(&mut self, idx: usize) -> usize {
        if !self.rows.iter().any(|row| row[idx].is_array()) {
            return 0;
        }

        let mut exploded = 0;
        let mut rows = Vec::with_capacity(self.rows.len());

        for mut row in std::mem::take(&mut self.rows) {
            match std::mem::replace(&mut row[idx], Cell::Missing) {
                Cell::Value(JsonValue::Array(items)) => {
                    exploded += 1;
                    if items.is_empty() {
                        rows.push(row);
                        continue;
                    }

                    let last = items.len() - 1;
                    for (i, item) in items.into_iter().enumerate() {
                        if i == last {
                            row[idx] = Cell::Value(item);
                            rows.push(row);
                            break;
                        }
                        let mut copy = row.clone();
                        copy[idx] = Cell::Value(item);
                        rows.push(copy);
                    }
                }
                other => {
                    row[idx] = other;
                    rows.push(row);
                }
            }
        }

        self.rows = rows;
        exploded
    }

    /// Flatten mapping cells of the column into prefixed sub-columns
    ///
    /// Sub-columns are spliced in where the column sits. The column is kept
    /// only while some row still holds a non-mapping value in it.
    fn lift_objects(&mut self, idx: usize, separator: &str) -> (usize, bool) {
        if !self.rows.iter().any(|row| row[idx].is_object()) {
            return (0, false);
        }

        let column = self.columns[idx].clone();
        let mut sub_rows: Vec<Option<FlatRecord>> = Vec::with_capacity(self.rows.len());
        let mut sub_columns: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for row in &mut self.rows {
            match std::mem::replace(&mut row[idx], Cell::Missing) {
                Cell::Value(JsonValue::Object(object)) => {
                    let flat = flatten_with_prefix(&column, &object, separator);
                    for key in flat.keys() {
                        if seen.insert(key.clone()) {
                            sub_columns.push(key.clone());
                        }
                    }
                    sub_rows.push(Some(flat));
                }
                other => {
                    row[idx] = other;
                    sub_rows.push(None);
                }
            }
        }

        let dropped = self.rows.iter().all(|row| row[idx].is_missing());
        let mut position = if dropped {
            self.remove_column(idx);
            idx
        } else {
            idx + 1
        };

        let created = sub_columns.len();
        for name in sub_columns {
            let target = if let Some(existing) = self.column_index(&name) {
                existing
            } else {
                let at = self.insert_column(position, name.clone());
                position += 1;
                at
            };

            for (row, sub) in self.rows.iter_mut().zip(sub_rows.iter_mut()) {
                if let Some(value) = sub.as_mut().and_then(|flat| flat.remove(&name)) {
                    row[target] = Cell::Value(value);
                }
            }
        }

        (created, dropped)
    }
}
