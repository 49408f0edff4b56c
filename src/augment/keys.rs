//! Correlation key set

use crate::tabular::{Cell, Table};
use crate::types::JsonValue;
use std::collections::HashSet;

/// Insertion-ordered, deduplicated identifier values
#[derive(Debug, Clone, Default)]
pub struct CorrelationKeys {
    values: Vec<JsonValue>,
    seen: HashSet<String>,
}

impl CorrelationKeys {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the non-missing, non-null values of `column`
    ///
    /// An unknown column yields an empty set.
    pub fn collect(table: &Table, column: &str) -> Self {
        let mut keys = Self::new();
        keys.extend(table.column_values(column).filter_map(Cell::as_value).cloned());
        keys
    }

    /// Add one value, ignoring nulls and duplicates
    pub fn insert(&mut self, value: JsonValue) -> bool {
        if value.is_null() {
            return false;
        }
        // Compare by serialized form so `1` and `"1"` stay distinct
        let key = value.to_string();
        if !self.seen.insert(key) {
            return false;
        }
        self.values.push(value);
        true
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in first-seen order
    pub fn values(&self) -> &[JsonValue] {
        &self.values
    }

    /// Keys as a JSON array
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.values.clone())
    }
}

impl Extend<JsonValue> for CorrelationKeys {
    fn extend<I: IntoIterator<Item = JsonValue>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
