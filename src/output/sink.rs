//! Sink boundary

use crate::error::Result;
use crate::tabular::{Cell, Table};
use crate::types::JsonValue;
use std::path::PathBuf;

/// A table with the name of the group that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable {
    /// Group or sheet name, before sanitizing
    pub name: String,
    /// The table
    pub table: Table,
}

impl NamedTable {
    /// Pair a name with a table
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// What a sink wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSummary {
    /// Final sheet names, in write order
    pub sheets: Vec<String>,
    /// Data rows written across all sheets
    pub rows: usize,
    /// File written, if the sink writes one
    pub path: Option<PathBuf>,
    /// Tables the sink rejected; the rest were still written
    pub failed: Vec<SinkFailure>,
}

impl SinkSummary {
    /// Whether every table offered to the sink was rejected
    pub fn nothing_written(&self) -> bool {
        self.sheets.is_empty() && !self.failed.is_empty()
    }
}

/// A table that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    /// Group or sheet name, before sanitizing
    pub name: String,
    /// Why the write failed
    pub error: String,
}

/// Destination for finished tables
pub trait TableSink {
    /// Write one table; returns the sheet name used
    fn write_table(&mut self, table: &NamedTable) -> Result<String>;

    /// Flush and close the sink
    fn finish(self: Box<Self>) -> Result<SinkSummary>;
}

/// Text form of a cell; `None` for a blank cell
///
/// Arrays and mappings left after expansion render as compact JSON.
pub fn cell_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Missing | Cell::Value(JsonValue::Null) => None,
        Cell::Value(JsonValue::String(s)) => Some(s.clone()),
        Cell::Value(other) => Some(other.to_string()),
    }
}
