//! Document tabularization
//!
//! Turns a batch of nested, schema-less records into one rectangular table.
//!
//! # Pipeline
//!
//! 1. **Coerce** (BSON input only): unrepresentable values become strings
//! 2. **Flatten**: nested mappings collapse into dot-joined paths
//! 3. **Assemble**: union of all paths becomes the column set
//! 4. **Expand**: array columns explode into extra rows; mapping elements
//!    become prefixed sub-columns
//!
//! ```rust
//! use docsheet::tabular::{Tabularizer, TabularConfig};
//! use serde_json::json;
//!
//! let records = vec![json!({"a": 1, "items": [{"x": 10}, {"x": 20}]})];
//! let table = Tabularizer::new(TabularConfig::default())
//!     .tabularize(&records)
//!     .unwrap();
//!
//! assert_eq!(table.columns(), ["a", "items.x"]);
//! assert_eq!(table.num_rows(), 2);
//! ```

mod coerce;
mod expand;
mod flatten;
mod table;

pub use coerce::{coerce_bson, coerce_document, coerce_documents, CoercionReport};
pub use expand::ColumnExpansion;
pub use flatten::{
    flatten_batch, flatten_object, flatten_record, flatten_with_prefix, FlatRecord,
    DEFAULT_SEPARATOR,
};
pub use table::{Cell, Table};

use crate::error::Result;
use crate::types::JsonValue;
use mongodb::bson::Document;
use tracing::{debug, warn};

/// Default bound on fixed-point expansion passes
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// How array columns are expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionMode {
    /// Discover array columns once and expand each once
    SinglePass,
    /// Repeat discovery and expansion until no arrays remain
    FixedPoint {
        /// Maximum number of passes
        max_depth: usize,
    },
}

impl Default for ExpansionMode {
    fn default() -> Self {
        Self::FixedPoint {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Tabularizer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularConfig {
    /// Path separator
    pub separator: String,
    /// Expansion strategy
    pub mode: ExpansionMode,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            mode: ExpansionMode::default(),
        }
    }
}

impl TabularConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Use single-pass expansion
    #[must_use]
    pub fn single_pass(mut self) -> Self {
        self.mode = ExpansionMode::SinglePass;
        self
    }

    /// Use fixed-point expansion bounded by `max_depth` passes
    #[must_use]
    pub fn fixed_point(mut self, max_depth: usize) -> Self {
        self.mode = ExpansionMode::FixedPoint { max_depth };
        self
    }
}

/// Statistics from expanding a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    /// Passes run
    pub passes: usize,
    /// Column expansions performed
    pub columns_expanded: usize,
    /// Rows added by explosion
    pub rows_added: usize,
    /// Whether arrays remain after the last pass
    pub unresolved: bool,
}

/// Turns record batches into tables
#[derive(Debug, Clone, Default)]
pub struct Tabularizer {
    config: TabularConfig,
}

impl Tabularizer {
    /// Create a tabularizer
    pub fn new(config: TabularConfig) -> Self {
        Self { config }
    }

    /// Current configuration
    pub fn config(&self) -> &TabularConfig {
        &self.config
    }

    /// Flatten, assemble and expand a batch of JSON records
    pub fn tabularize(&self, records: &[JsonValue]) -> Result<Table> {
        let flat = flatten_batch(records, &self.config.separator)?;
        let mut table = Table::from_flat_records(flat);
        let stats = self.expand(&mut table);
        debug!(
            records = records.len(),
            rows = table.num_rows(),
            columns = table.num_columns(),
            passes = stats.passes,
            "tabularized batch"
        );
        Ok(table)
    }

    /// Coerce and tabularize a batch of BSON documents
    pub fn tabularize_documents(&self, documents: &[Document]) -> Result<(Table, CoercionReport)> {
        let mut report = CoercionReport::new();
        let records = coerce_documents(documents, &mut report);
        let table = self.tabularize(&records)?;
        Ok((table, report))
    }

    /// Expand array columns in place according to the configured mode
    pub fn expand(&self, table: &mut Table) -> ExpansionStats {
        let mut stats = ExpansionStats::default();

        match self.config.mode {
            ExpansionMode::SinglePass => {
                let columns = table.array_columns();
                self.expand_pass(table, &columns, &mut stats);
                stats.unresolved = table.has_arrays();
            }
            ExpansionMode::FixedPoint { max_depth } => loop {
                let columns = table.array_columns();
                if columns.is_empty() {
                    break;
                }
                if stats.passes >= max_depth {
                    warn!(
                        max_depth,
                        columns = ?columns,
                        "expansion depth bound reached, arrays left unexpanded"
                    );
                    stats.unresolved = true;
                    break;
                }
                self.expand_pass(table, &columns, &mut stats);
            },
        }

        stats
    }

    fn expand_pass(&self, table: &mut Table, columns: &[String], stats: &mut ExpansionStats) {
        stats.passes += 1;
        for column in columns {
            // Earlier expansions in this pass may have moved the column
            let Some(idx) = table.column_index(column) else {
                continue;
            };
            let expansion = table.expand_column(idx, &self.config.separator);
            stats.columns_expanded += 1;
            stats.rows_added += expansion.rows_added;
        }
    }
}
