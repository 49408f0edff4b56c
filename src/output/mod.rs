//! Output module
//!
//! Writes finished tables to a sink.
//!
//! # Overview
//!
//! This module provides:
//! - `SheetNamer` - turns query group names into legal, unique sheet names
//! - `TableSink` - the sink boundary, one call per table then `finish`
//! - `WorkbookSink` - one worksheet per table in an xlsx workbook
//! - `JsonLinesSink` - one JSON object per row on any writer

mod jsonl;
mod naming;
mod sink;
mod workbook;

pub use jsonl::JsonLinesSink;
pub use naming::{sanitize_sheet_name, SheetNamer, MAX_SHEET_NAME_LEN};
pub use sink::{cell_text, NamedTable, SinkFailure, SinkSummary, TableSink};
pub use workbook::{WorkbookSink, MAX_CELL_TEXT_LEN, MAX_WORKSHEET_COLS, MAX_WORKSHEET_ROWS};

#[cfg(test)]
mod tests;
