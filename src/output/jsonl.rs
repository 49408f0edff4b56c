//! JSON-lines sink
//!
//! One object per row: `{"sheet": <name>, "row": {<column>: <value>}}`.
//! Missing cells are left out of the row object.

use super::naming::SheetNamer;
use super::sink::{NamedTable, SinkSummary, TableSink};
use crate::error::Result;
use serde_json::json;
use std::io::Write;

/// Streams rows to a writer
pub struct JsonLinesSink<W: Write> {
    writer: W,
    namer: SheetNamer,
    summary: SinkSummary,
}

impl<W: Write> JsonLinesSink<W> {
    /// Create a sink over `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            namer: SheetNamer::new(),
            summary: SinkSummary::default(),
        }
    }
}

impl<W: Write> TableSink for JsonLinesSink<W> {
    fn write_table(&mut self, named: &NamedTable) -> Result<String> {
        let sheet = self.namer.assign(&named.name);
        for row in 0..named.table.num_rows() {
            let object = named.table.row_map(row).unwrap_or_default();
            let line = json!({ "sheet": sheet, "row": object });
            serde_json::to_writer(&mut self.writer, &line)?;
            self.writer.write_all(b"\n")?;
        }
        self.summary.sheets.push(sheet.clone());
        self.summary.rows += named.table.num_rows();
        Ok(sheet)
    }

    fn finish(mut self: Box<Self>) -> Result<SinkSummary> {
        self.writer.flush()?;
        Ok(self.summary)
    }
}
