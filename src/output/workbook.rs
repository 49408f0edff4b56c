//! xlsx workbook sink

use super::naming::SheetNamer;
use super::sink::{cell_text, NamedTable, SinkSummary, TableSink};
use crate::error::{Error, Result, ResultExt};
use crate::tabular::Cell;
use crate::types::JsonValue;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rows per worksheet, header included
pub const MAX_WORKSHEET_ROWS: usize = 1_048_576;

/// Columns per worksheet
pub const MAX_WORKSHEET_COLS: usize = 16_384;

/// Characters a cell can hold
pub const MAX_CELL_TEXT_LEN: usize = 32_767;

/// Writes each table to its own worksheet
///
/// The header row is bold and frozen. Numbers and booleans keep their
/// type; null and missing cells stay blank. Nothing touches disk until
/// `finish`, and a workbook with no sheets is never created.
pub struct WorkbookSink {
    workbook: Workbook,
    path: PathBuf,
    header: Format,
    namer: SheetNamer,
    summary: SinkSummary,
}

impl WorkbookSink {
    /// Create a sink that saves to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            workbook: Workbook::new(),
            path: path.as_ref().to_path_buf(),
            header: Format::new().set_bold(),
            namer: SheetNamer::new(),
            summary: SinkSummary::default(),
        }
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSink for WorkbookSink {
    fn write_table(&mut self, named: &NamedTable) -> Result<String> {
        let table = &named.table;
        if table.num_rows() >= MAX_WORKSHEET_ROWS {
            return Err(Error::output(format!(
                "'{}' has {} rows, a worksheet holds at most {}",
                named.name,
                table.num_rows(),
                MAX_WORKSHEET_ROWS - 1
            )));
        }
        if table.num_columns() > MAX_WORKSHEET_COLS {
            return Err(Error::output(format!(
                "'{}' has {} columns, a worksheet holds at most {}",
                named.name,
                table.num_columns(),
                MAX_WORKSHEET_COLS
            )));
        }

        let sheet_name = self.namer.assign(&named.name);
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name)?;

        for (col, name) in table.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, name, &self.header)?;
        }
        worksheet.set_freeze_panes(1, 0)?;

        for (row_idx, row) in table.rows().iter().enumerate() {
            let row_num = (row_idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                write_cell(worksheet, row_num, col as u16, cell)?;
            }
        }

        debug!(
            sheet = %sheet_name,
            rows = table.num_rows(),
            columns = table.num_columns(),
            "worksheet written"
        );
        self.summary.sheets.push(sheet_name.clone());
        self.summary.rows += table.num_rows();
        Ok(sheet_name)
    }

    fn finish(self: Box<Self>) -> Result<SinkSummary> {
        let Self {
            mut workbook,
            path,
            mut summary,
            ..
        } = *self;

        if summary.sheets.is_empty() {
            warn!(path = %path.display(), "no tables produced, workbook not written");
            return Ok(summary);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        workbook
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        info!(path = %path.display(), sheets = summary.sheets.len(), "workbook saved");
        summary.path = Some(path);
        Ok(summary)
    }
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Value(JsonValue::Number(n)) => {
            if let Some(f) = n.as_f64() {
                worksheet.write_number(row, col, f)?;
            }
        }
        Cell::Value(JsonValue::Bool(b)) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        other => {
            if let Some(text) = cell_text(other) {
                worksheet.write_string(row, col, clip(text))?;
            }
        }
    }
    Ok(())
}

fn clip(text: String) -> String {
    if text.chars().count() <= MAX_CELL_TEXT_LEN {
        return text;
    }
    warn!(
        length = text.chars().count(),
        "cell text longer than a worksheet cell allows, truncated"
    );
    text.chars().take(MAX_CELL_TEXT_LEN).collect()
}
