//! Row collection and delimited-text export.

use serde_json::Value;
use std::collections::BTreeSet;
use std::io::Write;
use thiserror::Error;

use crate::flatten::FlatRow;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Delimited-text options.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Ordered rows produced by flattening one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<FlatRow>,
}

impl Table {
    pub fn from_rows(rows: Vec<FlatRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<FlatRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted union of keys across all rows.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Write header plus one record per row. Absent keys become empty cells.
    ///
    /// A table without columns writes nothing.
    pub fn write_csv<W: Write>(&self, writer: W, options: CsvOptions) -> Result<(), ExportError> {
        let columns = self.columns();
        if columns.is_empty() {
            return Ok(());
        }

        let mut out = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_writer(writer);
        out.write_record(&columns)?;
        for row in &self.rows {
            out.write_record(columns.iter().map(|column| render_cell(row.get(column))))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Render the table as a comma separated string.
    pub fn to_csv_string(&self) -> Result<String, ExportError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, CsvOptions::default())?;
        Ok(String::from_utf8(buf)?)
    }
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
