use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use januscope_core::{AppError, AppResult};
use januscope_domain::{ColumnDefinition, ExportFormat};
use serde_json::Value;

use super::cells::csv_cell;
use crate::table_ports::ExportFile;

/// Result of [`TableSession::export`](super::TableSession::export).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The schema's export hook received the rows; no file was produced.
    Delegated,
    /// The requested file.
    Ready(ExportFile),
    /// The spreadsheet could not be fetched and a CSV file was produced instead.
    FellBack {
        /// CSV file.
        file: ExportFile,
        /// Why the spreadsheet was not produced.
        reason: String,
    },
}

impl ExportOutcome {
    /// Returns the produced file, if any.
    #[must_use]
    pub fn file(&self) -> Option<&ExportFile> {
        match self {
            Self::Delegated => None,
            Self::Ready(file) | Self::FellBack { file, .. } => Some(file),
        }
    }
}

/// Returns `{schema-id}-export-{YYYY-MM-DD}.{extension}`.
#[must_use]
pub fn export_file_name(schema_id: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{schema_id}-export-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Writes a header line and one line per row, quoting only where needed.
///
/// Lines are separated by `\n` with no trailing newline.
pub fn csv_export(
    columns: &[&ColumnDefinition],
    rows: &[&Value],
    date_format: &str,
) -> AppResult<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|column| column.header()))
        .map_err(csv_error)?;
    for row in rows {
        writer
            .write_record(
                columns
                    .iter()
                    .map(|column| csv_cell(column, row, date_format)),
            )
            .map_err(csv_error)?;
    }

    let mut bytes = writer
        .into_inner()
        .map_err(|error| AppError::Export(format!("failed to finish CSV export: {error}")))?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(bytes)
}

/// Pretty-prints rows as a JSON array.
pub fn json_export(rows: &[&Value]) -> AppResult<Vec<u8>> {
    serde_json::to_vec_pretty(rows)
        .map_err(|error| AppError::Export(format!("failed to encode JSON export: {error}")))
}

fn csv_error(error: csv::Error) -> AppError {
    AppError::Export(format!("failed to write CSV export: {error}"))
}
