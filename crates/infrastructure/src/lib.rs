//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod export_file_writer;
mod http_spreadsheet_export_gateway;

pub use export_file_writer::ExportFileWriter;
pub use http_spreadsheet_export_gateway::HttpSpreadsheetExportGateway;
