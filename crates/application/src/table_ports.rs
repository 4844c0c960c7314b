use async_trait::async_trait;
use januscope_core::AppResult;

/// A generated export ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested file name, e.g. `roles-table-export-2026-10-19.csv`.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Backend port producing spreadsheet exports.
#[async_trait]
pub trait SpreadsheetExportGateway: Send + Sync {
    /// Fetches a spreadsheet export for one table.
    async fn fetch_spreadsheet(&self, table_id: &str) -> AppResult<Vec<u8>>;
}
