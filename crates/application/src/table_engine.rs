mod cells;
mod export;
mod pagination;
mod pipeline;
mod selection;
mod session;
mod view;

pub use cells::{ActionView, CellContent, cell_content, csv_cell};
pub use export::{ExportOutcome, csv_export, export_file_name, json_export};
pub use pagination::{PageWindow, page_buttons, page_range, total_pages};
pub use pipeline::{TableQuery, process_rows};
pub use selection::{RowKey, Selection};
pub use session::TableSession;
pub use view::{
    ColumnView, PaginationView, RowView, TableStatus, TableView, table_theme_variables,
};

/// Empty-state text of a table without rows.
pub const EMPTY_TABLE_MESSAGE: &str = "No data available";

/// Table engine presentation defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// `strftime` pattern used for date cells.
    pub date_format: String,
    /// Page size used when the schema does not declare one.
    pub default_page_size: usize,
    /// Page size choices used when the schema does not declare them.
    pub page_size_options: Vec<usize>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            date_format: "%m/%d/%Y".to_owned(),
            default_page_size: 10,
            page_size_options: vec![10, 25, 50, 100],
        }
    }
}

#[cfg(test)]
mod tests;
