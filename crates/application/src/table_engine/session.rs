use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use januscope_core::{AppError, AppResult, SessionId};
use januscope_domain::{
    ColumnDefinition, ColumnFilter, ExportFormat, SelectionMode, SortDirection, TableSchema,
    ThemeColors,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::export::{ExportOutcome, csv_export, export_file_name, json_export};
use super::pagination::PageWindow;
use super::pipeline::{TableQuery, process_rows};
use super::selection::{RowKey, Selection};
use super::TableOptions;
use crate::table_ports::{ExportFile, SpreadsheetExportGateway};

/// Interactive state of one rendered table.
///
/// Owns the row data and every interaction (search, filters, sort, page,
/// selection). The processed row order is recomputed only when data,
/// search, filters or sort change.
#[derive(Debug)]
pub struct TableSession {
    id: SessionId,
    schema: Arc<TableSchema>,
    options: TableOptions,
    theme: ThemeColors,
    rows: Vec<Value>,
    loading: bool,
    page: usize,
    page_size: usize,
    sort: Option<(String, SortDirection)>,
    filters: BTreeMap<String, ColumnFilter>,
    search: String,
    selection: Selection,
    processed: Vec<usize>,
    export_notice: Option<String>,
}

impl TableSession {
    /// Starts a session over the given rows.
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, rows: Vec<Value>, options: TableOptions) -> Self {
        let page_size = schema
            .pagination()
            .page_size()
            .filter(|size| *size > 0)
            .unwrap_or(options.default_page_size.max(1));

        let mut session = Self {
            id: SessionId::new(),
            schema,
            options,
            theme: ThemeColors::default(),
            rows,
            loading: false,
            page: 1,
            page_size,
            sort: None,
            filters: BTreeMap::new(),
            search: String::new(),
            selection: Selection::default(),
            processed: Vec::new(),
            export_notice: None,
        };
        session.reprocess();
        session.warn_on_shared_keys();
        session
    }

    /// Sets host colour overrides.
    #[must_use]
    pub fn with_theme(mut self, theme: ThemeColors) -> Self {
        self.theme = theme;
        self
    }

    /// Returns session id.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the schema this session instantiates.
    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Returns presentation options.
    #[must_use]
    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Returns resolved colours: host overrides over schema colours.
    #[must_use]
    pub fn theme(&self) -> ThemeColors {
        self.theme.over(&self.schema.meta().theme.colors)
    }

    /// Returns all rows as supplied by the host.
    #[must_use]
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// Replaces the row data.
    ///
    /// Selected rows whose key is still present stay selected with fresh
    /// snapshots; the others are deselected.
    pub fn set_rows(&mut self, rows: Vec<Value>) {
        self.rows = rows;
        self.reprocess();
        self.warn_on_shared_keys();

        let keyed: Vec<(RowKey, &Value)> = self
            .rows
            .iter()
            .map(|row| (RowKey::of(&self.schema, row), row))
            .collect();
        if self.selection.retain_present(keyed) {
            self.notify_selection();
        }
    }

    /// Returns whether the host is loading data.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Sets the loading flag.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Returns the current free-text search.
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search
    }

    /// Sets the search text and returns to the first page.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.page = 1;
        self.reprocess();
    }

    /// Returns active filters keyed by column id.
    #[must_use]
    pub fn filters(&self) -> &BTreeMap<String, ColumnFilter> {
        &self.filters
    }

    /// Sets the filter of one column and returns to the first page.
    pub fn set_filter(&mut self, column_id: impl Into<String>, filter: ColumnFilter) {
        self.filters.insert(column_id.into(), filter);
        self.page = 1;
        self.reprocess();
    }

    /// Removes the filter of one column.
    pub fn clear_filter(&mut self, column_id: &str) {
        if self.filters.remove(column_id).is_some() {
            self.page = 1;
            self.reprocess();
        }
    }

    /// Removes every filter.
    pub fn clear_filters(&mut self) {
        if !self.filters.is_empty() {
            self.filters.clear();
            self.page = 1;
            self.reprocess();
        }
    }

    /// Returns the sorted column and direction.
    #[must_use]
    pub fn sort(&self) -> Option<(&str, SortDirection)> {
        self.sort
            .as_ref()
            .map(|(column_id, direction)| (column_id.as_str(), *direction))
    }

    /// Header click: ascending, then descending, then unsorted.
    ///
    /// Clicking another column starts it at ascending.
    pub fn toggle_sort(&mut self, column_id: &str) -> AppResult<Option<SortDirection>> {
        self.sortable_column(column_id)?;

        let next = match self.sort() {
            Some((current, SortDirection::Asc)) if current == column_id => Some(SortDirection::Desc),
            Some((current, SortDirection::Desc)) if current == column_id => None,
            _ => Some(SortDirection::Asc),
        };
        self.sort = next.map(|direction| (column_id.to_owned(), direction));
        self.reprocess();
        Ok(next)
    }

    /// Sorts by a column in an explicit direction, or removes sorting with `None`.
    pub fn set_sort(&mut self, column_id: &str, direction: Option<SortDirection>) -> AppResult<()> {
        self.sortable_column(column_id)?;
        self.sort = direction.map(|direction| (column_id.to_owned(), direction));
        self.reprocess();
        Ok(())
    }

    fn sortable_column(&self, column_id: &str) -> AppResult<&ColumnDefinition> {
        let column = self.column(column_id)?;
        if !column.is_sortable() {
            return Err(AppError::Validation(format!(
                "column '{column_id}' is not sortable"
            )));
        }
        Ok(column)
    }

    fn column(&self, column_id: &str) -> AppResult<&ColumnDefinition> {
        self.schema.column(column_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "column '{column_id}' does not exist in table '{}'",
                self.schema.id()
            ))
        })
    }

    /// Returns rows after search, filters and sort.
    #[must_use]
    pub fn processed_rows(&self) -> Vec<&Value> {
        self.processed.iter().map(|&index| &self.rows[index]).collect()
    }

    /// Returns the number of rows after search and filters.
    #[must_use]
    pub fn processed_len(&self) -> usize {
        self.processed.len()
    }

    /// Returns the rows of the current page, or every processed row without pagination.
    #[must_use]
    pub fn page_rows(&self) -> Vec<&Value> {
        if !self.schema.pagination().is_enabled() {
            return self.processed_rows();
        }

        self.processed[self.page_window().range()]
            .iter()
            .map(|&index| &self.rows[index])
            .collect()
    }

    /// Returns the current page position.
    #[must_use]
    pub fn page_window(&self) -> PageWindow {
        PageWindow {
            page: self.page,
            page_size: self.page_size,
            total_rows: self.processed.len(),
        }
    }

    /// Returns the current one-based page.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Moves to a page. Pages past the end are allowed and show no rows.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Returns rows per page.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changes rows per page and returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> AppResult<()> {
        if page_size == 0 {
            return Err(AppError::Validation(
                "page size must be greater than zero".to_owned(),
            ));
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    /// Returns the key identifying a row.
    #[must_use]
    pub fn row_key(&self, row: &Value) -> RowKey {
        RowKey::of(&self.schema, row)
    }

    /// Returns the current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns copies of the selected rows in selection order.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<Value> {
        self.selection.rows()
    }

    /// Returns whether a row is selected.
    #[must_use]
    pub fn is_selected(&self, key: &RowKey) -> bool {
        self.selection.contains(key)
    }

    /// Row checkbox click.
    pub fn toggle_row(&mut self, key: &RowKey) -> AppResult<()> {
        let mode = self.selection_mode()?;
        let row = self.find_row(key)?.clone();

        match mode {
            SelectionMode::Single => self.selection.toggle_single(key.clone(), row),
            SelectionMode::Multiple => self.selection.toggle_multiple(key.clone(), row),
        }
        self.notify_selection();
        Ok(())
    }

    /// Row checkbox click by position on the current page.
    pub fn toggle_row_at(&mut self, page_index: usize) -> AppResult<()> {
        let key = self
            .page_rows()
            .get(page_index)
            .map(|row| self.row_key(row))
            .ok_or_else(|| {
                AppError::NotFound(format!("no row at position {page_index} on this page"))
            })?;
        self.toggle_row(&key)
    }

    /// Header checkbox click: selects the current page, or clears when it is fully selected.
    pub fn toggle_select_all(&mut self) -> AppResult<()> {
        if self.selection_mode()? == SelectionMode::Single {
            return Err(AppError::Validation(
                "select all is not available in single selection mode".to_owned(),
            ));
        }

        let page: Vec<(RowKey, Value)> = self
            .page_rows()
            .into_iter()
            .map(|row| (self.row_key(row), row.clone()))
            .collect();
        self.selection.toggle_page(page);
        self.notify_selection();
        Ok(())
    }

    /// Returns whether every row of the current page is selected.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        let page_keys: Vec<RowKey> = self
            .page_rows()
            .into_iter()
            .map(|row| self.row_key(row))
            .collect();
        self.selection.covers(&page_keys)
    }

    /// Deselects every row.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        if self.schema.selection().is_enabled() {
            self.notify_selection();
        }
    }

    fn selection_mode(&self) -> AppResult<SelectionMode> {
        let selection = self.schema.selection();
        if !selection.is_enabled() {
            return Err(AppError::Validation(format!(
                "table '{}' does not allow row selection",
                self.schema.id()
            )));
        }
        Ok(selection.mode())
    }

    fn find_row(&self, key: &RowKey) -> AppResult<&Value> {
        self.rows
            .iter()
            .find(|row| self.row_key(row) == *key)
            .ok_or_else(|| AppError::NotFound(format!("row '{key}' does not exist")))
    }

    fn notify_selection(&self) {
        if let Some(callback) = self.schema.selection().change_callback() {
            callback(&self.selection.rows());
        }
    }

    /// Clicks an action button of a row.
    pub fn trigger_action(
        &self,
        key: &RowKey,
        column_id: &str,
        action_index: usize,
    ) -> AppResult<()> {
        let row = self.find_row(key)?;
        let column = self.column(column_id)?;
        let action = column.actions().get(action_index).ok_or_else(|| {
            AppError::NotFound(format!(
                "column '{column_id}' has no action at index {action_index}"
            ))
        })?;

        if action.is_hidden(row) || action.is_disabled(row) {
            return Err(AppError::Validation(format!(
                "action '{}' is not available for row '{key}'",
                action.label()
            )));
        }

        action.click(row);
        Ok(())
    }

    /// Runs the schema's refresh hook. Returns whether one ran.
    pub fn refresh(&self) -> bool {
        match self.schema.refresh_hook() {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }

    /// Returns the notice left by the last spreadsheet fallback.
    #[must_use]
    pub fn export_notice(&self) -> Option<&str> {
        self.export_notice.as_deref()
    }

    /// Exports the processed rows (not paged).
    ///
    /// A schema export hook takes over every format. A spreadsheet that
    /// cannot be fetched degrades to a CSV file and leaves a notice until
    /// the next successful spreadsheet export.
    pub async fn export(
        &mut self,
        format: ExportFormat,
        gateway: Option<&dyn SpreadsheetExportGateway>,
    ) -> AppResult<ExportOutcome> {
        if let Some(hook) = self.schema.export_hook() {
            let rows: Vec<Value> = self.processed_rows().into_iter().cloned().collect();
            hook(format, &rows);
            return Ok(ExportOutcome::Delegated);
        }

        match format {
            ExportFormat::Csv => Ok(ExportOutcome::Ready(self.csv_file()?)),
            ExportFormat::Json => Ok(ExportOutcome::Ready(self.export_file(
                ExportFormat::Json,
                json_export(&self.processed_rows())?,
            ))),
            ExportFormat::Excel => {
                let table_id = self.schema.id().as_str().to_owned();
                let fetched = match gateway {
                    Some(gateway) => gateway.fetch_spreadsheet(&table_id).await,
                    None => Err(AppError::Export(
                        "no spreadsheet export backend is configured".to_owned(),
                    )),
                };

                match fetched {
                    Ok(bytes) => {
                        self.export_notice = None;
                        Ok(ExportOutcome::Ready(
                            self.export_file(ExportFormat::Excel, bytes),
                        ))
                    }
                    Err(error) => {
                        warn!(table_id = %table_id, error = %error, "spreadsheet export failed, falling back to CSV");
                        let reason = error.to_string();
                        self.export_notice = Some(format!(
                            "Excel export not available. Downloaded CSV instead ({reason})."
                        ));
                        Ok(ExportOutcome::FellBack {
                            file: self.csv_file()?,
                            reason,
                        })
                    }
                }
            }
        }
    }

    fn csv_file(&self) -> AppResult<ExportFile> {
        let columns: Vec<&ColumnDefinition> = self
            .schema
            .visible_columns()
            .filter(|column| !column.is_actions())
            .collect();
        let bytes = csv_export(&columns, &self.processed_rows(), &self.options.date_format)?;
        Ok(self.export_file(ExportFormat::Csv, bytes))
    }

    fn export_file(&self, format: ExportFormat, bytes: Vec<u8>) -> ExportFile {
        ExportFile {
            file_name: export_file_name(self.schema.id().as_str(), format, Utc::now().date_naive()),
            mime_type: format.mime_type(),
            bytes,
        }
    }

    /// Rows sharing a key are indistinguishable to selection.
    fn warn_on_shared_keys(&self) {
        let mut seen = HashSet::new();
        let shared = self
            .rows
            .iter()
            .filter(|row| !seen.insert(self.row_key(row)))
            .count();
        if shared > 0 {
            warn!(
                session_id = %self.id,
                table_id = %self.schema.id(),
                shared_rows = shared,
                declared_row_key = self.schema.row_key().is_some(),
                "rows share a selection key and are selected together"
            );
        }
    }

    fn reprocess(&mut self) {
        let query = TableQuery {
            search: &self.search,
            filters: &self.filters,
            sort: self.sort(),
        };
        let processed = process_rows(&self.schema, &self.rows, &query);
        self.processed = processed;
        debug!(
            session_id = %self.id,
            table_id = %self.schema.id(),
            rows = self.rows.len(),
            processed = self.processed.len(),
            "recomputed table rows"
        );
    }
}
