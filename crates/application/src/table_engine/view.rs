use januscope_domain::{ColumnAlign, SelectionMode, SortDirection, StickySide, ThemeColors};

use super::cells::{CellContent, cell_content};
use super::pagination::page_buttons;
use super::selection::RowKey;
use super::session::TableSession;
use super::EMPTY_TABLE_MESSAGE;

/// Render-ready snapshot of a table session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    /// Heading.
    pub title: Option<String>,
    /// Sub heading.
    pub subtitle: Option<String>,
    /// Descriptive text.
    pub description: Option<String>,
    /// Whether the search box is shown.
    pub searchable: bool,
    /// Whether the export menu is shown.
    pub exportable: bool,
    /// Whether the refresh button is shown.
    pub refreshable: bool,
    /// Current search text.
    pub search_query: String,
    /// Class names of the table element.
    pub class_names: Vec<&'static str>,
    /// CSS custom properties from resolved colours.
    pub theme_variables: Vec<(&'static str, String)>,
    /// Selection mode, when rows can be selected.
    pub selection: Option<SelectionMode>,
    /// Whether the header checkbox is checked.
    pub all_selected: bool,
    /// Visible columns.
    pub columns: Vec<ColumnView>,
    /// Body state.
    pub status: TableStatus,
    /// Rows of the current page.
    pub rows: Vec<RowView>,
    /// Pagination controls, when shown.
    pub pagination: Option<PaginationView>,
    /// Notice left by the last spreadsheet fallback.
    pub export_notice: Option<String>,
}

/// Header cell of a visible column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    /// Column id.
    pub id: String,
    /// Header text.
    pub header: String,
    /// Whether clicking the header sorts.
    pub sortable: bool,
    /// Active sort direction on this column.
    pub sort: Option<SortDirection>,
    /// CSS width.
    pub width: Option<String>,
    /// Text alignment.
    pub align: ColumnAlign,
    /// Pinned side.
    pub sticky: Option<StickySide>,
}

impl ColumnView {
    /// Returns `↑`, `↓`, or the neutral indicator for sortable columns.
    #[must_use]
    pub fn sort_indicator(&self) -> Option<&'static str> {
        if !self.sortable {
            return None;
        }
        Some(match self.sort {
            Some(SortDirection::Asc) => "↑",
            Some(SortDirection::Desc) => "↓",
            None => "↕",
        })
    }
}

/// Body state of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// The host is loading data.
    Loading,
    /// No rows on this page.
    Empty(&'static str),
    /// Rows are shown.
    Ready,
}

/// One body row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// Row identity for selection and actions.
    pub key: RowKey,
    /// Whether the row is selected.
    pub selected: bool,
    /// Cells in visible column order.
    pub cells: Vec<CellContent>,
}

/// Pagination controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    /// Current page.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Number of pages.
    pub total_pages: usize,
    /// Rows after search and filters.
    pub total_rows: usize,
    /// Page number buttons.
    pub buttons: Vec<usize>,
    /// Whether "Previous" is enabled.
    pub has_previous: bool,
    /// Whether "Next" is enabled.
    pub has_next: bool,
    /// "Showing X to Y of Z entries", when enabled.
    pub summary: Option<String>,
    /// Page size choices, when the picker is enabled.
    pub page_size_options: Option<Vec<usize>>,
}

/// CSS custom properties derived from resolved table colours.
#[must_use]
pub fn table_theme_variables(colors: &ThemeColors) -> Vec<(&'static str, String)> {
    let mut variables = Vec::new();
    if let Some(primary) = colors.primary.as_deref() {
        variables.push(("--table-primary", primary.to_owned()));
    }
    if let Some(secondary) = colors.secondary.as_deref() {
        variables.push(("--table-secondary", secondary.to_owned()));
    }
    variables
}

impl TableSession {
    /// Builds the render-ready view of the current state.
    #[must_use]
    pub fn view(&self) -> TableView {
        let schema = self.schema();
        let meta = schema.meta();
        let date_format = self.options().date_format.as_str();

        let theme_variables = table_theme_variables(&self.theme());
        let mut class_names = vec!["table-engine"];
        for (enabled, class_name) in [
            (meta.theme.compact, "compact"),
            (meta.theme.bordered, "bordered"),
            (meta.theme.striped_rows, "striped"),
            (meta.theme.hover_rows, "hover"),
            (!theme_variables.is_empty(), "table-themed"),
        ] {
            if enabled {
                class_names.push(class_name);
            }
        }

        let columns = schema
            .visible_columns()
            .map(|column| ColumnView {
                id: column.id().as_str().to_owned(),
                header: column.header().to_owned(),
                sortable: column.is_sortable(),
                sort: self
                    .sort()
                    .filter(|(column_id, _)| *column_id == column.id().as_str())
                    .map(|(_, direction)| direction),
                width: column.width().map(str::to_owned),
                align: column.align(),
                sticky: column.sticky(),
            })
            .collect();

        let page_rows = self.page_rows();
        let status = if self.is_loading() {
            TableStatus::Loading
        } else if page_rows.is_empty() {
            TableStatus::Empty(EMPTY_TABLE_MESSAGE)
        } else {
            TableStatus::Ready
        };

        let rows = if self.is_loading() {
            Vec::new()
        } else {
            page_rows
                .iter()
                .map(|row| {
                    let key = self.row_key(row);
                    RowView {
                        selected: self.is_selected(&key),
                        key,
                        cells: schema
                            .visible_columns()
                            .map(|column| cell_content(column, row, date_format))
                            .collect(),
                    }
                })
                .collect()
        };

        let selection = schema
            .selection()
            .is_enabled()
            .then(|| schema.selection().mode());

        TableView {
            title: meta.title.clone(),
            subtitle: meta.subtitle.clone(),
            description: meta.description.clone(),
            searchable: schema.is_searchable(),
            exportable: schema.is_exportable(),
            refreshable: schema.is_refreshable(),
            search_query: self.search_query().to_owned(),
            class_names,
            theme_variables,
            selection,
            all_selected: selection == Some(SelectionMode::Multiple) && self.all_selected(),
            columns,
            status,
            rows,
            pagination: self.pagination_view(),
            export_notice: self.export_notice().map(str::to_owned),
        }
    }

    fn pagination_view(&self) -> Option<PaginationView> {
        let pagination = self.schema().pagination();
        if !pagination.is_enabled() || self.is_loading() || self.processed_len() == 0 {
            return None;
        }

        let window = self.page_window();
        let total_pages = window.total_pages();
        let page_size_options = if pagination.page_size_options().is_empty() {
            self.options().page_size_options.clone()
        } else {
            pagination.page_size_options().to_vec()
        };

        Some(PaginationView {
            page: window.page,
            page_size: window.page_size,
            total_pages,
            total_rows: window.total_rows,
            buttons: page_buttons(window.page, total_pages),
            has_previous: window.has_previous(),
            has_next: window.has_next(),
            summary: pagination.shows_total().then(|| window.summary()),
            page_size_options: pagination.shows_page_size().then_some(page_size_options),
        })
    }
}
