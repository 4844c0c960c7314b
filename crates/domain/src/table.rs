use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use januscope_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::callback::Callback;
use crate::theme::ThemeColors;

/// Derives a cell value from a whole row.
pub type AccessorFn = dyn Fn(&Value) -> Value + Send + Sync;

/// Formats a cell from `(raw value, row)`. A missing raw value is `None`.
pub type FormatFn = dyn Fn(Option<&Value>, &Value) -> String + Send + Sync;

/// Per-row predicate used by action buttons.
pub type RowPredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// Handler invoked with the row an action button was clicked on.
pub type RowActionFn = dyn Fn(&Value) + Send + Sync;

/// Receives the full selection after every selection change.
pub type SelectionChangeFn = dyn Fn(&[Value]) + Send + Sync;

/// Host refresh hook.
pub type RefreshFn = dyn Fn() + Send + Sync;

/// Host export hook receiving the processed (not paginated) rows.
pub type ExportHookFn = dyn Fn(ExportFormat, &[Value]) + Send + Sync;

/// How a column reads its value from a row.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// Dotted path into the row object. Numeric segments index arrays.
    Path(String),
    /// Function of the whole row.
    Derived(Callback<AccessorFn>),
}

impl Accessor {
    /// Creates a derived accessor.
    #[must_use]
    pub fn derived<F>(function: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let function: Arc<AccessorFn> = Arc::new(function);
        Self::Derived(Callback::new(function))
    }

    /// Reads the raw value from a row. `None` means the path does not exist.
    #[must_use]
    pub fn resolve<'row>(&self, row: &'row Value) -> Option<Cow<'row, Value>> {
        match self {
            Self::Path(path) => path
                .split('.')
                .try_fold(row, |current, segment| match current {
                    Value::Object(map) => map.get(segment),
                    Value::Array(items) => segment
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| items.get(index)),
                    _ => None,
                })
                .map(Cow::Borrowed),
            Self::Derived(function) => Some(Cow::Owned(function.get()(row))),
        }
    }
}

impl From<&str> for Accessor {
    fn from(value: &str) -> Self {
        Self::Path(value.to_owned())
    }
}

impl<'de> Deserialize<'de> for Accessor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let path = String::deserialize(deserializer)?;
        if path.trim().is_empty() {
            return Err(serde::de::Error::custom("column accessor must not be empty"));
        }
        Ok(Self::Path(path))
    }
}

/// Column type tag governing default cell presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Raw value.
    #[default]
    Text,
    /// Raw numeric value.
    Number,
    /// Formatted calendar date.
    Date,
    /// `Yes` or `No`.
    Boolean,
    /// Label and severity looked up by raw value.
    Badge,
    /// Row action buttons.
    Actions,
    /// Host formatted.
    Custom,
}

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

impl ColumnAlign {
    /// Returns the CSS value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Side a column sticks to while scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickySide {
    /// Pinned left.
    Left,
    /// Pinned right.
    Right,
}

/// Badge severity colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    /// Positive state.
    Success,
    /// Needs attention.
    Warning,
    /// Failure state.
    Danger,
    /// Informational.
    Info,
    /// Neutral.
    #[default]
    Default,
}

impl BadgeColor {
    /// Returns the CSS class suffix.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Info => "info",
            Self::Default => "default",
        }
    }
}

/// Label and colour shown for one raw badge value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BadgeStyle {
    /// Display label.
    pub label: String,
    /// Severity colour.
    #[serde(default)]
    pub color: BadgeColor,
}

/// Action button style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVariant {
    /// Primary emphasis.
    Primary,
    /// Secondary emphasis.
    Secondary,
    /// Destructive.
    Danger,
    /// Minimal.
    #[default]
    Ghost,
}

impl ActionVariant {
    /// Returns the CSS class suffix.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Danger => "danger",
            Self::Ghost => "ghost",
        }
    }
}

/// Button rendered in an actions column.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionButton {
    label: String,
    #[serde(default)]
    variant: ActionVariant,
    #[serde(skip)]
    on_click: Option<Callback<RowActionFn>>,
    #[serde(skip)]
    disabled: Option<Callback<RowPredicateFn>>,
    #[serde(skip)]
    hidden: Option<Callback<RowPredicateFn>>,
}

impl ActionButton {
    /// Creates an action button with a click handler.
    #[must_use]
    pub fn new<F>(label: impl Into<String>, on_click: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let on_click: Arc<RowActionFn> = Arc::new(on_click);
        Self {
            label: label.into(),
            variant: ActionVariant::default(),
            on_click: Some(Callback::new(on_click)),
            disabled: None,
            hidden: None,
        }
    }

    /// Sets the button style.
    #[must_use]
    pub fn with_variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Disables the button for rows matching the predicate.
    #[must_use]
    pub fn disabled_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let predicate: Arc<RowPredicateFn> = Arc::new(predicate);
        self.disabled = Some(Callback::new(predicate));
        self
    }

    /// Hides the button for rows matching the predicate.
    #[must_use]
    pub fn hidden_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let predicate: Arc<RowPredicateFn> = Arc::new(predicate);
        self.hidden = Some(Callback::new(predicate));
        self
    }

    /// Returns button label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns button style.
    #[must_use]
    pub fn variant(&self) -> ActionVariant {
        self.variant
    }

    /// Returns whether the button is disabled for this row.
    #[must_use]
    pub fn is_disabled(&self, row: &Value) -> bool {
        self.disabled
            .as_ref()
            .is_some_and(|predicate| predicate.get()(row))
    }

    /// Returns whether the button is hidden for this row.
    #[must_use]
    pub fn is_hidden(&self, row: &Value) -> bool {
        self.hidden
            .as_ref()
            .is_some_and(|predicate| predicate.get()(row))
    }

    /// Invokes the click handler. Returns whether a handler ran.
    pub fn click(&self, row: &Value) -> bool {
        match self.on_click.as_ref() {
            Some(handler) => {
                handler.get()(row);
                true
            }
            None => false,
        }
    }
}

/// Static definition of one table column.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDefinition {
    id: NonEmptyString,
    header: String,
    accessor: Accessor,
    #[serde(default, rename = "type")]
    column_type: ColumnType,
    #[serde(default)]
    sortable: bool,
    #[serde(default)]
    filterable: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    width: Option<String>,
    #[serde(default)]
    align: ColumnAlign,
    #[serde(default)]
    sticky: Option<StickySide>,
    #[serde(default)]
    badge: BTreeMap<String, BadgeStyle>,
    #[serde(default)]
    actions: Vec<ActionButton>,
    #[serde(skip)]
    format: Option<Callback<FormatFn>>,
}

impl ColumnDefinition {
    /// Creates a validated text column.
    pub fn new(
        id: impl Into<String>,
        header: impl Into<String>,
        accessor: impl Into<Accessor>,
    ) -> AppResult<Self> {
        let accessor = accessor.into();
        if let Accessor::Path(path) = &accessor
            && path.trim().is_empty()
        {
            return Err(AppError::Validation(
                "column accessor must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            id: NonEmptyString::new(id)?,
            header: header.into(),
            accessor,
            column_type: ColumnType::default(),
            sortable: false,
            filterable: false,
            hidden: false,
            width: None,
            align: ColumnAlign::default(),
            sticky: None,
            badge: BTreeMap::new(),
            actions: Vec::new(),
            format: None,
        })
    }

    /// Sets the column type tag.
    #[must_use]
    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    /// Marks the column sortable.
    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Marks the column filterable.
    #[must_use]
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Hides the column from display, search and export.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Sets a CSS width.
    #[must_use]
    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Sets cell alignment.
    #[must_use]
    pub fn with_align(mut self, align: ColumnAlign) -> Self {
        self.align = align;
        self
    }

    /// Pins the column.
    #[must_use]
    pub fn with_sticky(mut self, side: StickySide) -> Self {
        self.sticky = Some(side);
        self
    }

    /// Maps one raw value (in its text form) to a badge.
    #[must_use]
    pub fn with_badge(
        mut self,
        raw_value: impl Into<String>,
        label: impl Into<String>,
        color: BadgeColor,
    ) -> Self {
        self.badge.insert(
            raw_value.into(),
            BadgeStyle {
                label: label.into(),
                color,
            },
        );
        self
    }

    /// Sets the action buttons of an actions column.
    #[must_use]
    pub fn with_actions(mut self, actions: Vec<ActionButton>) -> Self {
        self.actions = actions;
        self
    }

    /// Sets a formatter that overrides type-based presentation.
    #[must_use]
    pub fn with_format<F>(mut self, format: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> String + Send + Sync + 'static,
    {
        let format: Arc<FormatFn> = Arc::new(format);
        self.format = Some(Callback::new(format));
        self
    }

    /// Returns column id.
    #[must_use]
    pub fn id(&self) -> &NonEmptyString {
        &self.id
    }

    /// Returns header text.
    #[must_use]
    pub fn header(&self) -> &str {
        self.header.as_str()
    }

    /// Returns the accessor.
    #[must_use]
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// Reads this column's raw value from a row.
    #[must_use]
    pub fn value_of<'row>(&self, row: &'row Value) -> Option<Cow<'row, Value>> {
        self.accessor.resolve(row)
    }

    /// Returns the type tag.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Returns whether this is an actions column.
    #[must_use]
    pub fn is_actions(&self) -> bool {
        self.column_type == ColumnType::Actions
    }

    /// Returns whether header clicks sort by this column.
    #[must_use]
    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    /// Returns whether the column accepts filters.
    #[must_use]
    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    /// Returns whether the column is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns CSS width.
    #[must_use]
    pub fn width(&self) -> Option<&str> {
        self.width.as_deref()
    }

    /// Returns alignment.
    #[must_use]
    pub fn align(&self) -> ColumnAlign {
        self.align
    }

    /// Returns sticky side.
    #[must_use]
    pub fn sticky(&self) -> Option<StickySide> {
        self.sticky
    }

    /// Looks a badge up by the raw value's text form.
    #[must_use]
    pub fn badge_for(&self, raw_key: &str) -> Option<&BadgeStyle> {
        self.badge.get(raw_key)
    }

    /// Returns action buttons.
    #[must_use]
    pub fn actions(&self) -> &[ActionButton] {
        &self.actions
    }

    /// Returns the formatter.
    #[must_use]
    pub fn format(&self) -> Option<&FormatFn> {
        self.format.as_ref().map(Callback::get)
    }
}

/// Sort direction of the active sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns stable value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Column filter operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOperator {
    /// Strict equality with the raw value.
    Equals,
    /// Case-insensitive substring.
    Contains,
    /// Case-insensitive prefix.
    StartsWith,
    /// Case-insensitive suffix.
    EndsWith,
    /// Numeric greater-than.
    Gt,
    /// Numeric less-than.
    Lt,
    /// Declared range operator without an evaluator. Passes every row.
    Between,
    /// Any other operator. Passes every row.
    Unsupported(String),
}

impl FilterOperator {
    /// Returns stable value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Between => "between",
            Self::Unsupported(operator) => operator.as_str(),
        }
    }
}

impl FromStr for FilterOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "equals" => Self::Equals,
            "contains" => Self::Contains,
            "starts_with" | "startsWith" => Self::StartsWith,
            "ends_with" | "endsWith" => Self::EndsWith,
            "gt" => Self::Gt,
            "lt" => Self::Lt,
            "between" => Self::Between,
            other => Self::Unsupported(other.to_owned()),
        })
    }
}

impl<'de> Deserialize<'de> for FilterOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Active filter on one column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnFilter {
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Operand.
    pub value: Value,
}

impl ColumnFilter {
    /// Creates a filter.
    #[must_use]
    pub fn new(operator: FilterOperator, value: Value) -> Self {
        Self { operator, value }
    }
}

fn default_page_size_options() -> Vec<usize> {
    vec![10, 25, 50, 100]
}

/// Pagination settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    enabled: bool,
    page_size: Option<usize>,
    page_size_options: Vec<usize>,
    show_total: bool,
    show_page_size: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            page_size: None,
            page_size_options: default_page_size_options(),
            show_total: false,
            show_page_size: false,
        }
    }
}

impl PaginationConfig {
    /// Creates enabled pagination with an explicit page size.
    pub fn new(page_size: usize) -> AppResult<Self> {
        let config = Self {
            enabled: true,
            page_size: Some(page_size),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Shows the "Showing X to Y of Z" summary.
    #[must_use]
    pub fn with_total(mut self) -> Self {
        self.show_total = true;
        self
    }

    /// Shows the page size picker with these options.
    pub fn with_page_size_options(mut self, options: Vec<usize>) -> AppResult<Self> {
        self.show_page_size = true;
        self.page_size_options = options;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> AppResult<()> {
        if self.page_size == Some(0) || self.page_size_options.contains(&0) {
            return Err(AppError::Validation(
                "page size must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns whether rows are paged.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns configured initial page size.
    #[must_use]
    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    /// Returns page size picker options.
    #[must_use]
    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    /// Returns whether the summary is shown.
    #[must_use]
    pub fn shows_total(&self) -> bool {
        self.show_total
    }

    /// Returns whether the page size picker is shown.
    #[must_use]
    pub fn shows_page_size(&self) -> bool {
        self.show_page_size
    }
}

/// Row selection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// At most one selected row.
    Single,
    /// Any number of selected rows.
    #[default]
    Multiple,
}

/// Row selection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    enabled: bool,
    mode: SelectionMode,
    #[serde(skip)]
    on_selection_change: Option<Callback<SelectionChangeFn>>,
}

impl SelectionConfig {
    /// Enables selection in the given mode.
    #[must_use]
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            enabled: true,
            mode,
            on_selection_change: None,
        }
    }

    /// Sets the selection change callback.
    #[must_use]
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let callback: Arc<SelectionChangeFn> = Arc::new(callback);
        self.on_selection_change = Some(Callback::new(callback));
        self
    }

    /// Returns whether rows can be selected.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns selection mode.
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Returns the selection change callback.
    #[must_use]
    pub fn change_callback(&self) -> Option<&SelectionChangeFn> {
        self.on_selection_change.as_ref().map(Callback::get)
    }
}

/// Table colours and presentation flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableTheme {
    /// Primary and secondary colours.
    #[serde(flatten)]
    pub colors: ThemeColors,
    /// Alternate row shading.
    pub striped_rows: bool,
    /// Highlight the hovered row.
    pub hover_rows: bool,
    /// Cell borders.
    pub bordered: bool,
    /// Reduced padding.
    pub compact: bool,
}

/// Table header metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableMeta {
    /// Heading.
    pub title: Option<String>,
    /// Sub heading.
    pub subtitle: Option<String>,
    /// Descriptive text.
    pub description: Option<String>,
    /// Presentation settings.
    pub theme: TableTheme,
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Comma separated values.
    Csv,
    /// Pretty-printed JSON array.
    Json,
    /// Spreadsheet produced by the backend.
    Excel,
}

impl ExportFormat {
    /// Returns stable value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Excel => "excel",
        }
    }

    /// Returns file extension.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Excel => "xlsx",
        }
    }

    /// Returns MIME type of the produced file.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv;charset=utf-8",
            Self::Json => "application/json",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "excel" | "xlsx" => Ok(Self::Excel),
            _ => Err(AppError::Validation(format!(
                "unknown export format '{value}'"
            ))),
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
struct TableSchemaDocument {
    id: String,
    #[serde(default)]
    meta: TableMeta,
    columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pagination: PaginationConfig,
    #[serde(default)]
    selection: SelectionConfig,
    #[serde(default)]
    searchable: bool,
    #[serde(default)]
    exportable: bool,
    #[serde(default)]
    refreshable: bool,
    #[serde(default)]
    row_key: Option<String>,
}

/// Immutable blueprint of a table, shared by every session created from it.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "TableSchemaDocument")]
pub struct TableSchema {
    id: NonEmptyString,
    meta: TableMeta,
    columns: Vec<ColumnDefinition>,
    pagination: PaginationConfig,
    selection: SelectionConfig,
    searchable: bool,
    exportable: bool,
    refreshable: bool,
    row_key: Option<Accessor>,
    on_refresh: Option<Callback<RefreshFn>>,
    on_export: Option<Callback<ExportHookFn>>,
}

impl TableSchema {
    /// Creates a validated table schema.
    pub fn new(
        id: impl Into<String>,
        meta: TableMeta,
        columns: Vec<ColumnDefinition>,
    ) -> AppResult<Self> {
        let mut seen_columns = HashSet::new();
        for column in &columns {
            if !seen_columns.insert(column.id().as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate column id '{}' in table schema",
                    column.id().as_str()
                )));
            }
        }

        Ok(Self {
            id: NonEmptyString::new(id)?,
            meta,
            columns,
            pagination: PaginationConfig::default(),
            selection: SelectionConfig::default(),
            searchable: false,
            exportable: false,
            refreshable: false,
            row_key: None,
            on_refresh: None,
            on_export: None,
        })
    }

    /// Sets pagination.
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Sets row selection.
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Enables free-text search.
    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Enables the export menu.
    #[must_use]
    pub fn exportable(mut self) -> Self {
        self.exportable = true;
        self
    }

    /// Enables the refresh button.
    #[must_use]
    pub fn refreshable(mut self) -> Self {
        self.refreshable = true;
        self
    }

    /// Identifies rows by the value at this path instead of their full content.
    #[must_use]
    pub fn with_row_key(mut self, path: impl Into<String>) -> Self {
        self.row_key = Some(Accessor::Path(path.into()));
        self
    }

    /// Sets the refresh hook.
    #[must_use]
    pub fn on_refresh<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let hook: Arc<RefreshFn> = Arc::new(hook);
        self.on_refresh = Some(Callback::new(hook));
        self
    }

    /// Sets the export hook, replacing built-in export for every format.
    #[must_use]
    pub fn on_export<F>(mut self, hook: F) -> Self
    where
        F: Fn(ExportFormat, &[Value]) + Send + Sync + 'static,
    {
        let hook: Arc<ExportHookFn> = Arc::new(hook);
        self.on_export = Some(Callback::new(hook));
        self
    }

    /// Returns schema id.
    #[must_use]
    pub fn id(&self) -> &NonEmptyString {
        &self.id
    }

    /// Returns header metadata.
    #[must_use]
    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    /// Returns every column in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Returns the columns that are not hidden.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|column| !column.is_hidden())
    }

    /// Looks one column up by id.
    #[must_use]
    pub fn column(&self, column_id: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|column| column.id().as_str() == column_id)
    }

    /// Returns pagination settings.
    #[must_use]
    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    /// Returns selection settings.
    #[must_use]
    pub fn selection(&self) -> &SelectionConfig {
        &self.selection
    }

    /// Returns whether free-text search is enabled.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Returns whether the export menu is shown.
    #[must_use]
    pub fn is_exportable(&self) -> bool {
        self.exportable
    }

    /// Returns whether the refresh button is shown.
    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        self.refreshable
    }

    /// Returns the row key accessor.
    #[must_use]
    pub fn row_key(&self) -> Option<&Accessor> {
        self.row_key.as_ref()
    }

    /// Returns the refresh hook.
    #[must_use]
    pub fn refresh_hook(&self) -> Option<&RefreshFn> {
        self.on_refresh.as_ref().map(Callback::get)
    }

    /// Returns the export hook.
    #[must_use]
    pub fn export_hook(&self) -> Option<&ExportHookFn> {
        self.on_export.as_ref().map(Callback::get)
    }
}

impl TryFrom<TableSchemaDocument> for TableSchema {
    type Error = AppError;

    fn try_from(document: TableSchemaDocument) -> Result<Self, Self::Error> {
        document.pagination.validate()?;

        let mut schema = Self::new(document.id, document.meta, document.columns)?
            .with_pagination(document.pagination)
            .with_selection(document.selection);
        schema.searchable = document.searchable;
        schema.exportable = document.exportable;
        schema.refreshable = document.refreshable;
        schema.row_key = document.row_key.map(Accessor::Path);
        Ok(schema)
    }
}
