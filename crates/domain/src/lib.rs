//! Declarative form and table schemas.

#![forbid(unsafe_code)]

/// Built-in table schemas for the dashboard screens.
pub mod catalog;

mod callback;
mod form;
mod table;
mod theme;
mod validation_rule;
mod visibility;

pub use callback::Callback;
pub use form::{
    FieldDefinition, FieldProps, FormErrors, FormMeta, FormSchema, FormValues, InputType,
    LayoutNode, RendererKind, SchemaIssue, SelectOption, Spacing,
};
pub use table::{
    Accessor, AccessorFn, ActionButton, ActionVariant, BadgeColor, BadgeStyle, ColumnAlign,
    ColumnDefinition, ColumnFilter, ColumnType, ExportFormat, ExportHookFn, FilterOperator,
    FormatFn, PaginationConfig, RefreshFn, RowActionFn, RowPredicateFn, SelectionChangeFn,
    SelectionConfig, SelectionMode, SortDirection, StickySide, TableMeta, TableSchema, TableTheme,
};
pub use theme::{HOVER_DARKEN_AMOUNT, Rgb, ThemeColors, darken_hex};
pub use validation_rule::{
    BoundRule, CustomValidateFn, CustomValidation, LengthRule, PatternRule, ValidationRules,
};
pub use visibility::{VisibilityCondition, VisibilityOperator};
