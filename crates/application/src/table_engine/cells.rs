use std::fmt::{Display, Write as _};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use januscope_domain::{ActionVariant, BadgeColor, ColumnDefinition, ColumnType};
use serde_json::Value;

use crate::value_text::{display_text, is_truthy};

const PLACEHOLDER: &str = "-";
const INVALID_DATE: &str = "Invalid Date";

/// Presentation of one table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    /// Plain text.
    Text(String),
    /// Coloured label.
    Badge {
        /// Display label.
        label: String,
        /// Severity colour.
        color: BadgeColor,
    },
    /// Row action buttons that are not hidden for this row.
    Actions(Vec<ActionView>),
}

impl CellContent {
    /// Returns the text a reader sees, without markup.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Badge { label, .. } => label.clone(),
            Self::Actions(actions) => actions
                .iter()
                .map(|action| action.label.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// One action button as shown for a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView {
    /// Position in the column's action list, used to trigger it.
    pub index: usize,
    /// Button label.
    pub label: String,
    /// Button style.
    pub variant: ActionVariant,
    /// Whether the button is disabled for this row.
    pub disabled: bool,
}

/// Presents a cell. A column format function always wins over the column type.
#[must_use]
pub fn cell_content(column: &ColumnDefinition, row: &Value, date_format: &str) -> CellContent {
    let value = column.value_of(row);
    let value = value.as_deref();

    if let Some(format) = column.format() {
        return CellContent::Text(format(value, row));
    }

    match column.column_type() {
        ColumnType::Boolean => CellContent::Text(yes_no(is_truthy(value)).to_owned()),
        ColumnType::Date => CellContent::Text(match value {
            Some(value) if is_truthy(Some(value)) => format_date(value, date_format),
            _ => PLACEHOLDER.to_owned(),
        }),
        ColumnType::Badge => {
            let raw = display_text(value);
            match column.badge_for(&raw) {
                Some(badge) => CellContent::Badge {
                    label: badge.label.clone(),
                    color: badge.color,
                },
                None => CellContent::Text(raw),
            }
        }
        ColumnType::Actions => CellContent::Actions(
            column
                .actions()
                .iter()
                .enumerate()
                .filter(|(_, action)| !action.is_hidden(row))
                .map(|(index, action)| ActionView {
                    index,
                    label: action.label().to_owned(),
                    variant: action.variant(),
                    disabled: action.is_disabled(row),
                })
                .collect(),
        ),
        ColumnType::Text | ColumnType::Number | ColumnType::Custom => match value {
            None | Some(Value::Null) => CellContent::Text(PLACEHOLDER.to_owned()),
            Some(value) => CellContent::Text(display_text(Some(value))),
        },
    }
}

/// Unquoted CSV text of a cell. Format functions are not applied.
#[must_use]
pub fn csv_cell(column: &ColumnDefinition, row: &Value, date_format: &str) -> String {
    let value = column.value_of(row);

    match value.as_deref() {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(flag)) => yes_no(*flag).to_owned(),
        Some(value) if column.column_type() == ColumnType::Date && is_truthy(Some(value)) => {
            format_date(value, date_format)
        }
        Some(value) => display_text(Some(value)),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Formats an ISO date, date-time or epoch-milliseconds value.
///
/// Date-only text is a calendar date; instants are shown in local time.
fn format_date(value: &Value, date_format: &str) -> String {
    let formatted = match value {
        Value::String(text) => {
            let text = text.trim();
            if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
                render(instant.with_timezone(&Local).format(date_format))
            } else if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
            {
                render(naive.format(date_format))
            } else if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                render(date.format(date_format))
            } else {
                None
            }
        }
        Value::Number(number) => number
            .as_f64()
            .filter(|millis| millis.is_finite())
            .and_then(|millis| DateTime::from_timestamp_millis(millis as i64))
            .and_then(|instant| render(instant.with_timezone(&Local).format(date_format))),
        _ => None,
    };

    formatted.unwrap_or_else(|| INVALID_DATE.to_owned())
}

/// Writes a lazily formatted date. A bad pattern yields `None` instead of a panic.
fn render(formatted: impl Display) -> Option<String> {
    let mut text = String::new();
    write!(text, "{formatted}").ok()?;
    Some(text)
}
