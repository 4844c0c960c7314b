use chrono::{DateTime, Datelike, Local, TimeZone};
use januscope_domain::{FieldProps, SelectOption};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::value_text::strict_equals;

/// Placeholder of a select without value or configured placeholder.
pub const SELECT_PLACEHOLDER: &str = "Select…";

/// Effect of a control event on the stored field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Store this value.
    Set(Value),
    /// Remove the value so the field reads as "no value".
    Clear,
    /// Leave the stored value as it is.
    Unchanged,
}

/// Interprets the raw text of a number input.
///
/// Empty input clears the value until blur; unparseable input stores `0`.
#[must_use]
pub fn number_input(raw: &str) -> FieldUpdate {
    if raw.is_empty() {
        return FieldUpdate::Clear;
    }

    let parsed = raw.trim().parse::<f64>().ok().filter(|value| value.is_finite());
    FieldUpdate::Set(parsed.map_or_else(|| Value::from(0), number_value))
}

/// Coerces a still-empty number field to `0` when it loses focus.
#[must_use]
pub fn number_blur(current: Option<&Value>) -> FieldUpdate {
    match current {
        None | Some(Value::Null) => FieldUpdate::Set(Value::from(0)),
        Some(_) => FieldUpdate::Unchanged,
    }
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        return Value::from(value as i64);
    }

    Number::from_f64(value).map_or(Value::from(0), Value::Number)
}

/// Formats a date for a date input from its calendar components.
#[must_use]
pub fn date_input_value<D: Datelike>(date: &D) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Formats an instant as the local calendar date it falls on.
#[must_use]
pub fn local_date_input_value<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    date_input_value(&instant.with_timezone(&Local))
}

/// Toggles membership of `option` in an array value.
#[must_use]
pub fn toggle_member(current: Option<&Value>, option: &Value) -> Value {
    let mut items = match current {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    match items
        .iter()
        .position(|item| strict_equals(Some(item), option))
    {
        Some(index) => {
            items.remove(index);
        }
        None => items.push(option.clone()),
    }

    Value::Array(items)
}

/// Returns whether an array value includes `option`.
#[must_use]
pub fn is_member(current: Option<&Value>, option: &Value) -> bool {
    matches!(current, Some(Value::Array(items)) if items.iter().any(|item| strict_equals(Some(item), option)))
}

/// Stored value of a checkbox or switch.
#[must_use]
pub fn checked_change(checked: bool) -> FieldUpdate {
    FieldUpdate::Set(Value::Bool(checked))
}

/// Reference to a chosen file. The bytes stay with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Declared MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl FileHandle {
    /// Creates a file handle.
    #[must_use]
    pub fn new(name: impl Into<String>, size: u64, mime_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type,
        }
    }

    /// Reads a handle back from a stored value.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Returns the stored form of this handle.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "size": self.size,
            "mime_type": self.mime_type,
        })
    }

    /// Returns the size in kilobytes with two decimals.
    #[must_use]
    pub fn size_label(&self) -> String {
        let kilobytes = self.size as f64 / 1024.0;
        format!("{kilobytes:.2} KB")
    }
}

/// Interprets a file picker selection.
///
/// Oversized files are ignored and leave the previous value in place.
#[must_use]
pub fn file_selection(props: &FieldProps, file: Option<FileHandle>) -> FieldUpdate {
    match file {
        None => FieldUpdate::Set(Value::Null),
        Some(file) if props.max_size.is_some_and(|max_size| file.size > max_size) => {
            FieldUpdate::Unchanged
        }
        Some(file) => FieldUpdate::Set(file.to_value()),
    }
}

/// Keys handled by the select trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectKey {
    /// Enter.
    Enter,
    /// Space bar.
    Space,
    /// Escape.
    Escape,
    /// Arrow down.
    ArrowDown,
    /// Arrow up.
    ArrowUp,
}

/// Open state and keyboard focus of one select control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectState {
    open: bool,
    focused_index: Option<usize>,
}

impl SelectState {
    /// Returns whether the option list is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns the keyboard-focused option.
    #[must_use]
    pub fn focused_index(&self) -> Option<usize> {
        self.focused_index
    }

    /// Opens or closes the list, as a trigger click does.
    pub fn toggle(&mut self, option_count: usize) {
        if self.open {
            self.close();
        } else {
            self.open(option_count);
        }
    }

    fn open(&mut self, option_count: usize) {
        self.open = true;
        self.focused_index = (option_count > 0).then_some(0);
    }

    /// Closes the list.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Handles a click anywhere outside the control.
    pub fn click_outside(&mut self) {
        self.close();
    }

    /// Handles a key pressed on the trigger.
    pub fn handle_key(&mut self, key: SelectKey, option_count: usize) {
        match key {
            SelectKey::Enter | SelectKey::Space => self.toggle(option_count),
            SelectKey::Escape => self.close(),
            SelectKey::ArrowDown if !self.open => self.open(option_count),
            SelectKey::ArrowDown => {
                let last = option_count.saturating_sub(1);
                self.focused_index = Some(self.focused_index.map_or(0, |index| (index + 1).min(last)));
            }
            SelectKey::ArrowUp if self.open => {
                self.focused_index = Some(self.focused_index.map_or(0, |index| index.saturating_sub(1)));
            }
            SelectKey::ArrowUp => {}
        }
    }

    /// Chooses one option and closes the list.
    pub fn choose(&mut self, options: &[SelectOption], index: usize) -> FieldUpdate {
        let Some(option) = options.get(index) else {
            return FieldUpdate::Unchanged;
        };

        self.close();
        FieldUpdate::Set(option.value.clone())
    }
}

/// Label shown on a select trigger for the current value.
#[must_use]
pub fn selected_label<'a>(
    options: &'a [SelectOption],
    value: Option<&Value>,
    placeholder: Option<&'a str>,
) -> &'a str {
    options
        .iter()
        .find(|option| strict_equals(value, &option.value))
        .map(|option| option.label.as_str())
        .or(placeholder)
        .unwrap_or(SELECT_PLACEHOLDER)
}
