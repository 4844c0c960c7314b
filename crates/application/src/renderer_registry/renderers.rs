use std::fmt::Write as _;

use januscope_core::{AppError, AppResult};
use januscope_domain::FieldDefinition;
use serde_json::Value;

use super::controls::{FileHandle, date_input_value, is_member, selected_label};
use super::markup::{
    control_attributes, error_message, escape_html, field_container, input_class,
    optional_attribute, required_marker,
};
use super::{FieldRenderContext, FieldRenderer};
use crate::value_text::{display_text, is_truthy, strict_equals};

const DEFAULT_TEXTAREA_ROWS: u16 = 3;
const DEFAULT_PASSWORD_AUTOCOMPLETE: &str = "current-password";

fn text_value(value: Option<&Value>) -> String {
    escape_html(&display_text(value))
}

fn unexpected_value(field: &FieldDefinition, expected: &str) -> AppError {
    AppError::Render(format!(
        "field '{}' holds a value that is not {expected}",
        field.id().as_str()
    ))
}

/// Single-line text input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl FieldRenderer for TextRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let control = format!(
            r#"<input type="{}" name="{}" value="{}" class="{}"{}{}{} />"#,
            field.input_type().as_str(),
            escape_html(field.id().as_str()),
            text_value(context.value),
            input_class("text-input", context.error),
            optional_attribute("placeholder", field.placeholder()),
            optional_attribute("autocomplete", field.props().auto_complete.as_deref()),
            control_attributes(field, context.error),
        );
        Ok(field_container(field, context.error, &control))
    }
}

/// Masked text input with a reveal toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordRenderer;

impl FieldRenderer for PasswordRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let revealed = context.ui.password_revealed;
        let control = format!(
            concat!(
                r#"<div class="password-container">"#,
                r#"<input type="{}" name="{}" value="{}" class="{}" autocomplete="{}"{}{} />"#,
                r#"<button type="button" class="password-toggle" tabindex="-1" aria-label="{}">{}</button>"#,
                "</div>"
            ),
            if revealed { "text" } else { "password" },
            escape_html(field.id().as_str()),
            text_value(context.value),
            input_class("text-input", context.error),
            escape_html(
                field
                    .props()
                    .auto_complete
                    .as_deref()
                    .unwrap_or(DEFAULT_PASSWORD_AUTOCOMPLETE)
            ),
            optional_attribute("placeholder", field.placeholder()),
            control_attributes(field, context.error),
            if revealed { "Hide password" } else { "Show password" },
            if revealed { "Hide" } else { "Show" },
        );
        Ok(field_container(field, context.error, &control))
    }
}

/// Multi-line text input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextareaRenderer;

impl FieldRenderer for TextareaRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let control = format!(
            r#"<textarea name="{}" rows="{}" class="{}"{}{}>{}</textarea>"#,
            escape_html(field.id().as_str()),
            field.props().min_rows.unwrap_or(DEFAULT_TEXTAREA_ROWS),
            input_class("textarea-input", context.error),
            optional_attribute("placeholder", field.placeholder()),
            control_attributes(field, context.error),
            text_value(context.value),
        );
        Ok(field_container(field, context.error, &control))
    }
}

/// Dropdown with a single choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectRenderer;

impl FieldRenderer for SelectRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let options = &field.props().options;
        let state = context.ui.select;
        let has_value = options
            .iter()
            .any(|option| strict_equals(context.value, &option.value));

        let mut control = String::from(r#"<div class="select-container">"#);
        let _ = write!(
            control,
            concat!(
                r#"<div class="select-trigger" role="combobox" aria-haspopup="listbox" aria-expanded="{}" tabindex="0"{}>"#,
                r#"<span class="{}">{}</span>"#,
                r#"<span class="select-arrow{}">▼</span>"#,
                "</div>"
            ),
            state.is_open(),
            control_attributes(field, context.error),
            if has_value { "selected" } else { "placeholder" },
            escape_html(selected_label(options, context.value, field.placeholder())),
            if state.is_open() { " open" } else { "" },
        );

        if state.is_open() {
            control.push_str(r#"<div class="select-dropdown" role="listbox">"#);
            for (index, option) in options.iter().enumerate() {
                let selected = strict_equals(context.value, &option.value);
                let focused = state.focused_index() == Some(index);
                let _ = write!(
                    control,
                    r#"<div class="select-option{}{}" role="option" aria-selected="{selected}" data-index="{index}">{}</div>"#,
                    if selected { " selected" } else { "" },
                    if focused { " focused" } else { "" },
                    escape_html(&option.label),
                );
            }
            control.push_str("</div>");
        }
        control.push_str("</div>");

        Ok(field_container(field, context.error, &control))
    }
}

/// Checkbox group holding an array of chosen values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiselectRenderer;

impl FieldRenderer for MultiselectRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        if !matches!(context.value, None | Some(Value::Null | Value::Array(_))) {
            return Err(unexpected_value(field, "a list"));
        }

        let mut control = String::from(
            r#"<div class="multiselect-container"><div class="multiselect-options">"#,
        );
        for (index, option) in field.props().options.iter().enumerate() {
            let _ = write!(
                control,
                r#"<label class="multiselect-option"><input type="checkbox" data-index="{index}"{} />{}</label>"#,
                if is_member(context.value, &option.value) {
                    " checked"
                } else {
                    ""
                },
                escape_html(&option.label),
            );
        }
        control.push_str("</div></div>");

        Ok(field_container(field, context.error, &control))
    }
}

/// Radio group with a single choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadioRenderer;

impl FieldRenderer for RadioRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let name = escape_html(field.id().as_str());

        let mut control = String::from(r#"<div class="radio-group" role="radiogroup">"#);
        for option in &field.props().options {
            let _ = write!(
                control,
                r#"<label class="radio-option"><input type="radio" name="{name}" value="{}"{} /><span class="radio-label">{}</span></label>"#,
                escape_html(&display_text(Some(&option.value))),
                if strict_equals(context.value, &option.value) {
                    " checked"
                } else {
                    ""
                },
                escape_html(&option.label),
            );
        }
        control.push_str("</div>");

        Ok(field_container(field, context.error, &control))
    }
}

/// Single boolean checkbox with an inline label.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckboxRenderer;

impl FieldRenderer for CheckboxRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        Ok(format!(
            concat!(
                r#"<div class="field-container"><label class="checkbox-container">"#,
                r#"<input type="checkbox" name="{}"{}{} />"#,
                r#"<span class="checkbox-label">{}{}</span></label>{}</div>"#
            ),
            escape_html(field.id().as_str()),
            if is_truthy(context.value) { " checked" } else { "" },
            control_attributes(field, context.error),
            escape_html(field.label()),
            required_marker(field),
            error_message(field, context.error),
        ))
    }
}

/// Boolean toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchRenderer;

impl FieldRenderer for SwitchRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let checked = is_truthy(context.value);
        let control = format!(
            concat!(
                r#"<label class="switch-container">"#,
                r#"<input type="checkbox" class="switch-input" role="switch" name="{}" aria-checked="{checked}"{}{} />"#,
                r#"<span class="switch-slider"></span></label>"#
            ),
            escape_html(field.id().as_str()),
            if checked { " checked" } else { "" },
            control_attributes(field, context.error),
            checked = checked,
        );
        Ok(field_container(field, context.error, &control))
    }
}

/// Numeric input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberRenderer;

impl FieldRenderer for NumberRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        if !matches!(context.value, None | Some(Value::Null | Value::Number(_))) {
            return Err(unexpected_value(field, "a number"));
        }

        let props = field.props();
        let control = format!(
            r#"<input type="number" name="{}" value="{}" class="{}"{}{}{}{}{} />"#,
            escape_html(field.id().as_str()),
            text_value(context.value),
            input_class("number-input", context.error),
            optional_attribute("min", props.min),
            optional_attribute("max", props.max),
            optional_attribute("step", props.step),
            optional_attribute("placeholder", field.placeholder()),
            control_attributes(field, context.error),
        );
        Ok(field_container(field, context.error, &control))
    }
}

/// Calendar date input storing `YYYY-MM-DD` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRenderer;

impl FieldRenderer for DateRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let value = match context.value {
            None | Some(Value::Null) => "",
            Some(Value::String(text)) => text.as_str(),
            Some(_) => return Err(unexpected_value(field, "a date string")),
        };

        let props = field.props();
        let control = format!(
            r#"<input type="date" name="{}" value="{}" class="{}"{}{}{} />"#,
            escape_html(field.id().as_str()),
            escape_html(value),
            input_class("date-input", context.error),
            optional_attribute("min", props.min_date.as_ref().map(date_input_value)),
            optional_attribute("max", props.max_date.as_ref().map(date_input_value)),
            control_attributes(field, context.error),
        );
        Ok(field_container(field, context.error, &control))
    }
}

/// File picker holding a file handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRenderer;

impl FieldRenderer for FileRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        let field = context.field;
        let handle = match context.value {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                FileHandle::from_value(value)
                    .ok_or_else(|| unexpected_value(field, "a file handle"))?,
            ),
        };

        let mut control = format!(
            r#"<input type="file" name="{}" class="file-input-hidden"{}{} />"#,
            escape_html(field.id().as_str()),
            optional_attribute("accept", field.props().accept.as_deref()),
            control_attributes(field, context.error),
        );
        let error_class = if context.error.is_some() { " error" } else { "" };
        match handle {
            None => {
                let _ = write!(
                    control,
                    r#"<label class="file-input-label{error_class}"><span class="file-input-text">Choose file…</span><span class="file-input-button">Browse</span></label>"#
                );
            }
            Some(handle) => {
                let _ = write!(
                    control,
                    concat!(
                        r#"<div class="file-selected{}"><div class="file-info">"#,
                        r#"<span class="file-name">{}</span><span class="file-size">{}</span></div>"#,
                        r#"<button type="button" class="file-remove" aria-label="Remove file">Remove</button></div>"#
                    ),
                    error_class,
                    escape_html(&handle.name),
                    handle.size_label(),
                );
            }
        }

        Ok(field_container(field, context.error, &control))
    }
}

