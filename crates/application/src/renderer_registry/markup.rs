use std::fmt::Write as _;

use januscope_domain::FieldDefinition;

/// Escapes text for use in HTML content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub(super) fn required_marker(field: &FieldDefinition) -> &'static str {
    if field.is_required() {
        r#"<span class="required">*</span>"#
    } else {
        ""
    }
}

/// `id` and ARIA attributes tying a control to its label and error.
pub(super) fn control_attributes(field: &FieldDefinition, error: Option<&str>) -> String {
    let id = escape_html(field.id().as_str());
    match error {
        Some(_) => format!(r#" id="{id}" aria-invalid="true" aria-describedby="{id}-error""#),
        None => format!(r#" id="{id}" aria-invalid="false""#),
    }
}

pub(super) fn error_message(field: &FieldDefinition, error: Option<&str>) -> String {
    error.map_or_else(String::new, |message| {
        format!(
            r#"<div id="{}-error" class="field-error" role="alert">{}</div>"#,
            escape_html(field.id().as_str()),
            escape_html(message)
        )
    })
}

/// Label, control and error wrapper shared by most controls.
pub(super) fn field_container(field: &FieldDefinition, error: Option<&str>, control: &str) -> String {
    let mut html = String::from(r#"<div class="field-container">"#);
    let _ = write!(
        html,
        r#"<label class="field-label" for="{}">{}{}</label>"#,
        escape_html(field.id().as_str()),
        escape_html(field.label()),
        required_marker(field)
    );
    html.push_str(control);
    html.push_str(&error_message(field, error));
    html.push_str("</div>");
    html
}

pub(super) fn input_class(base: &str, error: Option<&str>) -> String {
    if error.is_some() {
        format!("{base} error")
    } else {
        base.to_owned()
    }
}

pub(super) fn optional_attribute(name: &str, value: Option<impl ToString>) -> String {
    value.map_or_else(String::new, |value| {
        format!(r#" {name}="{}""#, escape_html(&value.to_string()))
    })
}

pub(super) fn unknown_renderer(kind: &str) -> String {
    format!(
        r#"<div class="field-error">Unknown renderer: {}</div>"#,
        escape_html(kind)
    )
}

pub(super) fn render_failure(message: &str) -> String {
    format!(
        concat!(
            r#"<div class="field-error field-render-failure">"#,
            "<h3>Something went wrong</h3>",
            "<p>There was an error rendering this form field.</p>",
            "<details><summary>Error details</summary><pre>{}</pre></details>",
            "</div>"
        ),
        escape_html(message)
    )
}
