use std::sync::Arc;

use serde_json::{Value, json};

use januscope_core::{AppError, AppResult};
use januscope_domain::{FieldDefinition, FieldProps, RendererKind, SelectOption, ValidationRules};

use super::{
    FieldRenderContext, FieldRenderer, FieldUiState, FileHandle, RendererRegistry, escape_html,
};

fn field(id: &str, renderer: RendererKind) -> FieldDefinition {
    FieldDefinition::new(id, "Label", renderer).unwrap_or_else(|_| unreachable!())
}

fn render(registry: &RendererRegistry, field: &FieldDefinition, value: Option<&Value>) -> String {
    registry.render_field(&FieldRenderContext {
        field,
        value,
        error: None,
        ui: FieldUiState::default(),
    })
}

struct PanickingRenderer;

impl FieldRenderer for PanickingRenderer {
    fn render(&self, _context: &FieldRenderContext<'_>) -> AppResult<String> {
        panic!("rating widget exploded");
    }
}

struct FailingRenderer;

impl FieldRenderer for FailingRenderer {
    fn render(&self, _context: &FieldRenderContext<'_>) -> AppResult<String> {
        Err(AppError::Render("stars must be between 1 and 5".to_owned()))
    }
}

struct BadgeRenderer;

impl FieldRenderer for BadgeRenderer {
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String> {
        Ok(format!("<span>{}</span>", context.field.id()))
    }
}

#[test]
fn unknown_renderer_kind_renders_a_marker() {
    let rating = field("rating", RendererKind::Unrecognized("rating".to_owned()));

    let html = render(&RendererRegistry::standard(), &rating, None);

    assert!(html.contains("Unknown renderer: rating"));
}

#[test]
fn renderer_panics_are_contained_to_the_field() {
    let mut registry = RendererRegistry::standard();
    let kind = RendererKind::Unrecognized("rating".to_owned());
    registry.register(kind.clone(), Arc::new(PanickingRenderer));

    let html = render(&registry, &field("rating", kind), None);

    assert!(html.contains("Something went wrong"));
    assert!(html.contains("rating widget exploded"));
}

#[test]
fn renderer_errors_degrade_to_the_placeholder() {
    let mut registry = RendererRegistry::standard();
    registry.register(RendererKind::Number, Arc::new(FailingRenderer));

    let html = render(&registry, &field("stars", RendererKind::Number), Some(&json!(7)));

    assert!(html.contains("stars must be between 1 and 5"));
}

#[test]
fn registering_a_kind_replaces_the_standard_control() {
    let mut registry = RendererRegistry::standard();

    let previous = registry.register(RendererKind::Text, Arc::new(BadgeRenderer));

    assert!(previous.is_some());
    assert_eq!(
        render(&registry, &field("name", RendererKind::Text), None),
        "<span>name</span>"
    );
}

#[test]
fn empty_registry_knows_no_kinds() {
    let registry = RendererRegistry::empty();

    assert!(registry.get(&RendererKind::Text).is_none());
    assert!(render(&registry, &field("name", RendererKind::Text), None).contains("Unknown renderer: text"));
}

#[test]
fn required_fields_carry_a_marker_and_error_wiring() {
    let name = field("name", RendererKind::Text)
        .with_rules(ValidationRules::default().required("Name is required"));

    let html = RendererRegistry::standard().render_field(&FieldRenderContext {
        field: &name,
        value: Some(&json!("<b>")),
        error: Some("Name is required"),
        ui: FieldUiState::default(),
    });

    assert!(html.contains(r#"<span class="required">*</span>"#));
    assert!(html.contains(r#"aria-describedby="name-error""#));
    assert!(html.contains(r#"value="&lt;b&gt;""#));
    assert!(html.contains(r#"role="alert">Name is required</div>"#));
}

#[test]
fn password_reveal_switches_the_input_type() {
    let password = field("secret", RendererKind::Password);
    let registry = RendererRegistry::standard();
    let mut context = FieldRenderContext {
        field: &password,
        value: None,
        error: None,
        ui: FieldUiState::default(),
    };

    assert!(registry.render_field(&context).contains(r#"type="password""#));

    context.ui.password_revealed = true;
    assert!(registry.render_field(&context).contains(r#"type="text""#));
}

#[test]
fn value_shape_mismatches_are_reported_per_control() {
    let registry = RendererRegistry::standard();

    let number = render(&registry, &field("count", RendererKind::Number), Some(&json!("seven")));
    let file = render(&registry, &field("upload", RendererKind::File), Some(&json!(3)));

    assert!(number.contains("Something went wrong"));
    assert!(file.contains("Something went wrong"));
}

#[test]
fn file_control_shows_the_chosen_file() {
    let handle = FileHandle::new("report.pdf", 2048, Some("application/pdf".to_owned()));

    let html = render(
        &RendererRegistry::standard(),
        &field("upload", RendererKind::File),
        Some(&handle.to_value()),
    );

    assert!(html.contains("report.pdf"));
    assert!(html.contains("2.00 KB"));
}

#[test]
fn radio_marks_the_current_option() {
    let props = FieldProps {
        options: vec![
            SelectOption::new("Up", json!("up")),
            SelectOption::new("Down", json!("down")),
        ],
        ..FieldProps::default()
    };
    let status = field("status", RendererKind::Radio).with_props(props);

    let html = render(&RendererRegistry::standard(), &status, Some(&json!("down")));

    assert!(html.contains(r#"value="down" checked"#));
    assert!(!html.contains(r#"value="up" checked"#));
}

#[test]
fn escaping_covers_quotes() {
    assert_eq!(escape_html(r#"a"b'c"#), "a&quot;b&#39;c");
}
