use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{Value, json};

use januscope_core::{AppError, AppResult};
use januscope_domain::{
    CustomValidation, FieldDefinition, FormMeta, FormSchema, FormValues, LayoutNode, RendererKind,
    ThemeColors, ValidationRules, VisibilityCondition, VisibilityOperator, catalog,
};

use crate::form_ports::FormSubmitHandler;
use crate::renderer_registry::{RendererRegistry, number_input};

use super::{
    FormController, FormOptions, FormSession, FormSessionInput, SubmitAttempt, SubmitOutcome,
    is_visible, theme_variables, validate_field, validate_form,
};

fn field(id: &str, renderer: RendererKind) -> FieldDefinition {
    FieldDefinition::new(id, id, renderer).unwrap_or_else(|_| unreachable!())
}

fn condition(field_id: &str, op: VisibilityOperator, value: Value) -> VisibilityCondition {
    VisibilityCondition::new(field_id, op, value).unwrap_or_else(|_| unreachable!())
}

fn values(entries: &[(&str, Value)]) -> FormValues {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

fn service_form() -> Arc<FormSchema> {
    Arc::new(catalog::service_form().unwrap_or_else(|_| unreachable!()))
}

/// `kind` select plus `detail`, shown only while `kind == "other"`.
fn conditional_schema() -> Arc<FormSchema> {
    let fields = vec![
        field("kind", RendererKind::Select),
        field("detail", RendererKind::Text)
            .with_rules(ValidationRules::default().required("Detail is required"))
            .visible_when(condition("kind", VisibilityOperator::Equals, json!("other"))),
    ];
    let layout = vec![LayoutNode::field("kind"), LayoutNode::field("detail")];

    Arc::new(
        FormSchema::new("conditional", FormMeta::titled("Conditional"), fields, layout)
            .unwrap_or_else(|_| unreachable!()),
    )
}

struct SlowSubmitHandler {
    calls: AtomicUsize,
    failure: Option<String>,
}

impl SlowSubmitHandler {
    fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failure: None,
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failure: Some(message.to_owned()),
        }
    }
}

#[async_trait]
impl FormSubmitHandler for SlowSubmitHandler {
    async fn submit(&self, _values: FormValues) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        match self.failure.as_ref() {
            Some(message) => Err(AppError::Submission(message.clone())),
            None => Ok(()),
        }
    }
}

#[test]
fn required_rule_fires_before_other_rules() {
    let name = field("name", RendererKind::Text).with_rules(
        ValidationRules::default()
            .required("Name is required")
            .min_length(3, "Too short"),
    );

    assert_eq!(
        validate_field(&name, Some(&json!("  ")), &FormValues::new()),
        Some("Name is required".to_owned())
    );
    assert_eq!(
        validate_field(&name, Some(&json!("ab")), &FormValues::new()),
        Some("Too short".to_owned())
    );
    assert_eq!(validate_field(&name, Some(&json!("abc")), &FormValues::new()), None);
}

#[test]
fn empty_optional_field_skips_every_rule() {
    let url = field("url", RendererKind::Text).with_rules(
        ValidationRules::default()
            .pattern("^https?://.+", "Must be a URL")
            .unwrap_or_else(|_| unreachable!()),
    );

    assert_eq!(validate_field(&url, None, &FormValues::new()), None);
    assert_eq!(
        validate_field(&url, Some(&json!("ftp://host")), &FormValues::new()),
        Some("Must be a URL".to_owned())
    );
}

#[test]
fn numeric_bounds_and_array_length_use_their_messages() {
    let schema = service_form();
    let timeout = schema.field("timeoutMs").unwrap_or_else(|| unreachable!());
    assert_eq!(
        validate_field(timeout, Some(&json!(500)), &FormValues::new()),
        Some("Minimum timeout is 1000ms".to_owned())
    );
    assert_eq!(
        validate_field(timeout, Some(&json!(90_000)), &FormValues::new()),
        Some("Maximum timeout is 60000ms".to_owned())
    );

    let tags = field("tags", RendererKind::Multiselect)
        .with_rules(ValidationRules::default().min_length(2, "Pick two"));
    assert_eq!(
        validate_field(&tags, Some(&json!(["a"])), &FormValues::new()),
        Some("Pick two".to_owned())
    );
}

#[test]
fn custom_validator_sees_all_values_and_defaults_to_invalid() {
    let confirm = field("confirm", RendererKind::Password).with_rules(
        ValidationRules::default().validate(|value, all| {
            CustomValidation::from(all.get("password") == Some(value))
        }),
    );
    let all = values(&[("password", json!("secret"))]);

    assert_eq!(validate_field(&confirm, Some(&json!("secret")), &all), None);
    assert_eq!(
        validate_field(&confirm, Some(&json!("other")), &all),
        Some("Invalid".to_owned())
    );
}

#[test]
fn hidden_fields_are_not_validated() {
    let schema = conditional_schema();

    let errors = validate_form(&schema, &values(&[("kind", json!("standard"))]));
    assert!(errors.is_empty());

    let errors = validate_form(&schema, &values(&[("kind", json!("other"))]));
    assert_eq!(errors.get("detail").map(String::as_str), Some("Detail is required"));
}

#[test]
fn membership_operators_follow_list_rules() {
    let in_list = field("a", RendererKind::Text).visible_when(condition(
        "b",
        VisibilityOperator::In,
        json!(["x", "y"]),
    ));
    let in_scalar = field("a", RendererKind::Text).visible_when(condition(
        "b",
        VisibilityOperator::In,
        json!("x"),
    ));
    let not_in_scalar = field("a", RendererKind::Text).visible_when(condition(
        "b",
        VisibilityOperator::NotIn,
        json!("x"),
    ));

    let current = values(&[("b", json!("y"))]);
    assert!(is_visible(&in_list, &current));
    assert!(!is_visible(&in_scalar, &current));
    assert!(is_visible(&not_in_scalar, &current));
}

#[test]
fn errors_are_displayed_only_after_blur() {
    let mut session = FormSession::new(service_form(), FormSessionInput::default());

    assert!(session.errors().contains_key("name"));
    assert_eq!(session.visible_error("name"), None);

    session.blur("name");
    assert_eq!(session.visible_error("name"), Some("Service name is required"));

    session.change("name", json!("Gateway"));
    assert_eq!(session.visible_error("name"), None);
}

#[test]
fn initial_values_override_schema_defaults() {
    let session = FormSession::new(
        service_form(),
        FormSessionInput::with_values(values(&[("timeoutMs", json!(2000))])),
    );

    assert_eq!(session.value("timeoutMs"), Some(&json!(2000)));
    assert_eq!(session.value("checkIntervalSeconds"), Some(&json!(300)));
    assert_eq!(session.value("active"), Some(&json!(true)));
}

#[test]
fn change_listener_receives_settled_state() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let input = FormSessionInput::default().on_change(move |values, errors| {
        if let Ok(mut seen) = recorder.lock() {
            seen.push((values.get("name").cloned(), errors.contains_key("name")));
        }
    });

    let mut session = FormSession::new(service_form(), input);
    session.change("name", json!("API"));

    let seen = seen.lock().unwrap_or_else(|_| unreachable!());
    assert_eq!(
        seen.as_slice(),
        &[(None, true), (Some(json!("API")), false)]
    );
}

#[test]
fn begin_submit_touches_fields_and_blocks_invalid_forms() {
    let mut session = FormSession::new(service_form(), FormSessionInput::default());

    assert_eq!(session.begin_submit(), SubmitAttempt::Invalid);
    assert!(session.is_touched("url"));
    assert!(!session.is_submitting());
    assert_eq!(session.visible_error("url"), Some("URL is required"));
}

#[test]
fn blank_submission_errors_get_a_generic_message() {
    let mut session = FormSession::new(
        service_form(),
        FormSessionInput::with_values(values(&[
            ("name", json!("API")),
            ("url", json!("https://api.example.com")),
        ])),
    );

    assert!(matches!(session.begin_submit(), SubmitAttempt::Ready(_)));
    assert_eq!(session.begin_submit(), SubmitAttempt::Ignored);

    session.finish_submit(Err(AppError::Submission(String::new())));
    assert_eq!(
        session.submit_error(),
        Some("An error occurred during submission")
    );
    assert!(!session.is_submitting());
}

#[test]
fn render_skips_hidden_fields_and_shows_header() {
    let session = FormSession::new(conditional_schema(), FormSessionInput::default());
    let html = session.render(&RendererRegistry::standard(), false);

    assert!(html.contains(r#"<h2 class="form-title">Conditional</h2>"#));
    assert!(html.contains(r#"for="kind""#));
    assert!(!html.contains(r#"for="detail""#));
    assert!(!html.contains("form-footer"));
}

#[test]
fn render_footer_is_disabled_while_invalid() {
    let session = FormSession::new(service_form(), FormSessionInput::default());
    let html = session.render(&RendererRegistry::standard(), true);

    assert!(html.contains(r#"<button type="submit" class="submit-button" disabled>Submit</button>"#));
    assert!(html.contains(r#"<span class="required">*</span>"#));
}

#[test]
fn collapsed_sections_hide_their_children() {
    let fields = vec![field("notes", RendererKind::Textarea)];
    let layout = vec![LayoutNode::Section {
        title: Some("Extra".to_owned()),
        description: None,
        with_divider: true,
        collapsible: true,
        children: vec![LayoutNode::field("notes")],
    }];
    let schema = Arc::new(
        FormSchema::new("sections", FormMeta::default(), fields, layout)
            .unwrap_or_else(|_| unreachable!()),
    );
    let mut session = FormSession::new(schema, FormSessionInput::default());
    let registry = RendererRegistry::standard();

    assert!(session.render(&registry, false).contains(r#"for="notes""#));

    session.toggle_section("0");
    let html = session.render(&registry, false);
    assert!(!html.contains(r#"for="notes""#));
    assert!(html.contains("▶"));
}

#[test]
fn theme_variables_derive_hover_and_light_shades() {
    let variables = theme_variables(&ThemeColors::new(
        Some("#ff6b35".to_owned()),
        Some("not-a-colour".to_owned()),
    ));

    assert!(variables.contains(&("--form-primary-hover", "#eb5721".to_owned())));
    assert!(variables.contains(&("--form-primary-light", "rgba(255, 107, 53, 0.1)".to_owned())));
    assert!(variables.contains(&("--form-text-secondary", "not-a-colour".to_owned())));
    assert!(!variables.iter().any(|(name, _)| *name == "--form-bg-secondary"));
}

#[tokio::test(start_paused = true)]
async fn hidden_values_are_pruned_after_the_debounce() {
    let controller = FormController::new(
        conditional_schema(),
        FormSessionInput::default(),
        None,
        FormOptions::default(),
    );

    controller.change("kind", json!("other")).await;
    controller.change("detail", json!("custom")).await;
    controller.change("kind", json!("standard")).await;

    assert_eq!(controller.values().await.get("detail"), Some(&json!("custom")));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(controller.values().await.get("detail"), None);
    assert_eq!(controller.values().await.get("kind"), Some(&json!("standard")));
}

#[tokio::test(start_paused = true)]
async fn value_changes_restart_the_prune_debounce() {
    let controller = FormController::new(
        conditional_schema(),
        FormSessionInput::with_values(values(&[
            ("kind", json!("other")),
            ("detail", json!("kept")),
        ])),
        None,
        FormOptions::default(),
    );

    controller.change("kind", json!("standard")).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    controller.change("kind", json!("other")).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(controller.values().await.get("detail"), Some(&json!("kept")));
}

#[tokio::test(start_paused = true)]
async fn concurrent_submits_call_the_handler_once() {
    let handler = Arc::new(SlowSubmitHandler::succeeding());
    let controller = FormController::new(
        service_form(),
        FormSessionInput::with_values(values(&[
            ("name", json!("API")),
            ("url", json!("https://api.example.com")),
        ])),
        Some(handler.clone()),
        FormOptions::default(),
    );

    let (first, second) = tokio::join!(controller.submit(), controller.submit());
    let outcomes = [first, second];

    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    assert!(outcomes.contains(&SubmitOutcome::Submitted));
    assert!(outcomes.contains(&SubmitOutcome::Ignored));
    assert!(!controller.is_submitting().await);
}

#[tokio::test(start_paused = true)]
async fn handler_failures_surface_as_submit_error() {
    let handler = Arc::new(SlowSubmitHandler::failing("Service name already exists"));
    let controller = FormController::new(
        service_form(),
        FormSessionInput::with_values(values(&[
            ("name", json!("API")),
            ("url", json!("https://api.example.com")),
        ])),
        Some(handler),
        FormOptions::default(),
    );

    let outcome = controller.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed("Service name already exists".to_owned())
    );
    let html = controller.render(&RendererRegistry::standard()).await;
    assert!(html.contains("Service name already exists"));
    assert!(html.contains(">Submit</button>"));
}

struct PanickingSubmitHandler;

#[async_trait]
impl FormSubmitHandler for PanickingSubmitHandler {
    async fn submit(&self, _values: FormValues) -> AppResult<()> {
        panic!("handler bug");
    }
}

fn valid_service_input() -> FormSessionInput {
    FormSessionInput::with_values(values(&[
        ("name", json!("API")),
        ("url", json!("https://api.example.com")),
    ]))
}

#[test]
fn blurring_an_empty_number_field_sets_zero() {
    let fields = vec![
        field("timeout", RendererKind::Number),
        field("label", RendererKind::Text),
    ];
    let layout = vec![LayoutNode::field("timeout"), LayoutNode::field("label")];
    let schema = FormSchema::new("numbers", FormMeta::titled("Numbers"), fields, layout)
        .unwrap_or_else(|_| unreachable!());
    let mut session = FormSession::new(Arc::new(schema), FormSessionInput::default());

    session.apply("timeout", number_input(""));
    assert_eq!(session.value("timeout"), None);
    assert!(session.blur("timeout"));
    assert_eq!(session.value("timeout"), Some(&json!(0)));
    assert!(session.is_touched("timeout"));

    assert!(!session.blur("label"));
    assert_eq!(session.value("label"), None);

    session.change("timeout", json!(42));
    assert!(!session.blur("timeout"));
    assert_eq!(session.value("timeout"), Some(&json!(42)));
}

#[tokio::test(start_paused = true)]
async fn abandoned_submit_still_releases_the_guard() {
    let handler = Arc::new(SlowSubmitHandler::succeeding());
    let controller = FormController::new(
        service_form(),
        valid_service_input(),
        Some(handler.clone()),
        FormOptions::default(),
    );

    let abandoned = tokio::time::timeout(Duration::from_millis(10), controller.submit()).await;
    assert!(abandoned.is_err());
    assert!(controller.is_submitting().await);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!controller.is_submitting().await);

    assert_eq!(controller.submit().await, SubmitOutcome::Submitted);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn panicking_handler_fails_the_submission_and_allows_retry() {
    let controller = FormController::new(
        service_form(),
        valid_service_input(),
        Some(Arc::new(PanickingSubmitHandler)),
        FormOptions::default(),
    );

    let outcome = controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Failed(message) if message.contains("stopped unexpectedly")));
    assert!(!controller.is_submitting().await);
    assert!(matches!(controller.submit().await, SubmitOutcome::Failed(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn change_listener_can_read_through_the_controller() {
    let slot: Arc<OnceLock<Weak<FormController>>> = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (listener_slot, recorder) = (Arc::clone(&slot), Arc::clone(&seen));
    let input = FormSessionInput::default().on_change(move |_values, _errors| {
        let Some(controller) = listener_slot.get().and_then(Weak::upgrade) else {
            return;
        };
        let read_back = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(controller.values())
        });
        if let Ok(mut seen) = recorder.lock() {
            seen.push(read_back.get("kind").cloned());
        }
    });
    let controller = Arc::new(FormController::new(
        conditional_schema(),
        input,
        None,
        FormOptions::default(),
    ));
    let _ = slot.set(Arc::downgrade(&controller));

    let changing = Arc::clone(&controller);
    let change = tokio::spawn(async move { changing.change("kind", json!("other")).await });
    let finished = tokio::time::timeout(Duration::from_secs(2), change).await;

    assert!(matches!(finished, Ok(Ok(()))));
    let seen = seen.lock().unwrap_or_else(|_| unreachable!());
    assert_eq!(seen.as_slice(), &[Some(json!("other"))]);
}

#[tokio::test(start_paused = true)]
async fn invalid_forms_never_reach_the_handler() {
    let handler = Arc::new(SlowSubmitHandler::succeeding());
    let controller = FormController::new(
        service_form(),
        FormSessionInput::default(),
        Some(handler.clone()),
        FormOptions::default(),
    );

    let outcome = controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Invalid(errors) if errors.contains_key("url")));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

proptest! {
    #[test]
    fn required_fails_exactly_for_blank_text(text in ".{0,12}") {
        let name = field("name", RendererKind::Text)
            .with_rules(ValidationRules::default().required("Required"));

        let error = validate_field(&name, Some(&Value::String(text.clone())), &FormValues::new());

        prop_assert_eq!(error.is_some(), text.trim().is_empty());
    }

    #[test]
    fn fields_without_conditions_are_always_visible(current in any::<Option<i64>>()) {
        let plain = field("plain", RendererKind::Text);
        let all = current
            .map(|number| values(&[("other", json!(number))]))
            .unwrap_or_default();

        prop_assert!(is_visible(&plain, &all));
    }

    #[test]
    fn conditions_combine_with_and(left in any::<bool>(), right in any::<bool>()) {
        let both = field("both", RendererKind::Text)
            .visible_when(condition("left", VisibilityOperator::Equals, json!(true)))
            .visible_when(condition("right", VisibilityOperator::Equals, json!(true)));
        let all = values(&[("left", json!(left)), ("right", json!(right))]);

        prop_assert_eq!(is_visible(&both, &all), left && right);
    }

    #[test]
    fn validation_is_deterministic(name in "[a-z ]{0,6}", interval in 0_i64..5000) {
        let schema = service_form();
        let all = values(&[("name", json!(name)), ("checkIntervalSeconds", json!(interval))]);

        prop_assert_eq!(validate_form(&schema, &all), validate_form(&schema, &all));
    }
}
