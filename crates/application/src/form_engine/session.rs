use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use januscope_core::{AppError, AppResult, SessionId};
use januscope_domain::{Callback, FormErrors, FormSchema, FormValues, RendererKind, ThemeColors};
use serde_json::Value;
use tracing::{debug, warn};

use super::validation::validate_visible;
use super::visibility::{VisibilityMap, visibility_map};
use super::{FormChangeFn, FormSessionInput};
use crate::renderer_registry::{FieldUiState, FieldUpdate, SelectKey, SelectState, number_blur};

/// Result of starting a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAttempt {
    /// A submission is already in flight.
    Ignored,
    /// Validation failed; nothing is submitted.
    Invalid,
    /// The values to hand to the submit handler.
    Ready(FormValues),
}

/// Mutable runtime state of one form.
///
/// Every value change settles synchronously: visibility is recomputed once
/// per field, then the error map, then the change listener fires.
#[derive(Debug)]
pub struct FormSession {
    id: SessionId,
    schema: Arc<FormSchema>,
    values: FormValues,
    errors: FormErrors,
    touched: BTreeSet<String>,
    visibility: VisibilityMap,
    submitting: bool,
    submit_error: Option<String>,
    collapsed_sections: HashSet<String>,
    ui: HashMap<String, FieldUiState>,
    theme: ThemeColors,
    on_change: Option<Callback<FormChangeFn>>,
}

impl FormSession {
    /// Starts a session from schema defaults merged with the host's initial values.
    #[must_use]
    pub fn new(schema: Arc<FormSchema>, input: FormSessionInput) -> Self {
        let id = SessionId::new();
        for issue in schema.authoring_issues() {
            warn!(session_id = %id, schema_id = %schema.id(), %issue, "form schema authoring issue");
        }

        let mut values = schema.default_values();
        values.extend(input.initial_values);

        let mut session = Self {
            id,
            schema,
            values,
            errors: FormErrors::new(),
            touched: BTreeSet::new(),
            visibility: VisibilityMap::new(),
            submitting: false,
            submit_error: None,
            collapsed_sections: HashSet::new(),
            ui: HashMap::new(),
            theme: input.theme,
            on_change: input.on_change,
        };
        session.settle();
        session
    }

    /// Returns session id.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the schema this session instantiates.
    #[must_use]
    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    /// Returns current values.
    #[must_use]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Returns one current value.
    #[must_use]
    pub fn value(&self, field_id: &str) -> Option<&Value> {
        self.values.get(field_id)
    }

    /// Returns every current error, shown or not.
    #[must_use]
    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Returns the error to display, which requires the field to be touched.
    #[must_use]
    pub fn visible_error(&self, field_id: &str) -> Option<&str> {
        if !self.touched.contains(field_id) {
            return None;
        }
        self.errors.get(field_id).map(String::as_str)
    }

    /// Returns whether the error map is empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns touched field ids.
    #[must_use]
    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    /// Returns whether a field lost focus at least once.
    #[must_use]
    pub fn is_touched(&self, field_id: &str) -> bool {
        self.touched.contains(field_id)
    }

    /// Returns memoized visibility of a field. Unknown ids are not visible.
    #[must_use]
    pub fn is_visible(&self, field_id: &str) -> bool {
        self.visibility.get(field_id).copied().unwrap_or(false)
    }

    /// Returns whether a submission is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Returns the last submission failure.
    #[must_use]
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Returns resolved colours: host overrides over schema colours.
    #[must_use]
    pub fn theme(&self) -> ThemeColors {
        self.theme.over(&self.schema.meta().theme)
    }

    /// Stores a new value for a field.
    pub fn change(&mut self, field_id: &str, value: Value) {
        self.values.insert(field_id.to_owned(), value);
        self.settle();
    }

    /// Removes a field's value so it reads as "no value".
    pub fn clear(&mut self, field_id: &str) {
        if self.values.remove(field_id).is_some() {
            self.settle();
        }
    }

    /// Applies the outcome of a control event. Returns whether values changed.
    pub fn apply(&mut self, field_id: &str, update: FieldUpdate) -> bool {
        match update {
            FieldUpdate::Set(value) => {
                self.change(field_id, value);
                true
            }
            FieldUpdate::Clear => {
                let present = self.values.contains_key(field_id);
                self.clear(field_id);
                present
            }
            FieldUpdate::Unchanged => false,
        }
    }

    /// Marks a field as touched. A number field left empty becomes `0`.
    ///
    /// Returns whether values changed.
    pub fn blur(&mut self, field_id: &str) -> bool {
        self.touched.insert(field_id.to_owned());

        let is_number = self
            .schema
            .field(field_id)
            .is_some_and(|field| *field.renderer() == RendererKind::Number);
        if !is_number {
            return false;
        }
        let update = number_blur(self.value(field_id));
        self.apply(field_id, update)
    }

    /// Returns whether a hidden field still holds a value.
    #[must_use]
    pub fn has_hidden_values(&self) -> bool {
        self.hidden_value_ids().next().is_some()
    }

    fn hidden_value_ids(&self) -> impl Iterator<Item = &str> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.id().as_str())
            .filter(|field_id| !self.is_visible(field_id) && self.values.contains_key(*field_id))
    }

    /// Drops values of fields that are currently hidden and returns their ids.
    pub fn prune_hidden(&mut self) -> Vec<String> {
        let pruned: Vec<String> = self.hidden_value_ids().map(str::to_owned).collect();
        if pruned.is_empty() {
            return pruned;
        }

        for field_id in &pruned {
            self.values.remove(field_id);
        }
        debug!(session_id = %self.id, fields = ?pruned, "pruned hidden field values");
        self.settle();
        pruned
    }

    /// Starts a submission: touches every field and validates.
    pub fn begin_submit(&mut self) -> SubmitAttempt {
        if self.submitting {
            return SubmitAttempt::Ignored;
        }

        self.submitting = true;
        self.touched.extend(
            self.schema
                .fields()
                .iter()
                .map(|field| field.id().as_str().to_owned()),
        );
        self.visibility = visibility_map(&self.schema, &self.values);
        self.errors = validate_visible(&self.schema, &self.values, &self.visibility);

        if !self.errors.is_empty() {
            self.submitting = false;
            return SubmitAttempt::Invalid;
        }

        self.submit_error = None;
        SubmitAttempt::Ready(self.values.clone())
    }

    /// Completes a submission with the handler's result.
    pub fn finish_submit(&mut self, result: AppResult<()>) {
        if let Err(error) = result {
            warn!(session_id = %self.id, error = %error, "form submission failed");
            self.submit_error = Some(submit_error_message(&error));
        }
        self.submitting = false;
    }

    /// Returns whether a collapsible section is collapsed.
    #[must_use]
    pub fn is_section_collapsed(&self, path: &str) -> bool {
        self.collapsed_sections.contains(path)
    }

    /// Collapses or expands the section at a layout path such as `0.2`.
    pub fn toggle_section(&mut self, path: &str) {
        if !self.collapsed_sections.remove(path) {
            self.collapsed_sections.insert(path.to_owned());
        }
    }

    /// Returns control state of a field.
    #[must_use]
    pub fn ui_state(&self, field_id: &str) -> FieldUiState {
        self.ui.get(field_id).copied().unwrap_or_default()
    }

    /// Shows or hides the text of a password field.
    pub fn toggle_password_reveal(&mut self, field_id: &str) {
        let state = self.ui.entry(field_id.to_owned()).or_default();
        state.password_revealed = !state.password_revealed;
    }

    /// Returns select list state of a field.
    #[must_use]
    pub fn select_state(&self, field_id: &str) -> SelectState {
        self.ui_state(field_id).select
    }

    /// Handles a key pressed on a select trigger.
    pub fn select_key(&mut self, field_id: &str, key: SelectKey) {
        let option_count = self.option_count(field_id);
        self.ui
            .entry(field_id.to_owned())
            .or_default()
            .select
            .handle_key(key, option_count);
    }

    /// Opens or closes a select list.
    pub fn select_toggle(&mut self, field_id: &str) {
        let option_count = self.option_count(field_id);
        self.ui
            .entry(field_id.to_owned())
            .or_default()
            .select
            .toggle(option_count);
    }

    /// Closes a select list after a click outside it.
    pub fn select_click_outside(&mut self, field_id: &str) {
        if let Some(state) = self.ui.get_mut(field_id) {
            state.select.click_outside();
        }
    }

    /// Chooses a select option, closes the list and marks the field touched.
    pub fn select_choose(&mut self, field_id: &str, index: usize) -> AppResult<()> {
        let schema = Arc::clone(&self.schema);
        let field = schema
            .field(field_id)
            .ok_or_else(|| AppError::NotFound(format!("field '{field_id}' does not exist")))?;

        let update = self
            .ui
            .entry(field_id.to_owned())
            .or_default()
            .select
            .choose(&field.props().options, index);
        if update == FieldUpdate::Unchanged {
            return Err(AppError::Validation(format!(
                "field '{field_id}' has no option at index {index}"
            )));
        }

        self.apply(field_id, update);
        self.touched.insert(field_id.to_owned());
        Ok(())
    }

    fn option_count(&self, field_id: &str) -> usize {
        self.schema
            .field(field_id)
            .map_or(0, |field| field.props().options.len())
    }

    fn settle(&mut self) {
        self.visibility = visibility_map(&self.schema, &self.values);
        self.errors = validate_visible(&self.schema, &self.values, &self.visibility);

        if let Some(listener) = self.on_change.as_ref() {
            listener.get()(&self.values, &self.errors);
        }
    }
}

fn submit_error_message(error: &AppError) -> String {
    match error {
        AppError::Submission(message) if !message.trim().is_empty() => message.clone(),
        AppError::Submission(_) => "An error occurred during submission".to_owned(),
        other => other.to_string(),
    }
}
