use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use januscope_core::AppResult;
use januscope_domain::{FieldDefinition, RendererKind};
use serde_json::Value;
use tracing::error;

mod controls;
mod markup;
mod renderers;

pub use controls::{
    FieldUpdate, FileHandle, SELECT_PLACEHOLDER, SelectKey, SelectState, checked_change,
    date_input_value, file_selection, is_member, local_date_input_value, number_blur,
    number_input, selected_label, toggle_member,
};
pub use markup::escape_html;
pub use renderers::{
    CheckboxRenderer, DateRenderer, FileRenderer, MultiselectRenderer, NumberRenderer,
    PasswordRenderer, RadioRenderer, SelectRenderer, SwitchRenderer, TextRenderer,
    TextareaRenderer,
};

/// Transient per-field control state owned by the form session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldUiState {
    /// Whether a password control shows its text.
    pub password_revealed: bool,
    /// Select list state.
    pub select: SelectState,
}

/// Everything a renderer needs to draw one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRenderContext<'a> {
    /// Field definition.
    pub field: &'a FieldDefinition,
    /// Current value. `None` means no value.
    pub value: Option<&'a Value>,
    /// Error to display. Only set once the field was touched.
    pub error: Option<&'a str>,
    /// Control state.
    pub ui: FieldUiState,
}

/// Concrete input control for one renderer kind.
pub trait FieldRenderer: Send + Sync {
    /// Produces the control markup.
    fn render(&self, context: &FieldRenderContext<'_>) -> AppResult<String>;
}

/// Dispatch table from renderer kind to control implementation.
#[derive(Clone)]
pub struct RendererRegistry {
    renderers: HashMap<RendererKind, Arc<dyn FieldRenderer>>,
}

impl RendererRegistry {
    /// Creates a registry with no renderers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Creates a registry holding the standard control for every kind.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(RendererKind::Text, Arc::new(TextRenderer));
        registry.register(RendererKind::Password, Arc::new(PasswordRenderer));
        registry.register(RendererKind::Textarea, Arc::new(TextareaRenderer));
        registry.register(RendererKind::Select, Arc::new(SelectRenderer));
        registry.register(RendererKind::Multiselect, Arc::new(MultiselectRenderer));
        registry.register(RendererKind::Radio, Arc::new(RadioRenderer));
        registry.register(RendererKind::Checkbox, Arc::new(CheckboxRenderer));
        registry.register(RendererKind::Switch, Arc::new(SwitchRenderer));
        registry.register(RendererKind::Number, Arc::new(NumberRenderer));
        registry.register(RendererKind::Date, Arc::new(DateRenderer));
        registry.register(RendererKind::File, Arc::new(FileRenderer));
        registry
    }

    /// Installs a renderer for a kind, returning the one it replaced.
    pub fn register(
        &mut self,
        kind: RendererKind,
        renderer: Arc<dyn FieldRenderer>,
    ) -> Option<Arc<dyn FieldRenderer>> {
        self.renderers.insert(kind, renderer)
    }

    /// Returns the renderer for a kind.
    #[must_use]
    pub fn get(&self, kind: &RendererKind) -> Option<&Arc<dyn FieldRenderer>> {
        self.renderers.get(kind)
    }

    /// Renders one field inside its own failure boundary.
    ///
    /// Unknown kinds produce a visible marker. A renderer error or panic
    /// degrades to a placeholder for this field only.
    #[must_use]
    pub fn render_field(&self, context: &FieldRenderContext<'_>) -> String {
        let field_id = context.field.id().as_str();
        let kind = context.field.renderer();

        let Some(renderer) = self.renderers.get(kind) else {
            error!(field_id, renderer = kind.as_str(), "unknown renderer");
            return markup::unknown_renderer(kind.as_str());
        };

        match panic::catch_unwind(AssertUnwindSafe(|| renderer.render(context))) {
            Ok(Ok(html)) => html,
            Ok(Err(render_error)) => {
                error!(field_id, renderer = kind.as_str(), error = %render_error, "field renderer failed");
                markup::render_failure(&render_error.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(field_id, renderer = kind.as_str(), error = %message, "field renderer panicked");
                markup::render_failure(&message)
            }
        }
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "renderer panicked".to_owned()
}

#[cfg(test)]
mod tests;
