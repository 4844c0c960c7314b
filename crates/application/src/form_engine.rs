use std::sync::Arc;
use std::time::Duration;

use januscope_domain::{Callback, FormErrors, FormValues, ThemeColors};

mod controller;
mod render;
mod session;
mod validation;
mod visibility;

pub use controller::{FormController, SubmitOutcome};
pub use render::theme_variables;
pub use session::{FormSession, SubmitAttempt};
pub use validation::{validate_field, validate_form};
pub use visibility::{VisibilityMap, is_visible, visibility_map};

/// Host callback fired after every settled value change with `(values, errors)`.
pub type FormChangeFn = dyn Fn(&FormValues, &FormErrors) + Send + Sync;

/// Form engine timing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormOptions {
    /// Delay before values of hidden fields are dropped.
    pub prune_debounce: Duration,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            prune_debounce: Duration::from_millis(100),
        }
    }
}

/// Host inputs for a new form session.
#[derive(Debug, Clone, Default)]
pub struct FormSessionInput {
    /// Values overriding schema defaults.
    pub initial_values: FormValues,
    /// Host colour overrides, taking precedence over schema colours.
    pub theme: ThemeColors,
    /// Change listener.
    pub on_change: Option<Callback<FormChangeFn>>,
}

impl FormSessionInput {
    /// Starts from the given initial values.
    #[must_use]
    pub fn with_values(initial_values: FormValues) -> Self {
        Self {
            initial_values,
            ..Self::default()
        }
    }

    /// Sets host colour overrides.
    #[must_use]
    pub fn theme(mut self, theme: ThemeColors) -> Self {
        self.theme = theme;
        self
    }

    /// Sets the change listener.
    #[must_use]
    pub fn on_change<F>(mut self, listener: F) -> Self
    where
        F: Fn(&FormValues, &FormErrors) + Send + Sync + 'static,
    {
        let listener: Arc<FormChangeFn> = Arc::new(listener);
        self.on_change = Some(Callback::new(listener));
        self
    }
}

#[cfg(test)]
mod tests;
