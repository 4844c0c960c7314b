use std::sync::{Arc, Weak};

use januscope_core::{AppError, AppResult, SessionId};
use januscope_domain::{Callback, FormErrors, FormSchema, FormValues};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::session::{FormSession, SubmitAttempt};
use super::{FormChangeFn, FormOptions, FormSessionInput};
use crate::form_ports::FormSubmitHandler;
use crate::renderer_registry::{FieldUpdate, RendererRegistry, SelectKey};

/// Outcome of [`FormController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was in flight; nothing happened.
    Ignored,
    /// Validation failed; the handler was not called.
    Invalid(FormErrors),
    /// The handler accepted the values.
    Submitted,
    /// The handler failed; the message is now the form's submit error.
    Failed(String),
}

/// Async host handle around a [`FormSession`].
///
/// Owns the debounced hidden-field prune task and serializes submissions.
/// Dropping the controller cancels a pending prune. The change listener runs
/// after the session lock is released, so it may call back into the controller.
pub struct FormController {
    state: Arc<Mutex<FormSession>>,
    submit_handler: Option<Arc<dyn FormSubmitHandler>>,
    on_change: Option<Callback<FormChangeFn>>,
    options: FormOptions,
    prune_task: Mutex<Option<JoinHandle<()>>>,
}

impl FormController {
    /// Starts a form session. Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(
        schema: Arc<FormSchema>,
        mut input: FormSessionInput,
        submit_handler: Option<Arc<dyn FormSubmitHandler>>,
        options: FormOptions,
    ) -> Self {
        let on_change = input.on_change.take();
        let session = FormSession::new(schema, input);
        notify(on_change.as_ref(), session.values(), session.errors());

        let state = Arc::new(Mutex::new(session));
        let prune_task = spawn_prune(Arc::downgrade(&state), on_change.clone(), options);

        Self {
            state,
            submit_handler,
            on_change,
            options,
            prune_task: Mutex::new(Some(prune_task)),
        }
    }

    /// Returns session id.
    pub async fn id(&self) -> SessionId {
        self.state.lock().await.id()
    }

    /// Returns a copy of the current values.
    pub async fn values(&self) -> FormValues {
        self.state.lock().await.values().clone()
    }

    /// Returns a copy of the current errors.
    pub async fn errors(&self) -> FormErrors {
        self.state.lock().await.errors().clone()
    }

    /// Returns the last submission failure.
    pub async fn submit_error(&self) -> Option<String> {
        self.state.lock().await.submit_error().map(str::to_owned)
    }

    /// Returns whether a submission is in flight.
    pub async fn is_submitting(&self) -> bool {
        self.state.lock().await.is_submitting()
    }

    /// Reads the session under the lock.
    pub async fn inspect<R>(&self, reader: impl FnOnce(&FormSession) -> R) -> R {
        reader(&*self.state.lock().await)
    }

    /// Stores a new value and restarts the prune debounce.
    pub async fn change(&self, field_id: &str, value: Value) {
        self.settle(|session| {
            session.change(field_id, value);
            true
        })
        .await;
    }

    /// Removes a value and restarts the prune debounce.
    pub async fn clear(&self, field_id: &str) {
        self.settle(|session| {
            let present = session.value(field_id).is_some();
            session.clear(field_id);
            present
        })
        .await;
    }

    /// Applies a control event outcome.
    pub async fn apply(&self, field_id: &str, update: FieldUpdate) {
        self.settle(|session| session.apply(field_id, update)).await;
    }

    /// Marks a field as touched, coercing an empty number field to `0`.
    pub async fn blur(&self, field_id: &str) {
        self.settle(|session| session.blur(field_id)).await;
    }

    /// Handles a key pressed on a select trigger.
    pub async fn select_key(&self, field_id: &str, key: SelectKey) {
        self.state.lock().await.select_key(field_id, key);
    }

    /// Opens or closes a select list.
    pub async fn select_toggle(&self, field_id: &str) {
        self.state.lock().await.select_toggle(field_id);
    }

    /// Closes a select list after a click outside it.
    pub async fn select_click_outside(&self, field_id: &str) {
        self.state.lock().await.select_click_outside(field_id);
    }

    /// Chooses a select option.
    pub async fn select_choose(&self, field_id: &str, index: usize) -> AppResult<()> {
        let mut outcome = Ok(());
        self.settle(|session| {
            outcome = session.select_choose(field_id, index);
            outcome.is_ok()
        })
        .await;
        outcome
    }

    /// Collapses or expands a section.
    pub async fn toggle_section(&self, path: &str) {
        self.state.lock().await.toggle_section(path);
    }

    /// Shows or hides a password field's text.
    pub async fn toggle_password_reveal(&self, field_id: &str) {
        self.state.lock().await.toggle_password_reveal(field_id);
    }

    /// Renders the form with its submit footer when a handler is present.
    pub async fn render(&self, registry: &RendererRegistry) -> String {
        self.state
            .lock()
            .await
            .render(registry, self.submit_handler.is_some())
    }

    /// Validates and hands the values to the submit handler.
    ///
    /// The session lock is released while the handler runs, so a second call
    /// during that time observes the in-flight submission and is ignored. The
    /// handler runs on its own task: dropping the returned future does not
    /// cancel it, and the submitting flag is always cleared when it finishes.
    pub async fn submit(&self) -> SubmitOutcome {
        let values = {
            let mut session = self.state.lock().await;
            match session.begin_submit() {
                SubmitAttempt::Ignored => return SubmitOutcome::Ignored,
                SubmitAttempt::Invalid => return SubmitOutcome::Invalid(session.errors().clone()),
                SubmitAttempt::Ready(values) => values,
            }
        };

        let completion = tokio::spawn(complete_submit(
            Arc::clone(&self.state),
            self.submit_handler.clone(),
            values,
        ));
        match completion.await {
            Ok(None) => SubmitOutcome::Submitted,
            Ok(Some(message)) => SubmitOutcome::Failed(message),
            Err(join_error) => {
                error!(error = %join_error, "form submission task failed");
                SubmitOutcome::Failed(join_error.to_string())
            }
        }
    }

    async fn settle(&self, mutate: impl FnOnce(&mut FormSession) -> bool) {
        let snapshot = {
            let mut session = self.state.lock().await;
            mutate(&mut *session)
                .then(|| (session.values().clone(), session.errors().clone()))
        };

        if let Some((values, errors)) = snapshot {
            notify(self.on_change.as_ref(), &values, &errors);
            self.reschedule_prune().await;
        }
    }

    async fn reschedule_prune(&self) {
        let mut prune_task = self.prune_task.lock().await;
        if let Some(pending) = prune_task.take() {
            pending.abort();
        }
        *prune_task = Some(spawn_prune(
            Arc::downgrade(&self.state),
            self.on_change.clone(),
            self.options,
        ));
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        if let Some(pending) = self.prune_task.get_mut().take() {
            pending.abort();
        }
    }
}

fn spawn_prune(
    state: Weak<Mutex<FormSession>>,
    on_change: Option<Callback<FormChangeFn>>,
    options: FormOptions,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(options.prune_debounce).await;

        let Some(state) = state.upgrade() else {
            debug!("form session dropped before hidden-field pruning");
            return;
        };
        let snapshot = {
            let mut session = state.lock().await;
            let pruned = session.prune_hidden();
            (!pruned.is_empty()).then(|| (session.values().clone(), session.errors().clone()))
        };
        if let Some((values, errors)) = snapshot {
            notify(on_change.as_ref(), &values, &errors);
        }
    })
}

/// Runs the handler on a task of its own so a panicking handler still
/// settles the session. Returns the submit error, if any.
async fn complete_submit(
    state: Arc<Mutex<FormSession>>,
    handler: Option<Arc<dyn FormSubmitHandler>>,
    values: FormValues,
) -> Option<String> {
    let result = match handler {
        Some(handler) => tokio::spawn(async move { handler.submit(values).await })
            .await
            .unwrap_or_else(|join_error| {
                Err(AppError::Submission(format!(
                    "submit handler stopped unexpectedly: {join_error}"
                )))
            }),
        None => Ok(()),
    };

    let mut session = state.lock().await;
    session.finish_submit(result);
    session.submit_error().map(str::to_owned)
}

fn notify(listener: Option<&Callback<FormChangeFn>>, values: &FormValues, errors: &FormErrors) {
    if let Some(listener) = listener {
        listener.get()(values, errors);
    }
}
