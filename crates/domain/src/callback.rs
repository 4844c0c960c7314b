use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Host-supplied function attached to a schema.
///
/// Schemas are shared between sessions, so callbacks are reference counted and
/// must be thread-safe.
pub struct Callback<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Callback<F> {
    /// Wraps an already shared function.
    #[must_use]
    pub fn new(function: Arc<F>) -> Self {
        Self(function)
    }

    /// Returns the wrapped function.
    #[must_use]
    pub fn get(&self) -> &F {
        self.0.as_ref()
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> Debug for Callback<F> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("Callback(..)")
    }
}
