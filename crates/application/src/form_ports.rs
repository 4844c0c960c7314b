use async_trait::async_trait;
use januscope_core::AppResult;
use januscope_domain::FormValues;

/// Host port receiving the values of a valid form submission.
#[async_trait]
pub trait FormSubmitHandler: Send + Sync {
    /// Handles one submission. An error becomes the form-level submit error.
    async fn submit(&self, values: FormValues) -> AppResult<()>;
}
