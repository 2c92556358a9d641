use async_trait::async_trait;

use crate::{Completion, GenerationRequest, ModelProvider, Result};

/// Uniform call interface over any inference backend.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Returns the unique identifier for this backend.
    fn name(&self) -> &'static str;

    /// Execution tier this backend belongs to.
    fn provider(&self) -> ModelProvider;

    /// Runs a single generation call.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, times out, or answers
    /// with an error status or an unparseable payload.
    async fn generate(&self, request: &GenerationRequest) -> Result<Completion>;

    /// Lists the model identifiers the backend currently serves.
    ///
    /// # Errors
    ///
    /// Returns an error if the model listing cannot be fetched.
    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
