use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::GenerationRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// provider name (e.g. "gemini", "openai")
    fn name(&self) -> &str;

    /// configured model identifier
    fn model(&self) -> &str;

    /// full completion (non-streaming)
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError>;

    /// incremental completion; the producer stops once the receiver is dropped
    async fn stream_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError>;
}
