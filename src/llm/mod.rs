pub mod gemini;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, GenerationRequest, Role, Turn};

use crate::core::config::{LlmConfig, LlmProviderKind};
use crate::core::errors::ApiError;

pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ApiError> {
    match config.provider {
        LlmProviderKind::Gemini => Ok(Arc::new(GeminiProvider::new(config)?)),
        LlmProviderKind::Openai => Ok(Arc::new(OpenAiCompatProvider::new(config)?)),
    }
}

/// Client shared by the providers. Only connecting and each individual read
/// are bounded here, so a long streamed answer is not cut off; unary calls add
/// a whole-request timeout of the same length.
pub(crate) fn http_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(ApiError::internal)
}
