use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to open knowledge index: {0}")]
    Index(#[source] anyhow::Error),

    #[error("Failed to initialize embedder: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("Failed to initialize web search: {0}")]
    Search(#[source] anyhow::Error),
}
