//! IndexStore trait: persistence plus vector search for indexed documents.

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::document::Document;

/// A persisted document and its stable identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub doc_id: String,
    pub document: Document,
}

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub stored: StoredDocument,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Storage backend for the knowledge index.
///
/// Both write operations are all-or-nothing: a concurrent reader sees either
/// the state before the call or the state after it.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Replace the whole index with `items` and record the embedding model
    /// used to produce them.
    async fn replace_all(
        &self,
        items: Vec<(Document, Vec<f32>)>,
        embedding_model: &str,
    ) -> Result<usize, ApiError>;

    /// Add documents without disturbing existing entries.
    async fn append(&self, items: Vec<(Document, Vec<f32>)>) -> Result<usize, ApiError>;

    /// Every stored document in insertion order.
    async fn scan_all(&self) -> Result<Vec<StoredDocument>, ApiError>;

    /// Up to `limit` documents closest to `query_embedding`, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    /// Embedding model recorded by the last `replace_all`.
    async fn embedding_model(&self) -> Result<Option<String>, ApiError>;
}
