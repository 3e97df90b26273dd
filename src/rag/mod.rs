//! Knowledge index and hybrid retrieval.
//!
//! - `KnowledgeIndex`: owns the store and embedder; rebuild / append / search
//! - `HybridRetriever`: keyword scoring over metadata, semantic fallback,
//!   redaction and compression into a single context string

pub mod embedding;
pub mod filter;
pub mod index;
pub mod query;
pub mod retriever;
pub mod scoring;
pub mod sqlite;
pub mod store;

pub use embedding::{build_embedder, Embedder, HashingEmbedder, HttpEmbedder};
pub use index::KnowledgeIndex;
pub use retriever::HybridRetriever;
pub use scoring::RetrievalConfig;
pub use sqlite::SqliteIndexStore;
pub use store::{IndexStore, ScoredDocument, StoredDocument};
