//! SQLite-backed index store.
//!
//! Documents, metadata and embeddings live in one table; search is a
//! brute-force cosine scan over every stored vector.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::store::{IndexStore, ScoredDocument, StoredDocument};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;
use crate::document::{Document, Metadata};

pub struct SqliteIndexStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteIndexStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_seq ON documents(seq)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    /// Content-derived id, so rebuilding from the same sources reproduces
    /// the same ids. The sequence number keeps duplicates distinct.
    fn doc_id(document: &Document, seq: i64) -> String {
        let fingerprint = document.fingerprint();
        format!("{}-{}", &fingerprint[..16], seq)
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> StoredDocument {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Metadata>(&metadata_str).unwrap_or_default();

        StoredDocument {
            doc_id: row.get("doc_id"),
            document: Document {
                content: row.get("content"),
                metadata,
            },
        }
    }

    async fn insert_rows(
        tx: &mut Transaction<'_, Sqlite>,
        items: &[(Document, Vec<f32>)],
        first_seq: i64,
    ) -> Result<(), ApiError> {
        for (offset, (document, embedding)) in items.iter().enumerate() {
            let seq = first_seq + offset as i64;
            let metadata_str = serde_json::to_string(&document.metadata).map_err(ApiError::internal)?;

            sqlx::query(
                "INSERT INTO documents (doc_id, seq, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(Self::doc_id(document, seq))
            .bind(seq)
            .bind(&document.content)
            .bind(&metadata_str)
            .bind(Self::serialize_embedding(embedding))
            .execute(&mut **tx)
            .await
            .map_err(ApiError::internal)?;
        }
        Ok(())
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    async fn replace_all(
        &self,
        items: Vec<(Document, Vec<f32>)>,
        embedding_model: &str,
    ) -> Result<usize, ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM documents")
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        Self::insert_rows(&mut tx, &items, 0).await?;

        sqlx::query(
            "INSERT OR REPLACE INTO index_meta (key, value, updated_at)
             VALUES ('embedding_model', ?1, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(embedding_model)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(items.len())
    }

    async fn append(&self, items: Vec<(Document, Vec<f32>)>) -> Result<usize, ApiError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        let next_seq: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(seq), -1) + 1 FROM documents")
            .fetch_one(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        Self::insert_rows(&mut tx, &items, next_seq).await?;

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(items.len())
    }

    async fn scan_all(&self) -> Result<Vec<StoredDocument>, ApiError> {
        let rows = sqlx::query("SELECT doc_id, content, metadata FROM documents ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(rows.iter().map(Self::row_to_document).collect())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, ApiError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT doc_id, content, metadata, embedding FROM documents ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut scored: Vec<ScoredDocument> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(ScoredDocument {
                    stored: Self::row_to_document(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn embedding_model(&self) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar("SELECT value FROM index_meta WHERE key = 'embedding_model'")
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }
}
