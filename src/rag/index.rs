use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::embedding::Embedder;
use super::store::IndexStore;
use crate::core::errors::ApiError;
use crate::document::Document;
use crate::loader::DocumentLoader;

/// The searchable knowledge index: a store plus the embedder that feeds it.
///
/// Writers (rebuild, append) are serialized; readers go straight to the
/// store and observe either the old or the new state.
pub struct KnowledgeIndex {
    store: Arc<dyn IndexStore>,
    embedder: Arc<dyn Embedder>,
    write_lock: Mutex<()>,
}

impl KnowledgeIndex {
    pub fn new(store: Arc<dyn IndexStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            write_lock: Mutex::new(()),
        }
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    async fn embed_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<(Document, Vec<f32>)>, ApiError> {
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|doc| !doc.content.trim().is_empty())
            .collect();
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents.iter().map(|doc| doc.content.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(ApiError::Internal(format!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }
        Ok(documents.into_iter().zip(vectors).collect())
    }

    /// Replaces the whole index. Embeddings are computed before the store is
    /// touched, so a failure leaves the previous index intact.
    pub async fn rebuild(&self, documents: Vec<Document>) -> Result<usize, ApiError> {
        let _guard = self.write_lock.lock().await;
        let items = self.embed_documents(documents).await?;
        if items.is_empty() {
            warn!("Rebuilding with no documents; index will be empty");
        }
        let count = self
            .store
            .replace_all(items, self.embedder.model_name())
            .await?;
        info!("Knowledge index rebuilt with {} documents", count);
        Ok(count)
    }

    pub async fn append(&self, documents: Vec<Document>) -> Result<usize, ApiError> {
        let _guard = self.write_lock.lock().await;
        let items = self.embed_documents(documents).await?;
        self.store.append(items).await
    }

    /// Runs the loader off the async runtime, then rebuilds from its output.
    pub async fn rebuild_from(&self, loader: &DocumentLoader) -> Result<usize, ApiError> {
        let source_dir = loader.data_dir().display().to_string();
        let loader = loader.clone();
        let documents = tokio::task::spawn_blocking(move || loader.load_directory())
            .await
            .map_err(ApiError::internal)?;
        info!("Loaded {} documents from {}", documents.len(), source_dir);
        self.rebuild(documents).await
    }

    /// Startup bootstrap: rebuild when the store is empty or was built with a
    /// different embedding model. Returns the resulting document count.
    pub async fn ensure_built(&self, loader: &DocumentLoader) -> Result<usize, ApiError> {
        let count = self.store.count().await?;
        let recorded = self.store.embedding_model().await?;
        let current = self.embedder.model_name();

        if count > 0 && recorded.as_deref() == Some(current) {
            info!("Knowledge index ready ({} documents)", count);
            return Ok(count);
        }

        if count > 0 {
            warn!(
                "Embedding model changed ({:?} -> {}); rebuilding index",
                recorded, current
            );
        }
        self.rebuild_from(loader).await
    }

    pub async fn scan_all(&self) -> Result<Vec<Document>, ApiError> {
        Ok(self
            .store
            .scan_all()
            .await?
            .into_iter()
            .map(|stored| stored.document)
            .collect())
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, ApiError> {
        if k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let Some(query_vector) = vectors.pop() else {
            return Ok(Vec::new());
        };
        Ok(self
            .store
            .search(&query_vector, k)
            .await?
            .into_iter()
            .map(|scored| scored.stored.document)
            .collect())
    }

    pub async fn count(&self) -> Result<usize, ApiError> {
        self.store.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::personnel::load_personnel_sheet;
    use crate::loader::spreadsheet::SheetGrid;
    use crate::rag::embedding::HashingEmbedder;
    use crate::rag::sqlite::SqliteIndexStore;
    use async_trait::async_trait;

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Err(ApiError::unavailable("embedding service down"))
        }
    }

    async fn sqlite(dir: &tempfile::TempDir) -> Arc<dyn IndexStore> {
        Arc::new(
            SqliteIndexStore::with_path(dir.path().join("index.db"))
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = sqlite(&dir).await;

        let healthy = KnowledgeIndex::new(store.clone(), Arc::new(HashingEmbedder::default()));
        healthy
            .rebuild(vec![Document::new("thông báo nghỉ tết")])
            .await
            .unwrap();

        let broken = KnowledgeIndex::new(store, Arc::new(FailingEmbedder));
        assert!(broken.rebuild(vec![Document::new("khác")]).await.is_err());

        let docs = healthy.scan_all().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "thông báo nghỉ tết");
    }

    #[tokio::test]
    async fn ensure_built_rebuilds_on_model_change() {
        let dir = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        std::fs::write(data.path().join("noi_quy.txt"), "Nội quy công ty").unwrap();
        let loader = DocumentLoader::new(data.path());
        let store = sqlite(&dir).await;

        let first = KnowledgeIndex::new(store.clone(), Arc::new(HashingEmbedder::new(32)));
        assert_eq!(first.ensure_built(&loader).await.unwrap(), 1);

        std::fs::write(data.path().join("them.txt"), "Tài liệu mới").unwrap();
        assert_eq!(first.ensure_built(&loader).await.unwrap(), 1);

        let second = KnowledgeIndex::new(store.clone(), Arc::new(HashingEmbedder::new(64)));
        assert_eq!(second.ensure_built(&loader).await.unwrap(), 2);
        assert_eq!(
            store.embedding_model().await.unwrap().as_deref(),
            Some("hashing-64")
        );
    }

    async fn snapshot(index: &KnowledgeIndex) -> (usize, Vec<String>) {
        let mut fingerprints: Vec<String> = index
            .scan_all()
            .await
            .unwrap()
            .iter()
            .map(Document::fingerprint)
            .collect();
        fingerprints.sort();
        (index.count().await.unwrap(), fingerprints)
    }

    fn roster() -> SheetGrid {
        let mut rows: Vec<Vec<String>> = (0..6).map(|_| vec![String::new(); 4]).collect();
        rows[0][0] = "DANH SÁCH NHÂN VIÊN".to_string();
        rows.push(
            ["Họ và tên", "Phòng ban", "Chức vụ", "Số điện thoại"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        rows.push(
            ["Nguyễn Thị Lan", "Kế toán", "Kế toán trưởng", "0912"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        SheetGrid::from_rows(rows)
    }

    #[tokio::test]
    async fn rebuilding_unchanged_sources_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        std::fs::write(data.path().join("thiet_bi.csv"), "Tên,Phòng
Máy chiếu,Họp 1
Loa,Họp 2
").unwrap();
        std::fs::write(data.path().join("noi_quy.txt"), "Giờ làm việc từ 8h đến 17h").unwrap();
        let loader = DocumentLoader::new(data.path());
        let index = KnowledgeIndex::new(sqlite(&dir).await, Arc::new(HashingEmbedder::default()));

        let first_count = index.rebuild_from(&loader).await.unwrap();
        let first = snapshot(&index).await;
        let second_count = index.rebuild_from(&loader).await.unwrap();
        let second = snapshot(&index).await;

        assert_eq!(first_count, 3);
        assert_eq!(first_count, second_count);
        assert_eq!(first.0, first_count);
        assert_eq!(first, second);

        let sources = || {
            let mut docs = loader.load_directory();
            docs.extend(load_personnel_sheet(&roster()));
            docs
        };
        let with_roster = index.rebuild(sources()).await.unwrap();
        let third = snapshot(&index).await;
        index.rebuild(sources()).await.unwrap();
        let fourth = snapshot(&index).await;

        assert_eq!(with_roster, first_count + 7);
        assert_eq!(third, fourth);
    }

    #[tokio::test]
    async fn search_returns_lexically_closest_first() {
        let dir = tempfile::tempdir().unwrap();
        let index = KnowledgeIndex::new(sqlite(&dir).await, Arc::new(HashingEmbedder::default()));
        index
            .rebuild(vec![
                Document::new("lịch nghỉ tết nguyên đán"),
                Document::new("quy trình mua sắm thiết bị"),
            ])
            .await
            .unwrap();
        index.append(vec![Document::new("   ")]).await.unwrap();

        let hits = index.search("lịch nghỉ tết", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "lịch nghỉ tết nguyên đán");
        assert_eq!(index.count().await.unwrap(), 2);
    }
}
