use std::sync::Arc;

use crate::chat::{ChatLogStore, ChatService};
use crate::core::config::{AppConfig, AppPaths};
use crate::core::security::AdminCredentials;
use crate::ingest::{AllowedSourcePolicy, IngestService};
use crate::llm::{build_provider, LlmProvider};
use crate::loader::DocumentLoader;
use crate::rag::{build_embedder, Embedder, HybridRetriever, IndexStore, KnowledgeIndex, SqliteIndexStore};
use crate::search::{WebSearchClient, WebSearchTool};

pub mod error;

pub use error::InitializationError;

/// Global application state shared across all routes and background tasks.
///
/// Contains references to:
/// - Paths and the loaded configuration
/// - The knowledge index and the loader that rebuilds it
/// - Chat orchestration (retriever, LLM, web search, transcript log)
/// - Live ingestion
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<AppConfig>,
    pub admin: AdminCredentials,
    pub index: Arc<KnowledgeIndex>,
    pub loader: DocumentLoader,
    pub chat: ChatService,
    pub ingest: IngestService,
}

impl AppState {
    /// Opens every external collaborator named by the configuration.
    ///
    /// The index is opened but not built; callers run
    /// `KnowledgeIndex::ensure_built` once the server is otherwise ready.
    pub async fn initialize(
        paths: Arc<AppPaths>,
        config: AppConfig,
    ) -> Result<Arc<Self>, InitializationError> {
        let store = SqliteIndexStore::new(paths.as_ref())
            .await
            .map_err(|e| InitializationError::Index(e.into()))?;
        let embedder =
            build_embedder(&config.embedding).map_err(|e| InitializationError::Embedding(e.into()))?;
        let llm = build_provider(&config.llm).map_err(|e| InitializationError::Llm(e.into()))?;
        let search =
            WebSearchClient::new(&config.search).map_err(|e| InitializationError::Search(e.into()))?;

        Ok(Self::assemble(
            paths,
            config,
            Arc::new(store),
            embedder,
            llm,
            Arc::new(search),
        ))
    }

    /// Wires already-built collaborators together.
    pub fn assemble(
        paths: Arc<AppPaths>,
        config: AppConfig,
        store: Arc<dyn IndexStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn WebSearchTool>,
    ) -> Arc<Self> {
        let index = Arc::new(KnowledgeIndex::new(store, embedder));
        let loader = DocumentLoader::new(paths.data_dir.clone());
        let retriever = HybridRetriever::new(index.clone(), config.retrieval.clone());
        let chat = ChatService::new(
            retriever,
            llm,
            search,
            ChatLogStore::new(paths.chat_log_dir.clone()),
        );
        let ingest = IngestService::new(
            paths.data_dir.clone(),
            index.clone(),
            AllowedSourcePolicy::from_setting(&config.ingest.allowed_chat_space),
        );
        let admin = AdminCredentials::from_config(&config.admin);

        Arc::new(AppState {
            paths,
            config: Arc::new(config),
            admin,
            index,
            loader,
            chat,
            ingest,
        })
    }
}
