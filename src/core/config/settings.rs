use serde::{Deserialize, Serialize};

use crate::rag::scoring::RetrievalConfig;

/// Fully merged configuration. Every section falls back to its defaults, so
/// an absent `config.yml` still produces a runnable server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty list allows any origin.
    pub cors_allowed_origins: Vec<String>,
    pub log_level: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
            log_level: "info".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub password: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Gemini,
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Gemini,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    #[default]
    Http,
    /// Offline bag-of-words hashing; no external service.
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Http,
            base_url: "http://localhost:1234".to_string(),
            api_key: String::new(),
            model: "paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            batch_size: 32,
            timeout_secs: 60,
        }
    }
}

pub const ALLOW_ALL_SOURCES: &str = "ALL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Chat space whose messages are ingested, or `ALL`.
    pub allowed_chat_space: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            allowed_chat_space: ALLOW_ALL_SOURCES.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// `google` (needs key + engine id) or `duckduckgo`.
    pub provider: String,
    pub google_api_key: String,
    pub google_engine_id: String,
    pub timeout_secs: u64,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "duckduckgo".to_string(),
            google_api_key: String::new(),
            google_engine_id: String::new(),
            timeout_secs: 10,
            max_results: 5,
        }
    }
}
