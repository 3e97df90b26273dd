pub mod paths;
pub mod service;
pub mod settings;

pub use paths::AppPaths;
pub use service::{ConfigService, LoadedConfig};
pub use settings::{
    AdminConfig, AppConfig, EmbeddingConfig, EmbeddingProviderKind, IngestConfig, LlmConfig, LlmProviderKind,
    SearchConfig, ServerConfig, ALLOW_ALL_SOURCES,
};
