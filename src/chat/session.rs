use std::sync::Arc;

use chrono::Local;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::log::ChatLogStore;
use crate::context::{assemble, InstructionChannel};
use crate::llm::{ChatMessage, GenerationRequest, LlmProvider};
use crate::rag::HybridRetriever;
use crate::search::WebSearchTool;

pub const GENERATION_FALLBACK: &str = "Rất tiếc, AI không thể tạo câu trả lời cho nội dung này.";
pub const SEARCH_UNAVAILABLE: &str = "Không thể tìm kiếm internet lúc này.";

fn default_device_id() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default)]
    pub search_web: bool,
}

impl ChatCompletionRequest {
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Content of the last `user` message, empty when there is none.
    pub fn latest_user_query(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_user())
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// A request ready for the model, plus what the transcript log needs.
#[derive(Debug, Clone)]
pub struct PreparedChat {
    pub device_id: String,
    pub query: String,
    pub generation: GenerationRequest,
}

/// Answers one chat request: context gathering, prompt assembly,
/// generation and transcript logging.
#[derive(Clone)]
pub struct ChatService {
    retriever: HybridRetriever,
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn WebSearchTool>,
    logs: ChatLogStore,
}

impl ChatService {
    pub fn new(
        retriever: HybridRetriever,
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn WebSearchTool>,
        logs: ChatLogStore,
    ) -> Self {
        Self {
            retriever,
            llm,
            search,
            logs,
        }
    }

    pub fn logs(&self) -> &ChatLogStore {
        &self.logs
    }

    async fn gather_context(&self, query: &str, search_web: bool) -> String {
        if search_web {
            info!("Searching the web for: {}", query);
            return match self.search.search(query).await {
                Ok(results) => format!("THÔNG TIN TỪ INTERNET:\n{}", results),
                Err(err) => {
                    warn!("Web search failed: {}", err);
                    SEARCH_UNAVAILABLE.to_string()
                }
            };
        }

        if query.is_empty() {
            return String::new();
        }
        self.retriever.retrieve(query).await
    }

    pub async fn prepare(&self, request: &ChatCompletionRequest) -> PreparedChat {
        let query = request.latest_user_query().to_string();
        let context = self.gather_context(&query, request.search_web).await;

        let channel = InstructionChannel::for_model(self.llm.model());
        let mut generation = assemble(&request.messages, &context, &query, channel, Local::now());
        generation.temperature = request.temperature;

        PreparedChat {
            device_id: request.device_id.clone(),
            query,
            generation,
        }
    }

    /// Full answer text. Generation failures degrade to a fixed apology.
    pub async fn complete(&self, request: &ChatCompletionRequest) -> String {
        let prepared = self.prepare(request).await;

        let content = match self.llm.generate(&prepared.generation).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Model returned no text");
                GENERATION_FALLBACK.to_string()
            }
            Err(err) => {
                error!("Generation failed: {}", err);
                GENERATION_FALLBACK.to_string()
            }
        };

        self.logs
            .append(&prepared.device_id, &prepared.query, &content)
            .await;
        content
    }

    /// Streams answer chunks. A model error becomes one final inline chunk.
    /// Dropping the receiver stops generation; only streams that run to the
    /// end are written to the transcript log.
    pub async fn stream(&self, request: &ChatCompletionRequest) -> mpsc::Receiver<String> {
        let prepared = self.prepare(request).await;
        let (tx, rx) = mpsc::channel(32);

        let llm = self.llm.clone();
        let logs = self.logs.clone();
        tokio::spawn(async move {
            let mut full_text = String::new();

            match llm.stream_generate(&prepared.generation).await {
                Ok(mut chunks) => {
                    while let Some(item) = chunks.recv().await {
                        match item {
                            Ok(chunk) => {
                                full_text.push_str(&chunk);
                                if tx.send(chunk).await.is_err() {
                                    info!("Client disconnected; stopping generation");
                                    return;
                                }
                            }
                            Err(err) => {
                                error!("Stream error: {}", err);
                                if tx.send(format!("Lỗi mô hình: {}", err)).await.is_err() {
                                    return;
                                }
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    error!("Stream error: {}", err);
                    if tx.send(format!("Lỗi mô hình: {}", err)).await.is_err() {
                        return;
                    }
                }
            }

            logs.append(&prepared.device_id, &prepared.query, &full_text)
                .await;
        });

        rx
    }
}
