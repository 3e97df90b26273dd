//! Live additions to the knowledge base.
//!
//! Every accepted record is first appended to a plain-text file in the source
//! directory, so the next full rebuild picks it up, and then appended to the
//! live index.

pub mod records;
pub mod webhook;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::core::errors::ApiError;
use crate::document::Document;
use crate::rag::KnowledgeIndex;

pub use records::{EmployeeRecord, NewsRecord, EMPLOYEE_FILE, NEWS_FILE};
pub use webhook::{extract, AllowedSourcePolicy, ChatMessageEvent, Extraction, SYNC_FILE};

/// Result of processing one webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Ingested { space_id: String },
    Filtered { space_id: String },
    NoText { space_id: String },
}

pub fn ack_text() -> String {
    format!("✅ Bot NHTC đã nhận tin lúc {}", Local::now().format("%H:%M:%S"))
}

#[derive(Clone)]
pub struct IngestService {
    data_dir: PathBuf,
    index: Arc<KnowledgeIndex>,
    policy: AllowedSourcePolicy,
}

impl IngestService {
    pub fn new(data_dir: impl Into<PathBuf>, index: Arc<KnowledgeIndex>, policy: AllowedSourcePolicy) -> Self {
        Self {
            data_dir: data_dir.into(),
            index,
            policy,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn append_durable(&self, file_name: &str, content: &str) -> Result<(), ApiError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(ApiError::internal)?;
        let path = self.data_dir.join(file_name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(ApiError::internal)?;
        file.write_all(content.as_bytes())
            .await
            .map_err(ApiError::internal)?;
        file.flush().await.map_err(ApiError::internal)
    }

    /// Durable write first; the index append is best-effort on top of it.
    async fn store(&self, file_name: &str, document: Document) -> Result<(), ApiError> {
        self.append_durable(file_name, &document.content).await?;

        if let Err(err) = self.index.append(vec![document]).await {
            warn!(
                "Saved to {} but live index update failed: {}",
                file_name, err
            );
        }
        Ok(())
    }

    pub async fn add_employee(&self, record: &EmployeeRecord) -> Result<String, ApiError> {
        record.validate()?;
        self.store(EMPLOYEE_FILE, record.to_document(Local::now()))
            .await?;
        info!("Live update: added employee {}", record.ho_ten);
        Ok(format!(
            "Đã lưu thông tin và cập nhật RAG cho {}",
            record.ho_ten
        ))
    }

    pub async fn add_news(&self, record: &NewsRecord) -> Result<String, ApiError> {
        record.validate()?;
        self.store(NEWS_FILE, record.to_document(Local::now()))
            .await?;
        info!("Live update: added announcement {}", record.tieu_de);
        Ok(format!(
            "Đã lưu thông báo và cập nhật RAG: {}",
            record.tieu_de
        ))
    }

    pub async fn process_webhook(&self, body: &Value) -> Result<WebhookOutcome, ApiError> {
        let event = match extract(body) {
            Extraction::Message(event) => event,
            Extraction::NoText { space_id } => {
                debug!("Webhook from {} carried no text", space_id);
                return Ok(WebhookOutcome::NoText { space_id });
            }
        };

        if !self.policy.admits(&event.space_id) {
            info!("Webhook from space {} not allowed", event.space_id);
            return Ok(WebhookOutcome::Filtered {
                space_id: event.space_id,
            });
        }

        self.store(SYNC_FILE, event.to_document(Local::now()))
            .await?;
        let preview: String = event.text.chars().take(30).collect();
        info!("Google Chat sync stored: {}...", preview);
        Ok(WebhookOutcome::Ingested {
            space_id: event.space_id,
        })
    }

    /// Processes the payload on a background task; the caller answers at once.
    pub fn spawn_webhook(&self, body: Value) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.process_webhook(&body).await {
                error!("Webhook processing failed: {}", err);
            }
        })
    }
}
