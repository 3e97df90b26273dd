use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::core::errors::ApiError;
use crate::files::{list_dir, sanitize_filename, FileEntry};

const LOG_EXTENSION: &str = "jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub timestamp: String,
    pub device_id: String,
    pub user_query: String,
    pub bot_response: String,
}

/// Daily JSON-lines transcript of answered questions.
#[derive(Debug, Clone)]
pub struct ChatLogStore {
    dir: PathBuf,
}

impl ChatLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Appends one entry to today's file. Failures are logged, never returned.
    pub async fn append(&self, device_id: &str, user_query: &str, bot_response: &str) {
        let now = Local::now();
        let entry = ChatLogEntry {
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            device_id: device_id.to_string(),
            user_query: user_query.to_string(),
            bot_response: bot_response.to_string(),
        };
        let path = self
            .dir
            .join(format!("chat_log_{}.{LOG_EXTENSION}", now.format("%Y%m%d")));

        match self.write_line(&path, &entry).await {
            Ok(()) => info!("Logged chat for device_id: {}", device_id),
            Err(err) => warn!("Could not save chat log {}: {}", path.display(), err),
        }
    }

    async fn write_line(&self, path: &Path, entry: &ChatLogEntry) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        fs::create_dir_all(&self.dir).await?;
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Log files, newest name first.
    pub fn list(&self) -> Vec<FileEntry> {
        let mut files = list_dir(&self.dir, Some(LOG_EXTENSION));
        files.reverse();
        files
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<Value>, ApiError> {
        let safe_name = sanitize_filename(filename)
            .ok_or_else(|| ApiError::BadRequest("Invalid log filename".to_string()))?;
        let path = self.dir.join(safe_name);

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ApiError::NotFound("Không tìm thấy tệp nhật ký".to_string()));
        }

        let content = fs::read_to_string(&path).await.map_err(ApiError::internal)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| ApiError::Internal(format!("Lỗi đọc tệp: {}", e)))
            })
            .collect()
    }
}
