use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::core::config::SearchConfig;
use crate::core::errors::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Free-text web search used when the client asks for internet results.
#[async_trait]
pub trait WebSearchTool: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct WebSearchClient {
    config: SearchConfig,
    client: Client,
}

impl WebSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    pub async fn perform_search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let google_ready =
            !self.config.google_api_key.is_empty() && !self.config.google_engine_id.is_empty();

        if self.config.provider == "google" && google_ready {
            match self.google_search(query).await {
                Ok(results) if !results.is_empty() => return Ok(results),
                Ok(_) => {}
                Err(err) => warn!("Google search failed, falling back: {}", err),
            }
        }

        self.duckduckgo_search(query).await
    }

    async fn google_search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://www.googleapis.com/customsearch/v1?key={}&cx={}&q={}",
            self.config.google_api_key,
            self.config.google_engine_id,
            urlencoding::encode(query)
        );

        let response = self.client.get(url).send().await.map_err(ApiError::internal)?;
        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Google search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        let items = payload
            .get("items")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .filter_map(|item| {
                let title = item.get("title").and_then(|v| v.as_str()).unwrap_or("");
                let url = item.get("link").and_then(|v| v.as_str()).unwrap_or("");
                let snippet = item.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
                (!title.is_empty() && !url.is_empty()).then(|| SearchResult {
                    title: title.to_string(),
                    url: url.to_string(),
                    snippet: snippet.to_string(),
                })
            })
            .collect())
    }

    async fn duckduckgo_search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
            urlencoding::encode(query)
        );

        let response = self.client.get(url).send().await.map_err(ApiError::internal)?;
        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "DuckDuckGo search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        Ok(parse_duckduckgo(&payload))
    }
}

#[async_trait]
impl WebSearchTool for WebSearchClient {
    async fn search(&self, query: &str) -> Result<String, ApiError> {
        let mut results = self.perform_search(query).await?;
        results.truncate(self.config.max_results.max(1));
        Ok(format_results(&results))
    }
}

fn parse_duckduckgo(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    let abstract_text = payload.get("AbstractText").and_then(|v| v.as_str()).unwrap_or("");
    let abstract_url = payload.get("AbstractURL").and_then(|v| v.as_str()).unwrap_or("");
    if !abstract_text.is_empty() && !abstract_url.is_empty() {
        results.push(SearchResult {
            title: payload
                .get("Heading")
                .and_then(|v| v.as_str())
                .filter(|h| !h.is_empty())
                .unwrap_or(abstract_text)
                .to_string(),
            url: abstract_url.to_string(),
            snippet: abstract_text.to_string(),
        });
    }

    for key in ["Results", "RelatedTopics"] {
        if let Some(items) = payload.get(key).and_then(|v| v.as_array()) {
            extract_ddg_topics(items, &mut results);
        }
    }
    results
}

fn extract_ddg_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_ddg_topics(topics, results);
            continue;
        }
        let text = item.get("Text").and_then(|v| v.as_str()).unwrap_or("");
        let url = item.get("FirstURL").and_then(|v| v.as_str()).unwrap_or("");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title: text.split(" - ").next().unwrap_or(text).to_string(),
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }
}

pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n{}\nNguồn: {}", i + 1, r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}
