use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::http_client;
use super::provider::LlmProvider;
use super::sse::forward_events;
use super::types::{GenerationRequest, Role};
use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;

/// Google Generative Language REST API (`generateContent`).
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    default_temperature: f32,
    timeout: Duration,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, ApiError> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = http_client(timeout)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            default_temperature: config.temperature,
            timeout,
            client,
        })
    }

    fn body(&self, request: &GenerationRequest) -> Value {
        let mut contents: Vec<Value> = request
            .history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Model => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            })
            .collect();
        contents.push(json!({ "role": "user", "parts": [{ "text": request.prompt }] }));

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature.unwrap_or(self.default_temperature),
            },
        });
        if let (Some(system), Some(obj)) = (&request.system_instruction, body.as_object_mut()) {
            obj.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{ "text": system }] }),
            );
        }
        body
    }

    fn url(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    fn unary_request(&self, request: &GenerationRequest) -> RequestBuilder {
        self.client
            .post(self.url("generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&self.body(request))
    }

    fn stream_request(&self, request: &GenerationRequest) -> RequestBuilder {
        self.client
            .post(self.url("streamGenerateContent"))
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(&self.body(request))
    }
}

/// Concatenated text of the first candidate; `None` when it was blocked or empty.
fn candidate_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        let res = self
            .unary_request(request)
            .send()
            .await
            .map_err(ApiError::unavailable)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Gemini error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        Ok(candidate_text(&payload).unwrap_or_default())
    }

    async fn stream_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        let res = self
            .stream_request(request)
            .send()
            .await
            .map_err(ApiError::unavailable)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Gemini stream error: {}", text)));
        }

        let (tx, rx) = mpsc::channel(32);
        let stream = res.bytes_stream();
        tokio::spawn(forward_events(stream, tx, candidate_text));

        Ok(rx)
    }
}
