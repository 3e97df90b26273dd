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

/// Any OpenAI-compatible `/v1/chat/completions` server (LM Studio, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: String,
    model: String,
    default_temperature: f32,
    timeout: Duration,
    client: Client,
}

impl OpenAiCompatProvider {
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

    fn messages(request: &GenerationRequest) -> Vec<Value> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if let Some(system) = &request.system_instruction {
            messages.push(json!({ "role": "system", "content": system }));
        }
        for turn in &request.history {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "assistant",
            };
            messages.push(json!({ "role": role, "content": turn.content }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));
        messages
    }

    fn body(&self, request: &GenerationRequest, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": Self::messages(request),
            "temperature": request.temperature.unwrap_or(self.default_temperature),
            "stream": stream,
        })
    }

    fn request(&self, request: &GenerationRequest, stream: bool) -> RequestBuilder {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut req = self.client.post(&url).json(&self.body(request, stream));
        if !stream {
            req = req.timeout(self.timeout);
        }
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        req
    }

    async fn post(&self, request: &GenerationRequest, stream: bool) -> Result<reqwest::Response, ApiError> {
        let res = self
            .request(request, stream)
            .send()
            .await
            .map_err(ApiError::unavailable)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("chat completion error: {}", text)));
        }
        Ok(res)
    }
}

fn delta_content(payload: &Value) -> Option<String> {
    payload["choices"][0]["delta"]["content"]
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        let res = self.post(request, false).await?;
        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        Ok(payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn stream_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        let res = self.post(request, true).await?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(forward_events(res.bytes_stream(), tx, delta_content));

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Turn;

    #[test]
    fn messages_put_system_first_and_map_model_to_assistant() {
        let mut request = GenerationRequest::new("DỮ LIỆU NGỮ CẢNH:\n\n\nCÂU HỎI: hi");
        request.system_instruction = Some("RULES".into());
        request.history = vec![
            Turn { role: Role::User, content: "a".into() },
            Turn { role: Role::Model, content: "b".into() },
        ];

        let messages = OpenAiCompatProvider::messages(&request);
        let roles: Vec<&str> = messages.iter().filter_map(|m| m["role"].as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[3]["content"], "DỮ LIỆU NGỮ CẢNH:\n\n\nCÂU HỎI: hi");
    }

    #[test]
    fn stream_body_sets_flag_and_temperature_override() {
        let provider = OpenAiCompatProvider::new(&LlmConfig::default()).unwrap();
        let mut request = GenerationRequest::new("p");
        request.temperature = Some(0.0);

        let body = provider.body(&request, true);
        assert_eq!(body["stream"], true);
        assert_eq!(body["temperature"].as_f64(), Some(0.0));
    }

    #[test]
    fn delta_content_reads_chunk() {
        let chunk = json!({"choices": [{"delta": {"content": "Xin"}}]});
        assert_eq!(delta_content(&chunk).as_deref(), Some("Xin"));
        assert_eq!(delta_content(&json!({"choices": [{"delta": {}}]})), None);
    }

    #[test]
    fn streaming_request_has_no_total_timeout() {
        let provider = OpenAiCompatProvider::new(&LlmConfig {
            timeout_secs: 5,
            ..LlmConfig::default()
        })
        .unwrap();
        let request = GenerationRequest::new("p");

        let unary = provider.request(&request, false).build().unwrap();
        assert_eq!(unary.timeout(), Some(&Duration::from_secs(5)));
        assert_eq!(provider.request(&request, true).build().unwrap().timeout(), None);
    }
}
