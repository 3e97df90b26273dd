use serde::{Deserialize, Serialize};

/// A message as received from the client (`role` is free text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Provider-neutral generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Sent on the provider's system channel when present.
    pub system_instruction: Option<String>,
    pub history: Vec<Turn>,
    pub prompt: String,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            history: Vec::new(),
            prompt: prompt.into(),
            temperature: None,
        }
    }
}
