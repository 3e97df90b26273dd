//! Google Chat webhook payloads.
//!
//! Two shapes are understood: the Workspace add-on event
//! (`chat.messagePayload`) and the legacy bot event (`chat.message`). The
//! legacy shape fills in whichever of text/space the add-on shape lacks.

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;

use crate::core::config::ALLOW_ALL_SOURCES;
use crate::document::{meta, DocType, Document};

pub const SYNC_FILE: &str = "google_chat_sync.txt";
pub const CHAT_SOURCE: &str = "google_chat";
pub const UNKNOWN_SPACE: &str = "unknown";

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    chat: Option<ChatEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatEvent {
    #[serde(default, rename = "messagePayload")]
    message_payload: Option<AddOnPayload>,
    #[serde(default)]
    message: Option<LegacyMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct AddOnPayload {
    #[serde(default)]
    space: Option<Space>,
    #[serde(default)]
    message: Option<AddOnMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct AddOnMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "argumentText")]
    argument_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    space: Option<Space>,
}

#[derive(Debug, Default, Deserialize)]
struct Space {
    #[serde(default)]
    name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Which payload shape supplied the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    AddOn,
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageEvent {
    pub space_id: String,
    pub text: String,
    pub shape: PayloadShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Message(ChatMessageEvent),
    /// Nothing usable in the payload; `space_id` is whatever could be found.
    NoText { space_id: String },
}

/// Best-effort extraction. Payloads that do not match either shape, or are
/// not objects at all, yield `NoText`.
pub fn extract(body: &Value) -> Extraction {
    let envelope: Envelope = serde_json::from_value(body.clone()).unwrap_or_default();
    let chat = envelope.chat.unwrap_or_default();

    let mut space_id: Option<String> = None;
    let mut found: Option<(String, PayloadShape)> = None;

    if let Some(payload) = chat.message_payload {
        space_id = non_empty(payload.space.and_then(|s| s.name));
        if let Some(message) = payload.message {
            found = non_empty(message.text)
                .or_else(|| non_empty(message.argument_text))
                .map(|text| (text, PayloadShape::AddOn));
        }
    }

    if found.is_none() || space_id.is_none() {
        if let Some(legacy) = chat.message {
            if found.is_none() {
                found = non_empty(legacy.text).map(|text| (text, PayloadShape::Legacy));
            }
            if space_id.is_none() {
                space_id = non_empty(legacy.space.and_then(|s| s.name));
            }
        }
    }

    let space_id = space_id.unwrap_or_else(|| UNKNOWN_SPACE.to_string());
    match found {
        Some((text, shape)) => Extraction::Message(ChatMessageEvent {
            space_id,
            text,
            shape,
        }),
        None => Extraction::NoText { space_id },
    }
}

/// Which chat spaces may feed the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedSourcePolicy {
    All,
    Only(String),
}

impl AllowedSourcePolicy {
    pub fn from_setting(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALLOW_ALL_SOURCES {
            AllowedSourcePolicy::All
        } else {
            AllowedSourcePolicy::Only(value.to_string())
        }
    }

    pub fn admits(&self, space_id: &str) -> bool {
        match self {
            AllowedSourcePolicy::All => true,
            AllowedSourcePolicy::Only(allowed) => allowed == space_id,
        }
    }
}

impl ChatMessageEvent {
    pub fn render(&self, received_at: &str) -> String {
        format!(
            "\n---\nNGUỒN: Google Chat\nNGÀY NHẬN: {}\nPHÒNG: {}\nNỘI DUNG: {}\n---\n",
            received_at, self.space_id, self.text
        )
    }

    pub fn to_document(&self, now: DateTime<Local>) -> Document {
        let received_at = now.format("%d/%m/%Y %H:%M:%S").to_string();
        Document::new(self.render(&received_at))
            .with_meta(meta::SOURCE, CHAT_SOURCE)
            .with_meta(meta::SPACE_ID, self.space_id.clone())
            .with_meta(meta::RECEIVED_AT, received_at)
            .with_doc_type(DocType::Announce)
    }
}
