//! Chat session orchestration and the transcript log.

pub mod log;
pub mod session;

pub use log::{ChatLogEntry, ChatLogStore};
pub use session::{ChatCompletionRequest, ChatService, GENERATION_FALLBACK};
