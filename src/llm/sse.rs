//! Reassembles `data:` lines from a chunked server-sent-event body.

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::errors::ApiError;

/// Bytes are buffered until a full line arrives, so multi-byte characters
/// split across chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Feeds raw bytes; returns the payloads of every completed `data:` line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(data) = data_payload(&String::from_utf8_lossy(&line)) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Any trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        data_payload(&String::from_utf8_lossy(&rest))
    }
}

fn data_payload(line: &str) -> Option<String> {
    let line = line.trim();
    line.strip_prefix("data:")
        .map(|data| data.trim().to_string())
        .filter(|data| !data.is_empty())
}

/// Drives an SSE byte stream, turning each JSON payload into text with
/// `extract` and forwarding it. Stops at `[DONE]`, on error, or when the
/// receiver goes away.
pub async fn forward_events<S, B, E, F>(
    mut stream: S,
    tx: mpsc::Sender<Result<String, ApiError>>,
    extract: F,
) where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    F: Fn(&Value) -> Option<String>,
{
    let mut buffer = SseLineBuffer::default();
    while let Some(item) = stream.next().await {
        match item {
            Ok(bytes) => {
                for payload in buffer.push(bytes.as_ref()) {
                    if payload == "[DONE]" {
                        return;
                    }
                    if !send_payload(&tx, &payload, &extract).await {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(Err(ApiError::internal(e))).await;
                return;
            }
        }
    }

    if let Some(payload) = buffer.finish() {
        if payload != "[DONE]" {
            send_payload(&tx, &payload, &extract).await;
        }
    }
}

async fn send_payload<F>(tx: &mpsc::Sender<Result<String, ApiError>>, payload: &str, extract: &F) -> bool
where
    F: Fn(&Value) -> Option<String>,
{
    let Ok(json) = serde_json::from_str::<Value>(payload) else {
        return true;
    };
    match extract(&json) {
        Some(text) if !text.is_empty() => tx.send(Ok(text)).await.is_ok(),
        _ => true,
    }
}
