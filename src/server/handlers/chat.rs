use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{stream, StreamExt};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use crate::chat::ChatCompletionRequest;
use crate::core::errors::ApiError;
use crate::state::AppState;

fn delta_event(chunk: String) -> Event {
    Event::default().data(json!({ "choices": [{ "delta": { "content": chunk } }] }).to_string())
}

pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.is_stream() {
        // dropping this stream on disconnect closes the channel and stops the producer
        let chunks = state.chat.stream(&request).await;
        let events = ReceiverStream::new(chunks)
            .map(|chunk| Ok::<_, Infallible>(delta_event(chunk)))
            .chain(stream::once(async {
                Ok::<_, Infallible>(Event::default().data("[DONE]"))
            }));
        return Ok(Sse::new(events).into_response());
    }

    let content = state.chat.complete(&request).await;
    Ok(Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
    .into_response())
}
