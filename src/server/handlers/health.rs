use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "NHTC Bot Backend is Running!"
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.index.count().await {
        Ok(documents) => Json(json!({
            "status": "ok",
            "documents": documents,
            "embedding_model": state.index.embedding_model(),
        })),
        Err(err) => {
            tracing::warn!("Health check could not count documents: {}", err);
            Json(json!({
                "status": "degraded",
                "documents": null,
                "embedding_model": state.index.embedding_model(),
            }))
        }
    }
}
