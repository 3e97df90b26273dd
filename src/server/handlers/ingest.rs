use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::core::security::require_admin;
use crate::ingest::{ack_text, EmployeeRecord, NewsRecord};
use crate::state::AppState;

pub async fn add_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<EmployeeRecord>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;
    let Json(record) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let message = state.ingest.add_employee(&record).await?;
    Ok(Json(json!({ "status": "success", "message": message })))
}

pub async fn add_news(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<NewsRecord>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;
    let Json(record) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let message = state.ingest.add_news(&record).await?;
    Ok(Json(json!({ "status": "success", "message": message })))
}

/// Acknowledges at once; parsing and ingestion run in the background.
/// Any body is accepted, including an empty or non-JSON one.
pub async fn google_chat_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.ingest.spawn_webhook(payload);
    Json(json!({ "text": ack_text() }))
}
