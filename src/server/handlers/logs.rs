use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;

use crate::core::errors::ApiError;
use crate::core::security::require_admin;
use crate::state::AppState;

pub async fn list_chat_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;
    Ok(Json(state.chat.logs().list()))
}

pub async fn get_chat_log(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;
    let entries = state.chat.logs().read(&filename).await?;
    Ok(Json(entries))
}
