use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::core::errors::ApiError;
use crate::core::security::require_admin;
use crate::files::{list_dir, sanitize_filename};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let token = state.admin.login(&request.password)?;
    Ok(Json(json!({ "token": token })))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;
    Ok(Json(list_dir(&state.paths.data_dir, None)))
}

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let raw_name = field.file_name().unwrap_or_default().to_string();
        let safe_name = sanitize_filename(&raw_name)
            .ok_or_else(|| ApiError::BadRequest("Invalid filename".to_string()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let path = state.paths.data_dir.join(&safe_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(ApiError::internal)?;
        info!("Uploaded {} ({} bytes)", safe_name, data.len());

        return Ok(Json(json!({ "filename": safe_name, "status": "success" })));
    }

    Err(ApiError::BadRequest("Missing multipart field 'file'".to_string()))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;

    let safe_name = sanitize_filename(&filename)
        .ok_or_else(|| ApiError::BadRequest("Invalid filename".to_string()))?;
    let path = state.paths.data_dir.join(safe_name);

    if !path.is_file() {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    tokio::fs::remove_file(&path)
        .await
        .map_err(ApiError::internal)?;
    info!("Deleted source file {}", safe_name);
    Ok(Json(json!({ "status": "deleted" })))
}

pub async fn rebuild_rag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.admin)?;

    info!("Rebuilding knowledge index");
    let documents = state.index.rebuild_from(&state.loader).await?;
    Ok(Json(json!({ "status": "rebuilt", "documents": documents })))
}
