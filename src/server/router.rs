use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{admin, chat, health, ingest, logs};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// This function sets up:
/// - CORS middleware
/// - Health check endpoints
/// - Admin endpoints (login, source files, rebuild, live ingest, chat logs)
/// - The Google Chat webhook
/// - The chat completion endpoint
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_allowed_origins);
    let body_limit = DefaultBodyLimit::max(state.config.server.max_upload_bytes);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/admin/login", post(admin::login))
        .route("/admin/add-employee", post(ingest::add_employee))
        .route("/admin/add-news", post(ingest::add_news))
        .route("/admin/files", get(admin::list_files))
        .route("/admin/files/:filename", delete(admin::delete_file))
        .route("/admin/upload", post(admin::upload_file))
        .route("/admin/rebuild-rag", post(admin::rebuild_rag))
        .route("/admin/chat_logs", get(logs::list_chat_logs))
        .route("/admin/chat_logs/:filename", get(logs::get_chat_log))
        .route("/v1/google-chat/webhook", post(ingest::google_chat_webhook))
        .route("/v1/chat/completions", post(chat::chat_completions))
        .layer(body_limit)
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    let allow_origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
}
