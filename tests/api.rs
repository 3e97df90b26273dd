use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use nhtc_backend::core::config::{AdminConfig, AppConfig, AppPaths};
use nhtc_backend::core::errors::ApiError;
use nhtc_backend::llm::{GenerationRequest, LlmProvider};
use nhtc_backend::rag::{HashingEmbedder, SqliteIndexStore};
use nhtc_backend::search::WebSearchTool;
use nhtc_backend::server::router::router;
use nhtc_backend::state::AppState;

const TOKEN: &str = "test-admin-token";
const PASSWORD: &str = "test-admin-password";

/// Answers with the prompt it was given, so tests can inspect the context.
struct EchoLlm;

#[async_trait]
impl LlmProvider for EchoLlm {
    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "gemini-2.0-flash"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        Ok(request.prompt.clone())
    }

    async fn stream_generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok("Xin ".to_string())).await.unwrap();
        tx.send(Ok("chào".to_string())).await.unwrap();
        Ok(rx)
    }
}

struct NoSearch;

#[async_trait]
impl WebSearchTool for NoSearch {
    async fn search(&self, _query: &str) -> Result<String, ApiError> {
        Err(ApiError::unavailable("offline"))
    }
}

struct TestApp {
    app: Router,
    state: Arc<AppState>,
    _dir: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let paths = Arc::new(AppPaths::from_dirs(
        dir.path().to_path_buf(),
        dir.path().join("user"),
        dir.path().join("user").join("data"),
    ));
    let config = AppConfig {
        admin: AdminConfig {
            password: PASSWORD.to_string(),
            token: TOKEN.to_string(),
        },
        ..AppConfig::default()
    };
    let store = SqliteIndexStore::with_path(paths.index_db_path.clone())
        .await
        .unwrap();

    let state = AppState::assemble(
        paths,
        config,
        Arc::new(store),
        Arc::new(HashingEmbedder::default()),
        Arc::new(EchoLlm),
        Arc::new(NoSearch),
    );
    TestApp {
        app: router(state.clone()),
        state,
        _dir: dir,
    }
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn employee() -> Value {
    json!({
        "hoTen": "Nguyễn Thị Lan",
        "phongBan": "Kế toán",
        "chucVu": "Kế toán trưởng",
        "soDienThoai": "0912 345 678",
        "email": "lan@nhtc.vn"
    })
}

#[tokio::test]
async fn root_and_health_report_status() {
    let t = test_app().await;

    let (status, body) = send_json(&t.app, get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send_json(&t.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"], 0);
    assert_eq!(body["embedding_model"], "hashing-256");
}

#[tokio::test]
async fn login_returns_token_only_for_correct_password() {
    let t = test_app().await;

    let (status, body) = send_json(
        &t.app,
        json_request("POST", "/admin/login", json!({"password": PASSWORD}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], TOKEN);

    let (status, _) = send_json(
        &t.app,
        json_request("POST", "/admin/login", json!({"password": "sai"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_before_side_effects() {
    let t = test_app().await;

    for token in [None, Some("wrong-token")] {
        let (status, _) = send_json(
            &t.app,
            json_request("POST", "/admin/add-employee", employee(), token),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = send_json(
        &t.app,
        json_request("POST", "/admin/add-news", json!("not an object"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for uri in ["/admin/files", "/admin/chat_logs", "/admin/chat_logs/x.jsonl"] {
        let (status, _) = send_json(&t.app, get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    assert!(!t.state.paths.data_dir.join("employees_manual.txt").exists());
    assert_eq!(t.state.index.count().await.unwrap(), 0);
}

#[tokio::test]
async fn added_employee_is_answerable_immediately() {
    let t = test_app().await;

    let (status, body) = send_json(
        &t.app,
        json_request("POST", "/admin/add-employee", employee(), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, body) = send_json(
        &t.app,
        json_request(
            "POST",
            "/v1/chat/completions",
            json!({
                "messages": [{"role": "user", "content": "email của chị lan"}],
                "device_id": "kiosk-7"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let answer = body["choices"][0]["message"]["content"].as_str().unwrap();
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert!(answer.contains("HỌ VÀ TÊN: Nguyễn Thị Lan"), "{answer}");
    assert!(answer.contains("EMAIL: lan@nhtc.vn"), "{answer}");
    assert!(answer.ends_with("CÂU HỎI: email của chị lan"));

    let (status, files) = send_json(&t.app, get("/admin/chat_logs", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    let name = files[0]["name"].as_str().unwrap().to_string();

    let (status, entries) =
        send_json(&t.app, get(&format!("/admin/chat_logs/{name}"), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries[0]["device_id"], "kiosk-7");
    assert_eq!(entries[0]["user_query"], "email của chị lan");
}

#[tokio::test]
async fn streaming_chat_emits_deltas_then_done() {
    let t = test_app().await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": "chào"}], "stream": true}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .collect();

    assert_eq!(data.len(), 3);
    let first: Value = serde_json::from_str(data[0]).unwrap();
    assert_eq!(first["choices"][0]["delta"]["content"], "Xin ");
    let second: Value = serde_json::from_str(data[1]).unwrap();
    assert_eq!(second["choices"][0]["delta"]["content"], "chào");
    assert_eq!(data[2], "[DONE]");
}

#[tokio::test]
async fn malformed_chat_request_is_bad_request() {
    let t = test_app().await;
    let (status, body) = send_json(
        &t.app,
        json_request("POST", "/v1/chat/completions", json!({"messages": "x"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn webhook_acks_then_ingests_in_background() {
    let t = test_app().await;
    let payload = json!({"chat": {"messagePayload": {
        "space": {"name": "spaces/NHTC"},
        "message": {"text": "Thông báo: nghỉ lễ 30/4 từ thứ 4"}
    }}});

    let (status, body) = send_json(
        &t.app,
        json_request("POST", "/v1/google-chat/webhook", payload, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["text"]
        .as_str()
        .unwrap()
        .starts_with("✅ Bot NHTC đã nhận tin lúc "));

    let mut count = 0;
    for _ in 0..100 {
        count = t.state.index.count().await.unwrap();
        if count > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(count, 1);
    let synced =
        std::fs::read_to_string(t.state.paths.data_dir.join("google_chat_sync.txt")).unwrap();
    assert!(synced.contains("PHÒNG: spaces/NHTC"));
}

#[tokio::test]
async fn webhook_accepts_empty_body() {
    let t = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/google-chat/webhook")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&t.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["text"].is_string());
}

#[tokio::test]
async fn source_files_upload_list_delete_and_rebuild() {
    let t = test_app().await;

    let boundary = "nhtc-boundary";
    let multipart = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"quy_dinh.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         QUY ĐỊNH: Giờ làm việc từ 8h đến 17h.\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/admin/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart))
        .unwrap();
    let (status, body) = send_json(&t.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "quy_dinh.txt");

    let (status, files) = send_json(&t.app, get("/admin/files", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(files[0]["name"], "quy_dinh.txt");
    assert!(files[0]["size"].as_u64().unwrap() > 0);

    let (status, body) = send_json(
        &t.app,
        json_request("POST", "/admin/rebuild-rag", json!({}), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rebuilt");
    assert_eq!(body["documents"], 1);

    let delete = |name: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/admin/files/{name}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
            .body(Body::empty())
            .unwrap()
    };
    let (status, body) = send_json(&t.app, delete("quy_dinh.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");

    let (status, _) = send_json(&t.app, delete("quy_dinh.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&t.app, delete("..%2Fsecrets.yaml")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
