//! Fake backend and client wiring shared by the integration tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use easytp::app::state::AppState;
use easytp::apps::model::PollCadence;
use easytp::http::client::{HttpClient, RetryPolicy};
use easytp::storage::kv::{KeyValueStore, MemoryKvStore};
use easytp::utils::CooldownOptions;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "correct-horse";

/// Everything the fake backend records or can be told to do
#[derive(Default)]
pub struct Backend {
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
    pub rotate_refresh: bool,
    pub reject_refresh: bool,
    pub refresh_delay: Option<Duration>,
    pub reject_apps: bool,
    pub apps_failures: u32,
    pub apps_calls: u32,
    pub apps: Value,
    pub logout_calls: u32,
    pub logout_delay: Option<Duration>,
    pub started: Vec<String>,
    pub stopped: Vec<String>,
    pub list_calls: HashMap<String, u32>,
    pub uploads: Vec<(String, String)>,
    pub deleted: Vec<String>,
    pub stats_calls: u32,
    pub stats_query: Option<HashMap<String, String>>,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct FakeServer {
    pub base_url: String,
    pub backend: Shared,
}

impl FakeServer {
    pub async fn start() -> Self {
        let backend = Arc::new(Mutex::new(Backend {
            role: "STUDENT".to_string(),
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            apps: json!({
                "vscode": { "status": "stopped", "deployment_status": false },
                "firefox": { "status": "running", "deployment_status": true, "ready": true, "is_deployed": true }
            }),
            ..Backend::default()
        }));

        let app = Router::new()
            .route("/auth/login/", post(login))
            .route("/auth/continue-as-guest/", post(guest))
            .route("/auth/refresh/", post(refresh))
            .route("/auth/logout/", post(logout))
            .route("/apps/", get(apps))
            .route("/start/{name}/", post(start))
            .route("/stop/{name}/", post(stop))
            .route("/files/", get(list_root).post(upload_root))
            .route("/files/{path}/", get(list).post(upload).delete(delete))
            .route("/download/{path}/", get(download))
            .route("/usage_statistics/", get(usage_statistics))
            .with_state(backend.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            backend,
        }
    }

    pub fn backend(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.backend.lock().unwrap()
    }

    pub fn client(&self) -> Arc<HttpClient> {
        let fast = CooldownOptions {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        };
        let client = HttpClient::new(&self.base_url, Duration::from_secs(5))
            .unwrap()
            .with_retry_policies(
                RetryPolicy {
                    max_retries: 3,
                    backoff: fast.clone(),
                },
                RetryPolicy {
                    max_retries: 2,
                    backoff: fast,
                },
            );
        Arc::new(client)
    }

    pub fn state_with(&self, storage: Arc<dyn KeyValueStore>) -> AppState {
        AppState::with_storage(
            self.client(),
            storage,
            PollCadence {
                fast: Duration::from_millis(20),
                slow: Duration::from_millis(200),
            },
            Duration::from_secs(300),
        )
    }

    /// A signed-in state polling at the shipped 400 ms / 15 s cadence
    pub async fn signed_in_default_cadence(&self) -> AppState {
        let state = AppState::with_storage(
            self.client(),
            Arc::new(MemoryKvStore::new()),
            PollCadence::default(),
            Duration::from_secs(300),
        );
        state
            .session
            .login(USERNAME, &secrecy::SecretString::from(PASSWORD))
            .await
            .unwrap();
        state
    }

    pub fn state(&self) -> AppState {
        self.state_with(Arc::new(MemoryKvStore::new()))
    }

    /// A state whose session is already signed in
    pub async fn signed_in(&self) -> AppState {
        let state = self.state();
        state
            .session
            .login(USERNAME, &secrecy::SecretString::from(PASSWORD))
            .await
            .unwrap();
        state
    }
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn authorized(backend: &Backend, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", backend.access_token);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn user_json(backend: &Backend, username: &str) -> Value {
    json!({
        "id": 7,
        "username": username,
        "email": format!("{}@example.test", username),
        "role": backend.role,
        "apps_available": "vscode,firefox"
    })
}

async fn login(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let backend = backend.lock().unwrap();
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        Json(json!({
            "access": backend.access_token,
            "refresh": backend.refresh_token,
            "user": user_json(&backend, USERNAME)
        }))
        .into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn guest(State(backend): State<Shared>) -> Response {
    let backend = backend.lock().unwrap();
    let mut user = user_json(&backend, "guest-42");
    user["role"] = json!("G");
    Json(json!({
        "access": backend.access_token,
        "refresh": backend.refresh_token,
        "user": user
    }))
    .into_response()
}

async fn refresh(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let delay = backend.lock().unwrap().refresh_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let mut backend = backend.lock().unwrap();
    if backend.reject_refresh || body["refresh"] != backend.refresh_token.as_str() {
        return error(StatusCode::UNAUTHORIZED, "Token is invalid or expired");
    }
    backend.access_token = format!("{}-next", backend.access_token);
    if backend.rotate_refresh {
        backend.refresh_token = format!("{}-next", backend.refresh_token);
        Json(json!({ "access": backend.access_token, "refresh": backend.refresh_token }))
            .into_response()
    } else {
        Json(json!({ "access": backend.access_token })).into_response()
    }
}

async fn logout(State(backend): State<Shared>) -> Response {
    let delay = {
        let mut backend = backend.lock().unwrap();
        backend.logout_calls += 1;
        backend.logout_delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn apps(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = backend.lock().unwrap();
    backend.apps_calls += 1;
    if backend.reject_apps || !authorized(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Authentication credentials were not provided.");
    }
    if backend.apps_failures > 0 {
        backend.apps_failures -= 1;
        return error(StatusCode::SERVICE_UNAVAILABLE, "Try again");
    }
    Json(json!({ "apps": backend.apps })).into_response()
}

async fn start(
    State(backend): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut backend = backend.lock().unwrap();
    if !authorized(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    backend.started.push(name);
    Json(json!({
        "status": "starting",
        "message": "Creating deployment",
        "stages": { "deployment": "creating", "pod": "pending", "service": "pending", "ingress": "pending" }
    }))
    .into_response()
}

async fn stop(
    State(backend): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut backend = backend.lock().unwrap();
    if !authorized(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    backend.stopped.push(name);
    Json(json!({ "status": "stopping" })).into_response()
}

fn listing_json(path: &str) -> Value {
    let current_path = if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", path)
    };
    json!({
        "current_path": current_path,
        "parent_path_encoded": null,
        "files": [
            { "name": "notes.txt", "path": "bm90ZXMudHh0", "is_dir": false, "size": 12 }
        ],
        "directories": [],
        "is_readonly": false,
        "storage_usage": { "current_mb": 1.5, "limit_mb": 100.0, "percentage": 1.5 },
        "permissions": { "can_upload": true, "can_delete": true, "can_download": true }
    })
}

fn record_list(backend: &Shared, path: &str) -> Response {
    let mut backend = backend.lock().unwrap();
    *backend.list_calls.entry(path.to_string()).or_default() += 1;
    Json(listing_json(path)).into_response()
}

async fn list_root(State(backend): State<Shared>) -> Response {
    record_list(&backend, "")
}

async fn list(State(backend): State<Shared>, Path(path): Path<String>) -> Response {
    record_list(&backend, &path)
}

fn record_upload(backend: &Shared, path: &str, headers: &HeaderMap, body: &Bytes) -> Response {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/form-data") {
        return error(StatusCode::BAD_REQUEST, "Expected multipart");
    }
    let body = String::from_utf8_lossy(body).to_string();
    backend
        .lock()
        .unwrap()
        .uploads
        .push((path.to_string(), body));
    Json(json!({ "message": "File uploaded" })).into_response()
}

async fn upload_root(State(backend): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    record_upload(&backend, "", &headers, &body)
}

async fn upload(
    State(backend): State<Shared>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_upload(&backend, &path, &headers, &body)
}

async fn delete(State(backend): State<Shared>, Path(path): Path<String>) -> Response {
    backend.lock().unwrap().deleted.push(path);
    StatusCode::NO_CONTENT.into_response()
}

async fn download(Path(path): Path<String>) -> Response {
    (StatusCode::OK, format!("contents of {}", path)).into_response()
}

async fn usage_statistics(
    State(backend): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut backend = backend.lock().unwrap();
    backend.stats_calls += 1;
    backend.stats_query = Some(query);
    Json(json!({
        "stats": { "total_activities": 3, "today_activities": 1, "week_activities": 2, "unique_users": 2 },
        "activities": [
            {
                "id": 1,
                "user_username": "alice",
                "activity_type": "pod_start",
                "activity_display": "Pod Started",
                "timestamp": "2024-03-02T10:00:00Z",
                "details": { "app_name": "vscode" }
            }
        ],
        "pagination": {
            "count": 1, "num_pages": 1, "current_page": 1,
            "has_next": false, "has_previous": false
        },
        "filters": {}
    }))
    .into_response()
}
