//! Integration tests for ProgLearn.
//!
//! The tests run the real backend client, admin services and HTTP apps
//! against [`MockBackend`], an in-process stand-in for the hosted backend
//! that speaks the same table, procedure and auth endpoints. Nothing outside
//! the test process is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p proglearn-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use chrono::Utc;
use proglearn_admin::config::AdminConfig;
use proglearn_backend::{BackendClient, BackendConfig};
use proglearn_core::{CategoryId, LessonId, LessonStatus};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Email of the account the mock signs in.
pub const ADMIN_EMAIL: &str = "ada@proglearn.dev";
/// The only password the mock accepts.
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
/// Auth user id of that account.
pub const ADMIN_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
/// Access token issued on sign-in.
pub const ACCESS_TOKEN: &str = "access-token-ada";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// How the view counter procedure behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewCounter {
    /// The procedure exists and counts the view.
    #[default]
    Available,
    /// The procedure was never deployed (`PGRST202`).
    Missing,
    /// Anonymous callers may not run it.
    Denied,
}

/// A request as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub bearer: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    /// Whether this request changed table data.
    #[must_use]
    pub fn is_write(&self) -> bool {
        self.path.starts_with("/rest/v1/")
            && !self.path.starts_with("/rest/v1/rpc/")
            && self.method != Method::GET
    }

    /// Top-level keys of the JSON body, sorted.
    #[must_use]
    pub fn body_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .body
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[derive(Default)]
struct MockState {
    lessons: Mutex<Vec<Value>>,
    categories: Mutex<Vec<Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    next_id: AtomicI64,
    deny_writes: AtomicBool,
    member_only: AtomicBool,
    view_counter: Mutex<ViewCounter>,
    write_delay_ms: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockState {
    fn record(&self, method: &Method, path: &str, query: &HashMap<String, String>, headers: &HeaderMap, body: &Bytes) {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.clone(),
            path: path.to_string(),
            query: query.clone(),
            bearer,
            body: serde_json::from_slice(body).unwrap_or(Value::Null),
        });
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run a table write, honouring the denial switch and the write delay.
    async fn write(&self, apply: impl FnOnce(&Self) -> Response + Send) -> Response {
        if self.deny_writes.load(Ordering::SeqCst) {
            return denied(StatusCode::FORBIDDEN);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let response = apply(self);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// In-process backend serving the table, procedure and auth endpoints.
pub struct MockBackend {
    url: String,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start the mock on an ephemeral local port.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(logout))
            .route("/auth/v1/user", get(user))
            .route("/rest/v1/profiles", get(profiles))
            .route("/rest/v1/lessons", any(lessons))
            .route("/rest/v1/categories", any(categories))
            .route("/rest/v1/rpc/increment_lesson_views", post(increment_views))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{addr}"),
            state,
            server,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Backend configuration pointing at this mock.
    #[must_use]
    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            url: self.url.parse().unwrap(),
            anon_key: SecretString::from("anon-key"),
            media_bucket: "lesson-media".to_string(),
        }
    }

    /// Anonymous client, as the storefront uses.
    #[must_use]
    pub fn client(&self) -> BackendClient {
        BackendClient::new(&self.config()).unwrap()
    }

    /// Client acting as the signed-in admin.
    #[must_use]
    pub fn admin_client(&self) -> BackendClient {
        self.client().authorized(SecretString::from(ACCESS_TOKEN))
    }

    /// Insert a lesson row directly.
    pub fn seed_lesson(&self, title: &str, status: LessonStatus, views: u64) -> LessonId {
        let id = self.state.next_id();
        self.state.lessons.lock().unwrap().push(json!({
            "id": id,
            "title": title,
            "content": format!("# {title}\n\nSome words about {title}."),
            "featured_image": null,
            "status": status.as_str(),
            "category_id": null,
            "views_count": views,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": null,
            "excerpt": null,
            "meta_description": null,
            "code_snippets": [],
        }));
        LessonId::new(id)
    }

    /// Insert a category row directly.
    pub fn seed_category(&self, name: &str) -> CategoryId {
        let id = self.state.next_id();
        self.state.categories.lock().unwrap().push(json!({
            "id": id,
            "name": name,
            "difficulty": "beginner",
        }));
        CategoryId::new(id)
    }

    /// The stored row of a lesson.
    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<Value> {
        self.state
            .lessons
            .lock()
            .unwrap()
            .iter()
            .find(|row| row_id(row) == Some(id.as_i64()))
            .cloned()
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.state.lessons.lock().unwrap().len()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Table writes received so far.
    #[must_use]
    pub fn writes(&self) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(RecordedRequest::is_write).collect()
    }

    /// Refuse every table write with a row-level security error.
    pub fn deny_writes(&self, deny: bool) {
        self.state.deny_writes.store(deny, Ordering::SeqCst);
    }

    /// Give the signed-in account the member role instead of admin.
    pub fn member_only(&self, member: bool) {
        self.state.member_only.store(member, Ordering::SeqCst);
    }

    pub fn set_view_counter(&self, behaviour: ViewCounter) {
        *self.state.view_counter.lock().unwrap() = behaviour;
    }

    /// Hold every table write for `delay` before applying it.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Most table writes ever in flight at once.
    #[must_use]
    pub fn max_concurrent_writes(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A running admin panel.
pub struct AdminServer {
    pub url: String,
    server: JoinHandle<()>,
}

impl AdminServer {
    /// Serve the admin app against `backend` on an ephemeral port.
    pub async fn start(backend: &MockBackend) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = AdminConfig {
            backend: backend.config(),
            host: addr.ip(),
            port: addr.port(),
            base_url: format!("http://{addr}"),
            autosave_interval: Duration::from_secs(30),
            max_upload_bytes: 1024 * 1024,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            json_logs: false,
        };
        let state = proglearn_admin::state::AppState::new(config).unwrap();
        let app = proglearn_admin::app(state);
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{addr}"),
            server,
        }
    }

    /// Absolute URL of `path` on this server.
    #[must_use]
    pub fn at(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// A cookie-keeping HTTP client signed in as the admin.
    pub async fn signed_in_client(&self) -> reqwest::Client {
        let client = browser();
        let response = client
            .post(self.at("/auth/login"))
            .form(&[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.url().path(), "/", "login should land on the dashboard");
        client
    }
}

impl Drop for AdminServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// An HTTP client that keeps cookies and follows redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().unwrap()
}

// =============================================================================
// Handlers
// =============================================================================

fn denied(status: StatusCode) -> Response {
    (
        status,
        Json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy",
            "details": null,
            "hint": null,
        })),
    )
        .into_response()
}

fn no_rows() -> Response {
    (
        StatusCode::NOT_ACCEPTABLE,
        Json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned",
        })),
    )
        .into_response()
}

fn row_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// The id in an `id=eq.N` filter.
fn id_filter(query: &HashMap<String, String>) -> Option<i64> {
    query.get("id")?.strip_prefix("eq.")?.parse().ok()
}

fn matches_filters(row: &Value, query: &HashMap<String, String>) -> bool {
    if let Some(id) = id_filter(query) {
        if row_id(row) != Some(id) {
            return false;
        }
    }
    if let Some(status) = query.get("status").and_then(|s| s.strip_prefix("eq.")) {
        if row.get("status").and_then(Value::as_str) != Some(status) {
            return false;
        }
    }
    true
}

fn wants_single(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == SINGLE_OBJECT)
}

/// Answer with one object or an array, the way the table API does.
fn rows_response(status: StatusCode, headers: &HeaderMap, rows: Vec<Value>) -> Response {
    if !wants_single(headers) {
        return (status, Json(Value::Array(rows))).into_response();
    }
    match <[Value; 1]>::try_from(rows) {
        Ok([row]) => (status, Json(row)).into_response(),
        Err(_) => no_rows(),
    }
}

fn token_body() -> Value {
    json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-token-ada",
        "user": { "id": ADMIN_ID, "email": ADMIN_EMAIL },
    })
}

async fn token(
    State(mock): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.record(&Method::POST, "/auth/v1/token", &query, &headers, &body);
    let grant: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let accepted = match query.get("grant_type").map(String::as_str) {
        Some("password") => {
            grant["email"] == ADMIN_EMAIL && grant["password"] == ADMIN_PASSWORD
        }
        Some("refresh_token") => grant["refresh_token"].as_str().is_some(),
        _ => false,
    };

    if accepted {
        Json(token_body()).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials",
            })),
        )
            .into_response()
    }
}

async fn logout(State(mock): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> StatusCode {
    mock.record(&Method::POST, "/auth/v1/logout", &HashMap::new(), &headers, &body);
    StatusCode::NO_CONTENT
}

async fn user() -> Json<Value> {
    Json(json!({ "id": ADMIN_ID, "email": ADMIN_EMAIL }))
}

async fn profiles(
    State(mock): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let role = if mock.member_only.load(Ordering::SeqCst) {
        "member"
    } else {
        "admin"
    };
    let profile = json!({ "id": ADMIN_ID, "name": "Ada Lovelace", "role": role });
    let wanted = query.get("id").and_then(|f| f.strip_prefix("eq."));
    let rows = if wanted == Some(ADMIN_ID) {
        vec![profile]
    } else {
        Vec::new()
    };
    rows_response(StatusCode::OK, &headers, rows)
}

async fn lessons(
    State(mock): State<Arc<MockState>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.record(&method, "/rest/v1/lessons", &query, &headers, &body);
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match method {
        Method::GET => {
            let rows = mock
                .lessons
                .lock()
                .unwrap()
                .iter()
                .filter(|row| matches_filters(row, &query))
                .cloned()
                .collect();
            rows_response(StatusCode::OK, &headers, rows)
        }
        Method::POST => {
            mock.write(|mock| {
                let mut row = json!({
                    "id": mock.next_id(),
                    "views_count": 0,
                    "created_at": Utc::now().to_rfc3339(),
                    "updated_at": null,
                });
                if let (Some(row), Some(fields)) = (row.as_object_mut(), payload.as_object()) {
                    for (key, value) in fields {
                        row.insert(key.clone(), value.clone());
                    }
                }
                mock.lessons.lock().unwrap().push(row.clone());
                rows_response(StatusCode::CREATED, &headers, vec![row])
            })
            .await
        }
        Method::PATCH => {
            mock.write(|mock| {
                let mut lessons = mock.lessons.lock().unwrap();
                let updated: Vec<Value> = lessons
                    .iter_mut()
                    .filter(|row| matches_filters(row, &query))
                    .map(|row| {
                        if let (Some(row), Some(fields)) = (row.as_object_mut(), payload.as_object()) {
                            for (key, value) in fields {
                                row.insert(key.clone(), value.clone());
                            }
                        }
                        row.clone()
                    })
                    .collect();
                rows_response(StatusCode::OK, &headers, updated)
            })
            .await
        }
        Method::DELETE => {
            mock.write(|mock| {
                mock.lessons
                    .lock()
                    .unwrap()
                    .retain(|row| !matches_filters(row, &query));
                StatusCode::NO_CONTENT.into_response()
            })
            .await
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn categories(
    State(mock): State<Arc<MockState>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.record(&method, "/rest/v1/categories", &query, &headers, &body);
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match method {
        Method::GET => {
            let rows = mock
                .categories
                .lock()
                .unwrap()
                .iter()
                .filter(|row| matches_filters(row, &query))
                .cloned()
                .collect();
            rows_response(StatusCode::OK, &headers, rows)
        }
        Method::POST => {
            mock.write(|mock| {
                let row = json!({
                    "id": mock.next_id(),
                    "name": payload["name"],
                    "difficulty": payload["difficulty"],
                });
                mock.categories.lock().unwrap().push(row.clone());
                rows_response(StatusCode::CREATED, &headers, vec![row])
            })
            .await
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn increment_views(
    State(mock): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.record(
        &Method::POST,
        "/rest/v1/rpc/increment_lesson_views",
        &HashMap::new(),
        &headers,
        &body,
    );
    let behaviour = *mock.view_counter.lock().unwrap();
    match behaviour {
        ViewCounter::Missing => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "code": "PGRST202",
                "message": "Could not find the function public.increment_lesson_views(lesson_id) in the schema cache",
            })),
        )
            .into_response(),
        ViewCounter::Denied => denied(StatusCode::UNAUTHORIZED),
        ViewCounter::Available => {
            let args: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let id = args["lesson_id"].as_i64();
            let mut lessons = mock.lessons.lock().unwrap();
            if let Some(row) = lessons.iter_mut().find(|row| id.is_some() && row_id(row) == id) {
                let views = row["views_count"].as_u64().unwrap_or(0);
                row["views_count"] = json!(views + 1);
            }
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
