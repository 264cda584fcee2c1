//! In-process mock of the EventDesk backend.
//!
//! Each test starts its own server on an ephemeral port. The backend accepts
//! exactly one access token and one refresh token at a time; tests rotate or
//! revoke them to drive the client through its refresh paths.

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use eventdesk_client::{ApiClient, CredentialStore, Credentials, MemoryCredentialStore, RuntimeConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::fixtures;

pub const PASSWORD: &str = "correct-horse";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    access: Mutex<String>,
    refresh: Mutex<Option<String>>,
    issued: AtomicUsize,
    refresh_calls: AtomicUsize,
    reject_all: AtomicBool,
    notifications_down: AtomicBool,
    requests: Mutex<Vec<RecordedRequest>>,
    upload_fields: Mutex<Vec<(String, Option<String>)>>,
    logout_bodies: Mutex<Vec<Value>>,
}

impl BackendState {
    fn issue_access(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("access-{}", n);
        *self.access.lock().unwrap() = token.clone();
        token
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        if self.reject_all.load(Ordering::SeqCst) {
            return false;
        }
        let expected = format!("Bearer {}", self.access.lock().unwrap());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })),
    )
        .into_response()
}

macro_rules! require_auth {
    ($state:expr, $headers:expr) => {
        if !$state.authorized(&$headers) {
            return unauthorized();
        }
    };
}

pub struct MockBackend {
    pub state: Arc<BackendState>,
    pub base_url: String,
}

impl MockBackend {
    pub async fn start() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let state = Arc::new(BackendState::default());
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend crashed");
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn config(&self) -> RuntimeConfig {
        RuntimeConfig::new(&self.base_url)
    }

    /// Client with an empty in-memory store.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config(), Arc::new(MemoryCredentialStore::new()))
    }

    pub fn client_with_store(&self, store: Arc<dyn CredentialStore>) -> ApiClient {
        ApiClient::new(self.config(), store)
    }

    /// Client holding credentials the backend currently accepts.
    pub fn logged_in_client(&self) -> ApiClient {
        let access = self.state.issue_access();
        *self.state.refresh.lock().unwrap() = Some("refresh-1".to_string());
        let store = MemoryCredentialStore::with_credentials(Credentials::new(
            access,
            "refresh-1".to_string(),
            fixtures::user(1, "admin"),
        ));
        self.client_with_store(Arc::new(store))
    }

    /// Invalidate the current access token; the refresh token stays valid.
    pub fn expire_access_token(&self) {
        self.state.issue_access();
    }

    /// Invalidate the refresh token too.
    pub fn revoke_refresh_token(&self) {
        *self.state.refresh.lock().unwrap() = None;
        self.state.issue_access();
    }

    /// Answer 401 to every authenticated request, even with a fresh token.
    pub fn reject_all_tokens(&self) {
        self.state.reject_all.store(true, Ordering::SeqCst);
    }

    pub fn take_notifications_down(&self) {
        self.state.notifications_down.store(true, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn upload_fields(&self) -> Vec<(String, Option<String>)> {
        self.state.upload_fields.lock().unwrap().clone()
    }

    pub fn logout_bodies(&self) -> Vec<Value> {
        self.state.logout_bodies.lock().unwrap().clone()
    }
}

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/api/v1/login/", post(login))
        .route("/api/v1/token/refresh/", post(refresh))
        .route("/api/v1/users/me/", get(profile).put(update_profile))
        .route("/api/v1/users/logout/", post(logout))
        .route("/api/v1/events/", get(events))
        .route("/api/v1/events/participating/", get(participating))
        .route("/api/v1/events/:id/", get(event_detail))
        .route("/api/v1/events/:id/join/", post(join_event))
        .route("/api/v1/events/:id/upcoming_sessions/", get(upcoming_sessions))
        .route("/api/v1/online-sessions/:id/join/", post(join_session))
        .route("/api/v1/online-sessions/:id/attendances/", get(session_attendances))
        .route("/api/v1/online-sessions/:id/materials/", get(session_materials))
        .route("/api/v1/event-participants/", get(participants))
        .route("/api/v1/event-participants/:id/", patch(update_participation))
        .route("/api/v1/files/files/", get(files))
        .route("/api/v1/files/files/upload/", post(upload))
        .route("/api/v1/files/files/:id/create_share_link/", post(create_share_link))
        .route("/api/v1/files/files/:id/download/", post(download))
        .route("/api/v1/user/notifications/", get(notifications))
        .route("/api/v1/user/notifications/unread_count/", get(unread_count))
        .route("/api/v1/user/notifications/mark_all_as_read/", post(mark_all_as_read))
        .route("/api/v1/user/notifications/delete_all_read/", delete(delete_all_read))
        .route("/api/v1/user/notifications/:id/mark_as_read/", post(mark_as_read))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<Arc<BackendState>>, request: Request, next: Next) -> Response {
    // Nothing borrowing the request may live across the await below.
    let recorded = {
        let header = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(String::from),
            authorization: header(header::AUTHORIZATION),
            content_type: header(header::CONTENT_TYPE),
        }
    };
    state.requests.lock().unwrap().push(recorded);
    next.run(request).await
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response();
    }

    let access = state.issue_access();
    *state.refresh.lock().unwrap() = Some("refresh-1".to_string());
    Json(json!({
        "access": access,
        "refresh": "refresh-1",
        "user": fixtures::user_json(7, "student"),
    }))
    .into_response()
}

async fn refresh(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let valid = state.refresh.lock().unwrap().clone();
    match (valid, body["refresh"].as_str()) {
        (Some(valid), Some(sent)) if valid == sent => {
            Json(json!({ "access": state.issue_access() })).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
        )
            .into_response(),
    }
}

async fn profile(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    require_auth!(state, headers);
    Json(fixtures::user_json(7, "student")).into_response()
}

async fn update_profile(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    require_auth!(state, headers);
    let mut user = fixtures::user_json(7, "student");
    if let Some(first_name) = body.get("first_name") {
        user["first_name"] = first_name.clone();
        user["full_name"] = first_name.clone();
    }
    Json(user).into_response()
}

async fn logout(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    require_auth!(state, headers);
    state.logout_bodies.lock().unwrap().push(body);
    StatusCode::RESET_CONTENT.into_response()
}

async fn events(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    require_auth!(state, headers);
    if query.contains_key("owner") {
        return Json(fixtures::page_of_count(3)).into_response();
    }
    Json(json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [
            fixtures::event_json(1, "Hackathon"),
            fixtures::event_json(2, "Olympiad"),
        ]
    }))
    .into_response()
}

/// Two DRF pages of one event each, linked through an absolute `next`.
async fn participating(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    require_auth!(state, headers);
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let base = format!("http://{}/api/v1/events/participating/", host);

    let page = match query.get("page").map(String::as_str) {
        Some("2") => json!({
            "count": 2,
            "next": null,
            "previous": base,
            "results": [fixtures::event_json(2, "Olympiad")],
        }),
        _ => json!({
            "count": 2,
            "next": format!("{}?page=2", base),
            "previous": null,
            "results": [fixtures::event_json(1, "Hackathon")],
        }),
    };
    Json(page).into_response()
}

async fn event_detail(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    let mut event = fixtures::event_json(id, "Hackathon");
    event["files"] = json!([
        fixtures::event_file_json(11, "agenda.pdf"),
        fixtures::event_file_json(12, "venue.png"),
    ]);
    Json(event).into_response()
}

async fn join_event(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    Json(json!({ "message": format!("Registered for event {}", id) })).into_response()
}

async fn upcoming_sessions(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    Json(json!({
        "online_sessions": [{
            "id": 21, "event_id": id, "session_name": "Stream",
            "start_time": "2030-06-02T10:00:00Z", "status": "scheduled"
        }],
        "offline_sessions": [{
            "id": 22, "event_id": id, "session_name": "Workshop",
            "start_time": "2030-06-01T10:00:00Z", "status": "scheduled", "room": "204"
        }],
        "total_upcoming": 2
    }))
    .into_response()
}

async fn join_session(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 31,
            "session": { "id": id, "session_name": "Stream" },
            "participant": { "id": 1, "email": "user1@example.com" },
            "status": "registered",
            "duration_seconds": null,
            "is_active": true
        })),
    )
        .into_response()
}

async fn session_attendances(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    Json(json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [
            { "id": 31, "status": "joined", "participant": { "id": 1, "full_name": "Ada Lovelace" }, "is_active": true },
            { "id": 32, "status": "no_show", "participant": { "id": 2 } },
        ],
    }))
    .into_response()
}

async fn session_materials(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    Json(json!([
        { "id": 41, "title": "Slides", "material_type": "presentation", "file": "/media/slides.pdf" },
        { "id": 42, "title": "Recording", "material_type": "link", "file_url": "https://video.example.org/r" }
    ]))
    .into_response()
}

async fn update_participation(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    require_auth!(state, headers);
    Json(json!({
        "id": id,
        "role": "participant",
        "is_confirmed": body["is_confirmed"].as_bool().unwrap_or(false),
    }))
    .into_response()
}

async fn participants(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    require_auth!(state, headers);
    let count = match query.get("is_confirmed").map(String::as_str) {
        Some("true") => 2,
        _ => 5,
    };
    Json(fixtures::page_of_count(count)).into_response()
}

/// Bare array: pagination disabled for this view.
async fn files(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    require_auth!(state, headers);
    Json(json!([
        fixtures::file_json(1, "a.pdf"),
        fixtures::file_json(2, "b.png"),
        fixtures::file_json(3, "c.zip"),
    ]))
    .into_response()
}

async fn upload(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    require_auth!(state, headers);

    let mut fields = Vec::new();
    let mut file_name = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(f) = field.file_name() {
            file_name = Some(f.to_string());
            fields.push((name, None));
        } else {
            let value = field.text().await.unwrap_or_default();
            fields.push((name, Some(value)));
        }
    }
    *state.upload_fields.lock().unwrap() = fields;

    (
        StatusCode::CREATED,
        Json(fixtures::file_json(42, file_name.as_deref().unwrap_or("upload"))),
    )
        .into_response()
}

async fn create_share_link(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    require_auth!(state, headers);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 51,
            "token": format!("share-{}", id),
            "max_downloads": body.get("max_downloads").cloned().unwrap_or(Value::Null),
            "download_count": 0,
            "is_active": true,
        })),
    )
        .into_response()
}

async fn download(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    (
        [(header::CONTENT_TYPE, "application/pdf")],
        b"%PDF-1.4 agenda".to_vec(),
    )
        .into_response()
}

async fn mark_as_read(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    require_auth!(state, headers);
    Json(json!({ "status": "marked as read" })).into_response()
}

async fn delete_all_read(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    require_auth!(state, headers);
    Json(json!({ "deleted_count": 1 })).into_response()
}

async fn notifications(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    require_auth!(state, headers);
    if state.notifications_down.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    Json(json!([
        { "id": 1, "title": "Welcome", "text": "Hello", "is_read": false },
        { "id": 2, "title": "Reminder", "text": "Tomorrow", "is_read": true },
    ]))
    .into_response()
}

async fn unread_count(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    require_auth!(state, headers);
    if state.notifications_down.load(Ordering::SeqCst) {
        return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
    }
    Json(json!({ "count": 1 })).into_response()
}

async fn mark_all_as_read(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    require_auth!(state, headers);
    if state.notifications_down.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    Json(json!({ "marked_count": 1 })).into_response()
}
