// 🌐 Web presentation layer - REST API + styled single page (Axum)
//
// The comment store is injected through `AppState`; each browser session gets
// its own HistoryLog keyed by a `session_id` cookie. Sessions end after
// SESSION_TTL_MINUTES without a request, and at most MAX_SESSIONS are kept.

use crate::comments::CommentStore;
use crate::conversion::{ConversionEngine, ConversionRecord, ConversionRequest};
use crate::error::{CommentError, ConversionError};
use crate::history::HistoryLog;
use crate::units::{Category, UnitTable};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use uuid::Uuid;

const SESSION_COOKIE: &str = "session_id";

/// Idle time after which a session and its history are dropped
pub const SESSION_TTL_MINUTES: i64 = 30;

/// Upper bound on live sessions; the least recently seen goes first
pub const MAX_SESSIONS: usize = 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    comments: Arc<Mutex<CommentStore>>,
    sessions: Arc<Mutex<SessionRegistry>>,
}

impl AppState {
    pub fn new(comments: CommentStore) -> Self {
        Self::with_sessions(
            comments,
            SessionRegistry::new(Duration::minutes(SESSION_TTL_MINUTES), MAX_SESSIONS),
        )
    }

    pub fn with_sessions(comments: CommentStore, sessions: SessionRegistry) -> Self {
        Self {
            comments: Arc::new(Mutex::new(comments)),
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }
}

/// The server is the only writer; a poisoned lock still holds consistent data
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Responses
// ============================================================================

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

/// Errors of a single request, mapped onto HTTP status codes
pub enum ApiError {
    Conversion(ConversionError),
    Comment(CommentError),

    /// Request body that does not deserialize into the expected shape
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        ApiError::Conversion(err)
    }
}

impl From<CommentError> for ApiError {
    fn from(err: CommentError) -> Self {
        ApiError::Comment(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Conversion(err) => {
                let status = match err {
                    ConversionError::UnknownCategory(_) | ConversionError::UnknownUnit { .. } => {
                        StatusCode::NOT_FOUND
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            ApiError::Comment(err) => {
                let status = match err {
                    CommentError::Validation { .. } => StatusCode::BAD_REQUEST,
                    CommentError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
                    CommentError::CorruptState { .. }
                    | CommentError::Encode { .. }
                    | CommentError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        if status.is_server_error() {
            error!("{}", message);
        } else {
            warn!("{}", message);
        }

        (status, Json(ApiResponse::err(message))).into_response()
    }
}

#[derive(Serialize)]
struct CategoryResponse {
    name: &'static str,
    label: String,
    icon: &'static str,
    units: Vec<&'static str>,
    base_unit: Option<&'static str>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            name: category.name(),
            label: category.label(),
            icon: category.icon(),
            units: category.unit_names(),
            base_unit: UnitTable::base_unit(category).map(|u| u.name),
        }
    }
}

#[derive(Serialize)]
struct ConvertResponse {
    record: ConversionRecord,
    history: Vec<String>,
}

#[derive(Serialize)]
struct CommentsResponse {
    comments: Vec<String>,
}

#[derive(Deserialize)]
struct NewComment {
    #[serde(default)]
    name: String,
    #[serde(default)]
    text: String,
}

// ============================================================================
// Sessions
// ============================================================================

struct Session {
    id: Uuid,
    is_new: bool,
}

impl Session {
    fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value).ok());

        match existing {
            Some(id) => Session { id, is_new: false },
            None => Session {
                id: Uuid::new_v4(),
                is_new: true,
            },
        }
    }

    /// Attach the cookie for sessions created by this request
    fn attach(&self, mut response: Response) -> Response {
        if self.is_new {
            let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        response
    }
}

struct SessionEntry {
    history: HistoryLog,
    last_seen: DateTime<Utc>,
}

/// Per-session history logs with idle expiry and a size bound
pub struct SessionRegistry {
    entries: HashMap<Uuid, SessionEntry>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.last_seen) >= self.ttl
    }

    /// The session's log, created if the session is new or has expired.
    ///
    /// Creating a session first sweeps expired ones, then evicts the least
    /// recently seen until there is room.
    pub fn touch(&mut self, id: Uuid, now: DateTime<Utc>) -> &mut HistoryLog {
        let live = self
            .entries
            .get(&id)
            .map(|entry| !self.is_expired(entry, now))
            .unwrap_or(false);

        if !live {
            self.entries.remove(&id);
            self.sweep(now);
            while self.entries.len() >= self.max_sessions {
                self.evict_least_recent();
            }
        }

        let entry = self.entries.entry(id).or_insert_with(|| SessionEntry {
            history: HistoryLog::new(),
            last_seen: now,
        });
        entry.last_seen = now;
        &mut entry.history
    }

    /// Rendered history of a live session, refreshing its last-seen time
    pub fn history(&mut self, id: Uuid, now: DateTime<Utc>) -> Vec<String> {
        let expired = match self.entries.get(&id) {
            Some(entry) => self.is_expired(entry, now),
            None => return Vec::new(),
        };
        if expired {
            self.entries.remove(&id);
            return Vec::new();
        }

        self.touch(id, now).render()
    }

    /// Drop every session idle for longer than the TTL
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.signed_duration_since(entry.last_seen) < ttl);

        let dropped = before - self.entries.len();
        if dropped > 0 {
            info!(dropped, live = self.entries.len(), "expired sessions dropped");
        }
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(id, _)| *id);

        if let Some(id) = oldest {
            self.entries.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/categories - All categories with their units
async fn list_categories() -> impl IntoResponse {
    let categories: Vec<CategoryResponse> = UnitTable::categories()
        .iter()
        .map(|c| (*c).into())
        .collect();

    Json(ApiResponse::ok(categories))
}

/// GET /api/categories/:name - One category
async fn get_category(Path(name): Path<String>) -> Result<impl IntoResponse, ApiError> {
    // `Path` has already percent-decoded the segment
    let category = Category::parse(&name)?;
    Ok(Json(ApiResponse::ok(CategoryResponse::from(category))))
}

/// POST /api/convert - Convert and record in the session's history
async fn convert(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let session = Session::from_headers(&headers);
    let Json(request) = payload?;
    let record = ConversionEngine::run(&request)?;

    let history = {
        let mut sessions = lock(&state.sessions);
        let log = sessions.touch(session.id, Utc::now());
        log.record(&record);
        log.render()
    };

    let response = Json(ApiResponse::ok(ConvertResponse { record, history })).into_response();
    Ok(session.attach(response))
}

/// GET /api/history - The session's recent conversions, oldest first
async fn get_history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::from_headers(&headers);

    let history = lock(&state.sessions).history(session.id, Utc::now());

    session.attach(Json(ApiResponse::ok(history)).into_response())
}

/// GET /api/comments - Comment board in display order
async fn list_comments(State(state): State<AppState>) -> impl IntoResponse {
    let comments = lock(&state.comments).comments().to_vec();
    Json(ApiResponse::ok(CommentsResponse { comments }))
}

/// POST /api/comments - Add "{name}: {text}"
async fn add_comment(
    State(state): State<AppState>,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(comment) = payload?;
    let mut store = lock(&state.comments);
    store.add(&comment.name, &comment.text)?;

    let comments = store.comments().to_vec();
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(CommentsResponse { comments }))))
}

/// DELETE /api/comments/:index - Remove by 0-based display position
async fn remove_comment(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = lock(&state.comments);
    store.remove(index)?;

    let comments = store.comments().to_vec();
    Ok(Json(ApiResponse::ok(CommentsResponse { comments })))
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn build_router(state: AppState, web_dir: &FsPath) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(list_categories))
        .route("/categories/:name", get(get_category))
        .route("/convert", post(convert))
        .route("/history", get(get_history))
        .route("/comments", get(list_comments).post(add_comment))
        .route("/comments/:index", delete(remove_comment))
        .with_state(state);

    info!(web_dir = ?web_dir, "router ready");

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(web_dir))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router(dir: &TempDir) -> Router {
        let store = CommentStore::open(dir.path().join("comments.json")).unwrap();
        build_router(AppState::new(store), dir.path())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"], "OK");
    }

    #[tokio::test]
    async fn test_categories_lists_units() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(Request::get("/api/categories").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        let categories = json["data"].as_array().unwrap();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0]["name"], "Length");
        assert_eq!(categories[0]["base_unit"], "Meter");
        assert_eq!(categories[3]["base_unit"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(Request::get("/api/categories/Volume").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_convert_records_session_history() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let request = serde_json::json!({
            "category": "Time",
            "value": 60.0,
            "from_unit": "Minute",
            "to_unit": "Hour",
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/convert", request, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);

        let json = body_json(response).await;
        assert_eq!(json["data"]["record"]["formatted"], "60.0 Minute = 1.00 Hour");

        let history = app
            .clone()
            .oneshot(
                Request::get("/api/history")
                    .header(header::COOKIE, cookie.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(history).await;
        assert_eq!(json["data"], serde_json::json!(["60.0 Minute = 1.00 Hour"]));

        // A different session starts with an empty log
        let fresh = app
            .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(fresh).await["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_convert_rejects_negative_value() {
        let dir = TempDir::new().unwrap();
        let request = serde_json::json!({
            "category": "Length",
            "value": -3.0,
            "from_unit": "Meter",
            "to_unit": "Foot",
        });
        let response = test_router(&dir)
            .oneshot(json_request("POST", "/api/convert", request, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_comment_add_and_delete() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/comments",
                serde_json::json!({"name": "Ada", "text": "hello"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await["data"]["comments"],
            serde_json::json!(["Ada: hello"])
        );

        let blank = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/comments",
                serde_json::json!({"name": "", "text": "hello"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

        let stale = app
            .clone()
            .oneshot(Request::delete("/api/comments/4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(stale.status(), StatusCode::NOT_FOUND);

        let removed = app
            .oneshot(Request::delete("/api/comments/0").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(removed.status(), StatusCode::OK);

        let on_disk = crate::comments::load(&dir.path().join("comments.json")).unwrap();
        assert!(on_disk.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_convert_body_uses_api_wrapper() {
        let dir = TempDir::new().unwrap();
        let request = serde_json::json!({
            "category": "Length",
            "value": null,
            "from_unit": "Meter",
            "to_unit": "Foot",
        });
        let response = test_router(&dir)
            .oneshot(json_request("POST", "/api/convert", request, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("value"));
    }

    #[tokio::test]
    async fn test_malformed_comment_body_uses_api_wrapper() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(json_request(
                "POST",
                "/api/comments",
                serde_json::json!({"name": 5, "text": "hello"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_category_path_is_decoded_once() {
        let dir = TempDir::new().unwrap();
        let app = test_router(&dir);

        let labelled = app
            .clone()
            .oneshot(
                Request::get("/api/categories/%F0%9F%93%8F%20Length")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(labelled.status(), StatusCode::OK);
        assert_eq!(body_json(labelled).await["data"]["name"], "Length");

        // "%2520" decodes to a literal "%20", not to a space
        let escaped = app
            .oneshot(Request::get("/api/categories/Length%2520").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(escaped.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cookieless_requests_stay_within_session_bound() {
        let dir = TempDir::new().unwrap();
        let store = CommentStore::open(dir.path().join("comments.json")).unwrap();
        let state = AppState::with_sessions(store, SessionRegistry::new(Duration::minutes(30), 3));
        let app = build_router(state.clone(), dir.path());

        for _ in 0..10 {
            let request = serde_json::json!({
                "category": "Time",
                "value": 1.0,
                "from_unit": "Hour",
                "to_unit": "Minute",
            });
            let response = app
                .clone()
                .oneshot(json_request("POST", "/api/convert", request, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(lock(&state.sessions).len(), 3);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let mut sessions = SessionRegistry::new(Duration::minutes(30), 100);
        let start = Utc::now();
        let old = Uuid::new_v4();
        let recent = Uuid::new_v4();

        sessions.touch(old, start).record("1.0 Hour = 60.00 Minute");
        sessions.touch(recent, start + Duration::minutes(20));

        // A new session 31 minutes in sweeps the idle one
        sessions.touch(Uuid::new_v4(), start + Duration::minutes(31));
        assert_eq!(sessions.len(), 2);
        assert!(sessions.history(old, start + Duration::minutes(31)).is_empty());
    }

    #[test]
    fn test_expired_session_starts_with_empty_history() {
        let mut sessions = SessionRegistry::new(Duration::minutes(30), 100);
        let start = Utc::now();
        let id = Uuid::new_v4();

        sessions.touch(id, start).record("entry");
        assert_eq!(sessions.history(id, start + Duration::minutes(10)), vec!["entry"]);

        // Last seen at +10, so still live at +39
        assert_eq!(sessions.history(id, start + Duration::minutes(39)), vec!["entry"]);
        assert!(sessions.touch(id, start + Duration::minutes(70)).is_empty());
    }

    #[test]
    fn test_full_registry_evicts_least_recently_seen() {
        let mut sessions = SessionRegistry::new(Duration::minutes(30), 2);
        let start = Utc::now();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        sessions.touch(a, start).record("a");
        sessions.touch(b, start + Duration::minutes(1)).record("b");
        sessions.touch(a, start + Duration::minutes(2));
        sessions.touch(c, start + Duration::minutes(3));

        assert_eq!(sessions.len(), 2);
        assert!(sessions.history(b, start + Duration::minutes(4)).is_empty());
        assert_eq!(sessions.history(a, start + Duration::minutes(4)), vec!["a"]);
    }

    #[test]
    fn test_encode_failure_is_server_error() {
        let source = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let err = ApiError::from(CommentError::Encode {
            path: "comments.json".into(),
            source,
        });
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
