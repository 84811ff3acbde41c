//! Axum-based HTTP gateway: auth endpoints plus the owner-scoped task API.
//!
//! - Request body size limits (64KB max)
//! - Request timeouts (30s) to prevent slow-loris abuse
//! - CORS for browser clients
//!
//! Status contract (kept wire-compatible with existing clients): duplicate
//! username and bad credentials are 400, not 409/401; protected routes
//! return 401 for missing or invalid tokens; an id under another owner is a
//! plain 404. Error bodies are `{"message": "..."}`.

use crate::auth::{AuthError, AuthStore};
use crate::tasks::{TaskDraft, TaskPatch, TaskStatus, TaskStore, TaskStoreError};
use crate::token::TokenService;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout for CRUD-scale work.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Demo account used by the seed endpoint.
const SEED_USERNAME: &str = "demo";
const SEED_PASSWORD: &str = "demo123";

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthStore>,
    pub tasks: Arc<TaskStore>,
    pub tokens: Arc<TokenService>,
}

/// Concrete return type for handlers (avoids `impl IntoResponse` inference issues).
type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("taskdeck gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Build the router with middleware. Split out so tests can drive it.
pub fn router(state: AppState) -> Router {
    // ── CORS — allow browser clients to connect from any origin ──
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/register", post(handle_register))
        .route("/api/login", post(handle_login))
        .route("/api/tasks", get(handle_tasks_list))
        .route("/api/tasks", post(handle_tasks_create))
        .route("/api/tasks/{id}", put(handle_tasks_update))
        .route("/api/tasks/{id}", delete(handle_tasks_delete))
        .route("/api/seed", post(handle_seed))
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

fn message(status: StatusCode, text: &str) -> ApiResponse {
    (status, Json(serde_json::json!({"message": text})))
}

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Per-request auth gate: resolve the owner id from the bearer token.
/// Nothing is cached across requests; every call re-verifies the signature
/// and expiry.
fn require_owner(state: &AppState, headers: &HeaderMap) -> Result<String, ApiResponse> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| message(StatusCode::UNAUTHORIZED, "No token provided"))?;

    state.tokens.verify(token).map_err(|e| {
        tracing::debug!("token rejected: {e}");
        message(StatusCode::UNAUTHORIZED, "Invalid token")
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// AUTH HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// Request body for register and login.
#[derive(Deserialize)]
struct CredentialsBody {
    username: String,
    password: String,
}

/// Validate the shared register/login input shape. Returns the trimmed
/// username on success.
fn validate_credentials(body: &CredentialsBody) -> Result<&str, ApiResponse> {
    let username = body.username.trim();
    if username.len() < 3 || body.password.trim().len() < 6 {
        return Err(message(
            StatusCode::BAD_REQUEST,
            "Username min 3 chars, password min 6 chars",
        ));
    }
    Ok(username)
}

/// POST /api/register — create an account and issue a token.
async fn handle_register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(_) => return message(StatusCode::BAD_REQUEST, "Invalid input"),
    };
    let username = match validate_credentials(&body) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state.auth.register(username, &body.password) {
        Ok(user) => {
            let token = state.tokens.issue(&user.id);
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "token": token,
                    "user": {"id": user.id, "username": user.username},
                })),
            )
        }
        Err(AuthError::DuplicateUsername) => {
            message(StatusCode::BAD_REQUEST, "User already exists")
        }
        Err(e) => {
            tracing::error!("registration failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Registration failed")
        }
    }
}

/// POST /api/login — verify credentials and issue a token.
///
/// Credential mismatch is 400, not 401, matching the established contract.
async fn handle_login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(_) => return message(StatusCode::BAD_REQUEST, "Invalid input"),
    };
    let username = match validate_credentials(&body) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state.auth.verify(username, &body.password) {
        Ok(user) => {
            let token = state.tokens.issue(&user.id);
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "token": token,
                    "user": {"id": user.id, "username": user.username},
                })),
            )
        }
        Err(AuthError::InvalidCredentials) => {
            message(StatusCode::BAD_REQUEST, "Invalid credentials")
        }
        Err(e) => {
            tracing::error!("login failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TASK HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// Request body for task creation. Status arrives as a raw string so an
/// invalid value can be coerced rather than rejected.
#[derive(Deserialize)]
struct CreateTaskBody {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
}

/// Request body for task update. Unlike creation, an invalid status is
/// silently ignored (field left unchanged) — kept for wire compatibility.
#[derive(Deserialize)]
struct UpdateTaskBody {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
}

/// GET /api/tasks — all tasks owned by the authenticated user.
async fn handle_tasks_list(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let owner = match require_owner(&state, &headers) {
        Ok(o) => o,
        Err(resp) => return resp,
    };

    match state.tasks.list_by_owner(&owner) {
        Ok(tasks) => (StatusCode::OK, Json(serde_json::json!(tasks))),
        Err(e) => {
            tracing::error!("task list failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

/// POST /api/tasks — create a task in the caller's board.
async fn handle_tasks_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateTaskBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let owner = match require_owner(&state, &headers) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let body = match body {
        Ok(Json(b)) => b,
        Err(_) => return message(StatusCode::BAD_REQUEST, "Title is required"),
    };

    let title = match body.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return message(StatusCode::BAD_REQUEST, "Title is required"),
    };
    let description = body.description.as_deref().unwrap_or("");
    // Absent or unrecognized status lands in the default column.
    let status = body
        .status
        .as_deref()
        .map(TaskStatus::from_str_lossy)
        .unwrap_or_default();

    match state.tasks.create(&owner, title, description, status) {
        Ok(task) => (StatusCode::OK, Json(serde_json::json!(task))),
        Err(e) => {
            tracing::error!("task create failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create task")
        }
    }
}

/// PUT /api/tasks/{id} — apply supplied, valid fields to an owned task.
async fn handle_tasks_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<UpdateTaskBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let owner = match require_owner(&state, &headers) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let body = match body {
        Ok(Json(b)) => b,
        Err(_) => return message(StatusCode::BAD_REQUEST, "Invalid input"),
    };

    let patch = TaskPatch {
        // An empty title is treated as absent, not as an erase.
        title: body
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        description: body.description,
        // Strict parse: an invalid status leaves the field unchanged.
        status: body.status.as_deref().and_then(TaskStatus::parse),
    };

    match state.tasks.update(&id, &owner, &patch) {
        Ok(task) => (StatusCode::OK, Json(serde_json::json!(task))),
        Err(TaskStoreError::NotFound) => message(StatusCode::NOT_FOUND, "Task not found"),
        Err(e) => {
            tracing::error!("task update failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update task")
        }
    }
}

/// DELETE /api/tasks/{id} — remove an owned task.
async fn handle_tasks_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    let owner = match require_owner(&state, &headers) {
        Ok(o) => o,
        Err(resp) => return resp,
    };

    match state.tasks.delete(&id, &owner) {
        Ok(()) => message(StatusCode::OK, "Task deleted"),
        Err(TaskStoreError::NotFound) => message(StatusCode::NOT_FOUND, "Task not found"),
        Err(e) => {
            tracing::error!("task delete failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete task")
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// SEED
// ══════════════════════════════════════════════════════════════════════════════

fn seed_drafts() -> Vec<TaskDraft> {
    vec![
        TaskDraft {
            title: "Setup project structure".into(),
            description: "Initialize server and client scaffolding".into(),
            status: TaskStatus::Done,
        },
        TaskDraft {
            title: "Implement authentication".into(),
            description: "Add token-based user authentication".into(),
            status: TaskStatus::InProgress,
        },
        TaskDraft {
            title: "Create kanban board UI".into(),
            description: "Build drag-and-drop interface".into(),
            status: TaskStatus::Todo,
        },
        TaskDraft {
            title: "Add task management".into(),
            description: "CRUD operations for tasks".into(),
            status: TaskStatus::Todo,
        },
    ]
}

/// POST /api/seed — idempotently ensure the demo user and replace its task
/// set with four canned tasks.
///
/// Demo convenience only: this endpoint is unauthenticated and mutates data.
/// Do not expose it on a production deployment.
async fn handle_seed(State(state): State<AppState>) -> ApiResponse {
    let user = match state.auth.find_by_username(SEED_USERNAME) {
        Ok(Some(user)) => user,
        Ok(None) => match state.auth.register(SEED_USERNAME, SEED_PASSWORD) {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("seed user creation failed: {e}");
                return message(StatusCode::INTERNAL_SERVER_ERROR, "Error seeding data");
            }
        },
        Err(e) => {
            tracing::error!("seed lookup failed: {e}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Error seeding data");
        }
    };

    if let Err(e) = state.tasks.replace_owner_tasks(&user.id, &seed_drafts()) {
        tracing::error!("seed task insert failed: {e}");
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Error seeding data");
    }

    tracing::info!("seeded demo board for user {}", user.id);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Sample data created",
            "credentials": {"username": SEED_USERNAME, "password": SEED_PASSWORD},
        })),
    )
}

/// GET /health — always public (no secrets leaked)
async fn handle_health() -> ApiResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

// ══════════════════════════════════════════════════════════════════════════════
// TESTS
// ══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn test_state() -> (TempDir, AppState) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("taskdeck.db");
        let state = AppState {
            auth: Arc::new(AuthStore::open(&db_path).unwrap()),
            tasks: Arc::new(TaskStore::open(&db_path).unwrap()),
            tokens: Arc::new(TokenService::new("gateway-test-secret")),
        };
        (tmp, state)
    }

    fn creds(username: &str, password: &str) -> Result<Json<CredentialsBody>, axum::extract::rejection::JsonRejection> {
        Ok(Json(CredentialsBody {
            username: username.into(),
            password: password.into(),
        }))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Register a user through the handler and return (token, user_id).
    async fn register(state: &AppState, username: &str, password: &str) -> (String, String) {
        let resp = handle_register(State(state.clone()), creds(username, password))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_task(
        state: &AppState,
        token: &str,
        title: Option<&str>,
        description: Option<&str>,
        status: Option<&str>,
    ) -> axum::response::Response {
        handle_tasks_create(
            State(state.clone()),
            bearer(token),
            Ok(Json(CreateTaskBody {
                title: title.map(str::to_string),
                description: description.map(str::to_string),
                status: status.map(str::to_string),
            })),
        )
        .await
        .into_response()
    }

    // ── register / login ────────────────────────────────────────────

    #[tokio::test]
    async fn register_returns_token_and_user() {
        let (_tmp, state) = test_state();
        let resp = handle_register(State(state.clone()), creds("alice", "password123"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["user"]["username"], "alice");
        let owner = state
            .tokens
            .verify(body["token"].as_str().unwrap())
            .unwrap();
        assert_eq!(owner, body["user"]["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn register_duplicate_is_400() {
        let (_tmp, state) = test_state();
        register(&state, "alice", "password123").await;

        let resp = handle_register(State(state.clone()), creds("alice", "password456"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "User already exists");
    }

    #[tokio::test]
    async fn register_password_boundary_is_six_chars() {
        let (_tmp, state) = test_state();

        let five = handle_register(State(state.clone()), creds("alice", "12345"))
            .await
            .into_response();
        assert_eq!(five.status(), StatusCode::BAD_REQUEST);

        let six = handle_register(State(state.clone()), creds("alice", "123456"))
            .await
            .into_response();
        assert_eq!(six.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_username_boundary_is_three_chars() {
        let (_tmp, state) = test_state();

        let two = handle_register(State(state.clone()), creds("ab", "password123"))
            .await
            .into_response();
        assert_eq!(two.status(), StatusCode::BAD_REQUEST);

        let three = handle_register(State(state.clone()), creds("abc", "password123"))
            .await
            .into_response();
        assert_eq!(three.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_issues_usable_token() {
        let (_tmp, state) = test_state();
        let (_, user_id) = register(&state, "alice", "password123").await;

        let resp = handle_login(State(state.clone()), creds("alice", "password123"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(
            state
                .tokens
                .verify(body["token"].as_str().unwrap())
                .unwrap(),
            user_id
        );
    }

    #[tokio::test]
    async fn login_mismatch_is_400_not_401() {
        let (_tmp, state) = test_state();
        register(&state, "alice", "password123").await;

        let wrong = handle_login(State(state.clone()), creds("alice", "wrongpass"))
            .await
            .into_response();
        assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(wrong).await["message"], "Invalid credentials");

        // Unknown user gets the identical response.
        let unknown = handle_login(State(state.clone()), creds("ghost", "password123"))
            .await
            .into_response();
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(unknown).await["message"], "Invalid credentials");
    }

    // ── auth gate ───────────────────────────────────────────────────

    #[tokio::test]
    async fn tasks_require_a_token() {
        let (_tmp, state) = test_state();
        let resp = handle_tasks_list(State(state.clone()), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["message"], "No token provided");
    }

    #[tokio::test]
    async fn tasks_reject_a_bad_token() {
        let (_tmp, state) = test_state();
        let resp = handle_tasks_list(State(state.clone()), bearer("forged-token"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["message"], "Invalid token");
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let (_tmp, state) = test_state();
        let (_, user_id) = register(&state, "alice", "password123").await;
        let foreign = TokenService::new("some-other-secret").issue(&user_id);

        let resp = handle_tasks_list(State(state.clone()), bearer(&foreign))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // ── task CRUD ───────────────────────────────────────────────────

    #[tokio::test]
    async fn create_defaults_description_and_status() {
        let (_tmp, state) = test_state();
        let (token, user_id) = register(&state, "alice", "password123").await;

        let resp = create_task(&state, &token, Some("Write spec"), None, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let task = body_json(resp).await;
        assert_eq!(task["title"], "Write spec");
        assert_eq!(task["description"], "");
        assert_eq!(task["status"], "todo");
        assert_eq!(task["ownerId"], user_id);
    }

    #[tokio::test]
    async fn create_without_title_is_400() {
        let (_tmp, state) = test_state();
        let (token, _) = register(&state, "alice", "password123").await;

        let missing = create_task(&state, &token, None, None, None).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let blank = create_task(&state, &token, Some("   "), None, None).await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(blank).await["message"], "Title is required");
    }

    #[tokio::test]
    async fn create_coerces_invalid_status_to_todo() {
        let (_tmp, state) = test_state();
        let (token, _) = register(&state, "alice", "password123").await;

        let resp = create_task(&state, &token, Some("task"), None, Some("blocked")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "todo");

        let resp = create_task(&state, &token, Some("task2"), None, Some("inprogress")).await;
        assert_eq!(body_json(resp).await["status"], "inprogress");
    }

    #[tokio::test]
    async fn list_returns_only_the_callers_tasks() {
        let (_tmp, state) = test_state();
        let (token_a, _) = register(&state, "alice", "password123").await;
        let (token_b, _) = register(&state, "bob", "password123").await;

        create_task(&state, &token_a, Some("a-task"), None, None).await;
        create_task(&state, &token_b, Some("b-task"), None, None).await;

        let resp = handle_tasks_list(State(state.clone()), bearer(&token_a))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let tasks = body_json(resp).await;
        let tasks = tasks.as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["title"], "a-task");
    }

    #[tokio::test]
    async fn update_moves_status_and_keeps_title() {
        let (_tmp, state) = test_state();
        let (token, _) = register(&state, "alice", "password123").await;

        let created = body_json(create_task(&state, &token, Some("Write spec"), None, None).await)
            .await;
        let id = created["id"].as_str().unwrap().to_string();

        let resp = handle_tasks_update(
            State(state.clone()),
            Path(id),
            bearer(&token),
            Ok(Json(UpdateTaskBody {
                title: None,
                description: None,
                status: Some("inprogress".into()),
            })),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let task = body_json(resp).await;
        assert_eq!(task["status"], "inprogress");
        assert_eq!(task["title"], "Write spec");
    }

    #[tokio::test]
    async fn update_ignores_invalid_status() {
        let (_tmp, state) = test_state();
        let (token, _) = register(&state, "alice", "password123").await;

        let created = body_json(
            create_task(&state, &token, Some("task"), None, Some("done")).await,
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let resp = handle_tasks_update(
            State(state.clone()),
            Path(id),
            bearer(&token),
            Ok(Json(UpdateTaskBody {
                title: Some("renamed".into()),
                description: None,
                status: Some("not-a-column".into()),
            })),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let task = body_json(resp).await;
        // Invalid status left the field unchanged; the rest applied.
        assert_eq!(task["status"], "done");
        assert_eq!(task["title"], "renamed");
    }

    #[tokio::test]
    async fn cross_owner_update_and_delete_are_404() {
        let (_tmp, state) = test_state();
        let (token_a, _) = register(&state, "alice", "password123").await;
        let (token_b, _) = register(&state, "bob", "password123").await;

        let created =
            body_json(create_task(&state, &token_a, Some("private"), None, None).await).await;
        let id = created["id"].as_str().unwrap().to_string();

        let update = handle_tasks_update(
            State(state.clone()),
            Path(id.clone()),
            bearer(&token_b),
            Ok(Json(UpdateTaskBody {
                title: Some("hijacked".into()),
                description: None,
                status: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(update.status(), StatusCode::NOT_FOUND);

        let delete = handle_tasks_delete(State(state.clone()), Path(id), bearer(&token_b))
            .await
            .into_response();
        assert_eq!(delete.status(), StatusCode::NOT_FOUND);

        // Owner's task is unchanged.
        let tasks = body_json(
            handle_tasks_list(State(state.clone()), bearer(&token_a))
                .await
                .into_response(),
        )
        .await;
        assert_eq!(tasks[0]["title"], "private");
    }

    #[tokio::test]
    async fn delete_confirms_then_404s_on_repeat() {
        let (_tmp, state) = test_state();
        let (token, _) = register(&state, "alice", "password123").await;

        let created =
            body_json(create_task(&state, &token, Some("ephemeral"), None, None).await).await;
        let id = created["id"].as_str().unwrap().to_string();

        let resp = handle_tasks_delete(State(state.clone()), Path(id.clone()), bearer(&token))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], "Task deleted");

        let again = handle_tasks_delete(State(state.clone()), Path(id), bearer(&token))
            .await
            .into_response();
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    // ── seed ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn seed_creates_demo_board_and_login_works() {
        let (_tmp, state) = test_state();

        let resp = handle_seed(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["credentials"]["username"], "demo");

        let login = handle_login(State(state.clone()), creds("demo", "demo123"))
            .await
            .into_response();
        assert_eq!(login.status(), StatusCode::OK);
        let login_body = body_json(login).await;
        let token = login_body["token"].as_str().unwrap().to_string();

        // The token resolves to exactly the owner used by seed.
        let demo_user = state.auth.find_by_username("demo").unwrap().unwrap();
        assert_eq!(state.tokens.verify(&token).unwrap(), demo_user.id);

        let tasks = body_json(
            handle_tasks_list(State(state.clone()), bearer(&token))
                .await
                .into_response(),
        )
        .await;
        assert_eq!(tasks.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn seed_is_idempotent_and_replaces_the_demo_board() {
        let (_tmp, state) = test_state();

        handle_seed(State(state.clone())).await;
        let before = state.auth.user_count().unwrap();

        // Dirty the demo board, then reseed.
        let login = body_json(
            handle_login(State(state.clone()), creds("demo", "demo123"))
                .await
                .into_response(),
        )
        .await;
        let token = login["token"].as_str().unwrap().to_string();
        create_task(&state, &token, Some("extra"), None, None).await;

        handle_seed(State(state.clone())).await;
        assert_eq!(state.auth.user_count().unwrap(), before);

        let tasks = body_json(
            handle_tasks_list(State(state.clone()), bearer(&token))
                .await
                .into_response(),
        )
        .await;
        let titles: Vec<_> = tasks
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles.len(), 4);
        assert!(!titles.contains(&"extra".to_string()));
    }

    // ── scenario from the contract ──────────────────────────────────

    #[tokio::test]
    async fn write_spec_scenario() {
        let (_tmp, state) = test_state();
        let (token, _) = register(&state, "alice", "password123").await;

        let created =
            body_json(create_task(&state, &token, Some("Write spec"), None, None).await).await;
        assert_eq!(created["status"], "todo");
        assert_eq!(created["description"], "");

        let updated = body_json(
            handle_tasks_update(
                State(state.clone()),
                Path(created["id"].as_str().unwrap().to_string()),
                bearer(&token),
                Ok(Json(UpdateTaskBody {
                    title: None,
                    description: None,
                    status: Some("inprogress".into()),
                })),
            )
            .await
            .into_response(),
        )
        .await;
        assert_eq!(updated["status"], "inprogress");
        assert_eq!(updated["title"], "Write spec");
    }

    #[test]
    fn security_body_limit_is_64kb() {
        assert_eq!(MAX_BODY_SIZE, 65_536);
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
