//! HTTP client for the task API.
//!
//! [`TaskApi`] is the seam the board controller talks through; the
//! reqwest-backed [`HttpTaskApi`] speaks the gateway's wire contract, and
//! tests substitute a scripted implementation.

use crate::tasks::{Task, TaskDraft, TaskPatch};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// A task API call that did not succeed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,
    #[error("task not found")]
    NotFound,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// The owner-scoped task operations the board controller needs.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;
    async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError>;
    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError>;
    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

/// Exchange credentials for a bearer token at `POST /api/login`.
pub async fn login(base_url: &str, username: &str, password: &str) -> Result<String, ApiError> {
    let resp = reqwest::Client::new()
        .post(format!("{}/api/login", base_url.trim_end_matches('/')))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await?;
    let resp = check(resp).await?;
    let body: serde_json::Value = resp.json().await?;
    body["token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ApiError::Server("login response missing token".into()))
}

/// reqwest-backed [`TaskApi`] carrying a bearer token.
pub struct HttpTaskApi {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Map a non-success status to the matching error, pulling the server's
/// `{"message"}` through where it has one.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        StatusCode::BAD_REQUEST => {
            let message = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| "bad request".to_string());
            Err(ApiError::Rejected(message))
        }
        other => Err(ApiError::Server(other.to_string())),
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let resp = self
            .client
            .get(self.url("/api/tasks"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        let resp = self
            .client
            .post(self.url("/api/tasks"))
            .bearer_auth(&self.token)
            .json(draft)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let resp = self
            .client
            .put(self.url(&format!("/api/tasks/{id}")))
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/tasks/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}
