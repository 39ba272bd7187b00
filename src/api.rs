use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::time::Duration;

use crate::cache::Task;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures from the backend, split the only way callers care about:
/// "the id is gone" versus "the request did not work".
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// 404 from PUT/DELETE on an unknown id. Callers treat this as
    /// "already gone" and drop the stale task locally.
    #[error("task not found")]
    NotFound,

    /// Transport error or any other non-2xx response.
    #[error("network failure: {0}")]
    Network(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body for `POST /api/todos`. The server assigns the id.
#[derive(Debug, Serialize)]
pub struct NewTask {
    pub title: String,
    pub done: bool,
    #[serde(rename = "createdAt", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            done: false,
            created_at: Utc::now(),
        }
    }
}

/// Body for `PUT /api/todos/{id}`; any subset of the mutable fields.
#[derive(Debug, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl TaskPatch {
    pub fn done(done: bool) -> Self {
        TaskPatch {
            done: Some(done),
            ..Default::default()
        }
    }
}

/// HTTP client for the TaskBuddy backend.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();

        ApiClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Build a client from `TASKBUDDY_API_URL`, falling back to localhost.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("TASKBUDDY_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/todos` — the full task list.
    pub async fn list_tasks(&self) -> ApiResult<Vec<Task>> {
        let url = format!("{}/api/todos", self.base_url);
        debug!("GET {url}");

        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let resp = check_status(resp)?;
        resp.json::<Vec<Task>>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid task list body: {e}")))
    }

    /// `POST /api/todos` — create a task; returns the server's copy with
    /// the assigned id.
    pub async fn create_task(&self, new_task: &NewTask) -> ApiResult<Task> {
        let url = format!("{}/api/todos", self.base_url);
        debug!("POST {url}");

        let resp = self
            .client
            .post(&url)
            .json(new_task)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp)?;
        resp.json::<Task>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid created task body: {e}")))
    }

    /// `PUT /api/todos/{id}` — partial update; returns the merged task.
    pub async fn update_task(&self, id: i64, patch: &TaskPatch) -> ApiResult<Task> {
        let url = format!("{}/api/todos/{id}", self.base_url);
        debug!("PUT {url}");

        let resp = self
            .client
            .put(&url)
            .json(patch)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp)?;
        resp.json::<Task>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid updated task body: {e}")))
    }

    /// `DELETE /api/todos/{id}`.
    pub async fn delete_task(&self, id: i64) -> ApiResult<()> {
        let url = format!("{}/api/todos/{id}", self.base_url);
        debug!("DELETE {url}");

        let resp = self.client.delete(&url).send().await.map_err(transport)?;
        check_status(resp)?;
        Ok(())
    }

    /// `GET /TaskBuddy` — lightweight reachability probe. Returns the
    /// plain-text status string verbatim.
    pub async fn ping(&self) -> ApiResult<String> {
        let url = format!("{}/TaskBuddy", self.base_url);
        debug!("GET {url}");

        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let resp = check_status(resp)?;
        resp.text()
            .await
            .map_err(|e| ApiError::Network(format!("invalid status body: {e}")))
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

fn check_status(resp: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Err(ApiError::NotFound)
    } else {
        Err(ApiError::Network(format!("HTTP {status}")))
    }
}
