use anyhow::Result;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::api::{ApiClient, ApiError, NewTask, TaskPatch};
use crate::cache::{Cache, Task};

/// How long a deleted task stays recoverable before the DELETE is sent.
pub const UNDO_WINDOW: Duration = Duration::from_secs(5);

/// Reachability of the backend, as reported by the ping probe.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendStatus {
    Unknown,
    /// Backend answered the probe; holds the status text verbatim.
    Online(String),
    Offline,
}

/// A task removed from the visible list but still inside its undo window.
/// The DELETE request is only issued once the deadline passes uncanceled.
#[derive(Debug)]
pub struct PendingDelete {
    pub task: Task,
    position: usize,
    deadline: Instant,
}

impl PendingDelete {
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}

/// Owns the in-memory task list and keeps it in sync with the backend
/// and the local cache.
///
/// Write failures are not retried; they are logged and the list may drift
/// from the backend until the next full reload.
pub struct TaskListController {
    api: ApiClient,
    tasks: Vec<Task>,
    pending: Vec<PendingDelete>,
    status: BackendStatus,
    unreachable: bool,
    cache_path: PathBuf,
    undo_window: Duration,
}

impl TaskListController {
    pub fn new(api: ApiClient) -> Result<Self> {
        let cache_path = Cache::default_path()?;
        Ok(Self::with_cache_path(api, cache_path))
    }

    pub fn with_cache_path(api: ApiClient, cache_path: PathBuf) -> Self {
        TaskListController {
            api,
            tasks: Vec::new(),
            pending: Vec::new(),
            status: BackendStatus::Unknown,
            unreachable: false,
            cache_path,
            undo_window: UNDO_WINDOW,
        }
    }

    /// Shrink the undo window; used by tests to avoid real 5 s waits.
    pub fn set_undo_window(&mut self, window: Duration) {
        self.undo_window = window;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn pending(&self) -> &[PendingDelete] {
        &self.pending
    }

    pub fn status(&self) -> &BackendStatus {
        &self.status
    }

    /// True when the last full fetch failed and the list came from the
    /// cache (or is empty because there was no cache).
    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    /// Count of tasks not yet done.
    pub fn remaining(&self) -> usize {
        self.tasks.iter().filter(|t| !t.done).count()
    }

    /// Fetch the full list. On success the cache is rewritten; on failure
    /// the cache is substituted and the controller marked unreachable.
    pub async fn load(&mut self) {
        match self.api.list_tasks().await {
            Ok(tasks) => {
                info!("Loaded {} task(s) from backend", tasks.len());
                self.tasks = tasks;
                self.unreachable = false;

                let snapshot = Cache::new(self.tasks.clone());
                if let Err(e) = snapshot.save_to(&self.cache_path).await {
                    warn!("Failed to write task cache: {e}");
                }
            }
            Err(e) => {
                warn!("Task list fetch failed: {e}");
                self.unreachable = true;
                match Cache::load_from(&self.cache_path).await {
                    Ok(Some(cache)) => {
                        info!("Falling back to {} cached task(s)", cache.tasks.len());
                        self.tasks = cache.tasks;
                    }
                    Ok(None) => {
                        self.tasks = Vec::new();
                    }
                    Err(e) => {
                        warn!("Failed to read task cache: {e}");
                        self.tasks = Vec::new();
                    }
                }
            }
        }
    }

    /// Create a task with the given title and insert the server's copy at
    /// the head of the list. Empty or whitespace-only titles are rejected
    /// without a request; returns `Ok(None)` in that case.
    pub async fn add(&mut self, title: &str) -> Result<Option<Task>, ApiError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        let created = self.api.create_task(&NewTask::new(title)).await?;
        self.tasks.insert(0, created.clone());
        Ok(Some(created))
    }

    /// Flip a task's done state via the backend. The server's returned
    /// representation replaces the local task; on 404 the stale task is
    /// dropped. A network failure leaves local state untouched.
    pub async fn toggle(&mut self, id: i64) -> Result<(), ApiError> {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(());
        };

        let patch = TaskPatch::done(!self.tasks[idx].done);
        match self.api.update_task(id, &patch).await {
            Ok(updated) => {
                self.tasks[idx] = updated;
                Ok(())
            }
            Err(ApiError::NotFound) => {
                debug!("Task {id} gone on backend, dropping locally");
                self.tasks.remove(idx);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Hide a task and start its undo window. No request is sent yet.
    /// Returns false when the id is not in the visible list.
    pub fn delete(&mut self, id: i64) -> bool {
        let Some(position) = self.tasks.iter().position(|t| t.id == id) else {
            return false;
        };

        let task = self.tasks.remove(position);
        self.pending.push(PendingDelete {
            task,
            position,
            deadline: Instant::now() + self.undo_window,
        });
        true
    }

    /// Cancel a pending deletion and restore the task at its prior
    /// position. A no-op for ids that are not pending.
    pub fn undo(&mut self, id: i64) -> bool {
        let Some(idx) = self.pending.iter().position(|p| p.task.id == id) else {
            return false;
        };

        let pending = self.pending.remove(idx);
        let at = pending.position.min(self.tasks.len());
        self.tasks.insert(at, pending.task);
        true
    }

    /// Undo the most recently started pending deletion.
    pub fn undo_last(&mut self) -> bool {
        match self.pending.last() {
            Some(p) => {
                let id = p.task.id;
                self.undo(id)
            }
            None => false,
        }
    }

    /// Fire the DELETE for every pending deletion whose window has
    /// elapsed. Best-effort: the task never reappears, whatever the
    /// backend says. Returns the ids that were deleted.
    pub async fn expire_pending(&mut self) -> Vec<i64> {
        let now = Instant::now();
        let mut expired = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].deadline <= now {
                expired.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }

        let mut deleted = Vec::new();
        for p in expired {
            let id = p.task.id;
            match self.api.delete_task(id).await {
                Ok(()) => info!("Deleted task {id}"),
                Err(ApiError::NotFound) => debug!("Task {id} already gone on backend"),
                Err(e) => warn!("Failed to delete task {id}: {e}"),
            }
            deleted.push(id);
        }
        deleted
    }

    /// Remove every done task from the visible list and issue one DELETE
    /// per removed id. Local removal does not wait on the responses.
    /// Returns the number of tasks cleared.
    pub async fn clear_completed(&mut self) -> usize {
        let done_ids: Vec<i64> = self
            .tasks
            .iter()
            .filter(|t| t.done)
            .map(|t| t.id)
            .collect();
        self.tasks.retain(|t| !t.done);

        for id in &done_ids {
            match self.api.delete_task(*id).await {
                Ok(()) => debug!("Cleared task {id}"),
                Err(ApiError::NotFound) => debug!("Task {id} already gone on backend"),
                Err(e) => warn!("Failed to clear task {id}: {e}"),
            }
        }
        done_ids.len()
    }

    /// Probe the backend and update the reachability badge.
    pub async fn refresh_status(&mut self) {
        self.status = match self.api.ping().await {
            Ok(text) => BackendStatus::Online(text),
            Err(e) => {
                debug!("Ping failed: {e}");
                BackendStatus::Offline
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn controller() -> TaskListController {
        // Points at a closed port; these tests never touch the network.
        TaskListController::with_cache_path(
            ApiClient::new("http://127.0.0.1:59999"),
            std::env::temp_dir().join("taskbuddy-controller-unit.json"),
        )
    }

    fn sample_task(id: i64, title: &str, done: bool) -> Task {
        Task {
            id,
            title: title.to_string(),
            done,
            created_at: Utc::now(),
        }
    }

    fn with_tasks(tasks: Vec<Task>) -> TaskListController {
        let mut c = controller();
        c.tasks = tasks;
        c
    }

    #[test]
    fn test_remaining_counts_open_tasks() {
        let c = with_tasks(vec![
            sample_task(1, "a", false),
            sample_task(2, "b", true),
            sample_task(3, "c", false),
        ]);
        assert_eq!(c.remaining(), 2);
    }

    #[test]
    fn test_delete_hides_task_immediately() {
        let mut c = with_tasks(vec![sample_task(1, "a", false), sample_task(2, "b", false)]);

        assert!(c.delete(1));
        assert_eq!(c.tasks().len(), 1);
        assert_eq!(c.tasks()[0].id, 2);
        assert_eq!(c.pending().len(), 1);
        assert_eq!(c.pending()[0].task.id, 1);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut c = with_tasks(vec![sample_task(1, "a", false)]);
        assert!(!c.delete(99));
        assert_eq!(c.tasks().len(), 1);
        assert!(c.pending().is_empty());
    }

    #[test]
    fn test_undo_restores_prior_position() {
        let mut c = with_tasks(vec![
            sample_task(1, "a", false),
            sample_task(2, "b", false),
            sample_task(3, "c", false),
        ]);

        c.delete(2);
        assert!(c.undo(2));

        let ids: Vec<i64> = c.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(c.pending().is_empty());
    }

    #[test]
    fn test_undo_is_idempotent() {
        let mut c = with_tasks(vec![sample_task(1, "a", false)]);

        c.delete(1);
        assert!(c.undo(1));
        assert!(!c.undo(1));
        assert_eq!(c.tasks().len(), 1);
    }

    #[test]
    fn test_undo_last_restores_most_recent() {
        let mut c = with_tasks(vec![sample_task(1, "a", false), sample_task(2, "b", false)]);

        c.delete(1);
        c.delete(2);
        assert!(c.undo_last());
        assert_eq!(c.pending().len(), 1);
        assert_eq!(c.pending()[0].task.id, 1);
        assert_eq!(c.tasks()[0].id, 2);
    }

    #[test]
    fn test_independent_undo_windows() {
        let mut c = with_tasks(vec![sample_task(1, "a", false), sample_task(2, "b", false)]);

        c.delete(1);
        c.delete(2);
        assert_eq!(c.pending().len(), 2);

        assert!(c.undo(1));
        assert_eq!(c.pending().len(), 1);
        assert_eq!(c.pending()[0].task.id, 2);
    }

    #[tokio::test]
    async fn test_add_rejects_whitespace_title() {
        let mut c = controller();
        let added = c.add("   ").await.unwrap();
        assert!(added.is_none());
        assert!(c.tasks().is_empty());
    }

    #[test]
    fn test_pending_remaining_counts_down() {
        let mut c = with_tasks(vec![sample_task(1, "a", false)]);
        c.delete(1);

        let remaining = c.pending()[0].remaining(Instant::now());
        assert!(remaining <= UNDO_WINDOW);
        assert!(remaining > UNDO_WINDOW - Duration::from_secs(1));
    }
}
