use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// A to-do item as served by the backend. `createdAt` travels as unix
/// milliseconds on the wire, matching the server's JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub done: bool,
    #[serde(rename = "createdAt", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Snapshot of the last successfully fetched task list.
///
/// Written only after a full-list fetch succeeds, so a cached snapshot
/// never contains unconfirmed local edits.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Cache {
    pub tasks: Vec<Task>,
}

impl Cache {
    pub fn new(tasks: Vec<Task>) -> Self {
        Cache { tasks }
    }

    /// Load a snapshot from `path`. Returns `Ok(None)` when no cache file
    /// exists yet; a present but unparsable file is an error.
    pub async fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).await?;
        let cache: Cache = serde_json::from_str(&content)?;
        Ok(Some(cache))
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Default cache location: `~/.taskbuddy/tasks_cache_v1.json`.
    ///
    /// `TASKBUDDY_HOME` overrides the home directory, which also keeps
    /// tests away from the real one.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?
            .join(".taskbuddy")
            .join("tasks_cache_v1.json"))
    }

    fn home_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("TASKBUDDY_HOME") {
            return Ok(PathBuf::from(home));
        }

        Ok(directories::UserDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?
            .home_dir()
            .to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_task(id: i64, title: &str, done: bool) -> Task {
        Task {
            id,
            title: title.to_string(),
            done,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks_cache_v1.json");

        let loaded = Cache::load_from(&path).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sub").join("tasks_cache_v1.json");

        let cache = Cache::new(vec![
            sample_task(1, "write report", false),
            sample_task(2, "ship release", true),
        ]);
        cache.save_to(&path).await.unwrap();

        let loaded = Cache::load_from(&path).await.unwrap().unwrap();
        assert_eq!(loaded.tasks.len(), 2);
        assert_eq!(loaded.tasks[0].id, 1);
        assert_eq!(loaded.tasks[0].title, "write report");
        assert!(!loaded.tasks[0].done);
        assert!(loaded.tasks[1].done);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks_cache_v1.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        assert!(Cache::load_from(&path).await.is_err());
    }

    #[test]
    fn test_task_wire_format_uses_millis() {
        let task = Task {
            id: 7,
            title: "A".to_string(),
            done: false,
            created_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        };

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"createdAt\":1700000000123"));

        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }

    #[test]
    fn test_default_path_honors_home_override() {
        let temp_dir = TempDir::new().unwrap();
        std::env::set_var("TASKBUDDY_HOME", temp_dir.path());

        let path = Cache::default_path().unwrap();
        assert!(path.starts_with(temp_dir.path()));
        assert!(path.ends_with(".taskbuddy/tasks_cache_v1.json"));

        std::env::remove_var("TASKBUDDY_HOME");
    }
}
