pub mod api;
pub mod cache;
pub mod cli;
pub mod controller;
pub mod theme;
pub mod tui;

pub use controller::TaskListController;

#[cfg(test)]
mod tests {
    use crate::api::ApiClient;
    use crate::cache::{Cache, Task};
    use crate::controller::TaskListController;
    use chrono::Utc;
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
    async fn test_cache_snapshot_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks_cache_v1.json");

        let cache = Cache::new(vec![sample_task(1, "A", false), sample_task(2, "B", true)]);
        cache.save_to(&path).await.unwrap();

        let loaded = Cache::load_from(&path).await.unwrap().unwrap();
        assert_eq!(loaded.tasks.len(), 2);
        assert_eq!(loaded.tasks[1].title, "B");
    }

    #[tokio::test]
    async fn test_load_failure_without_cache_yields_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks_cache_v1.json");

        // Nothing listening on this port, and no cache file on disk.
        let api = ApiClient::new("http://127.0.0.1:59999");
        let mut controller = TaskListController::with_cache_path(api, path);
        controller.load().await;

        assert!(controller.tasks().is_empty());
        assert!(controller.is_unreachable());
        assert_eq!(controller.remaining(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_with_cache_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks_cache_v1.json");

        let cache = Cache::new(vec![sample_task(99, "FROM_CACHE", false)]);
        cache.save_to(&path).await.unwrap();

        let api = ApiClient::new("http://127.0.0.1:59999");
        let mut controller = TaskListController::with_cache_path(api, path);
        controller.load().await;

        assert!(controller.is_unreachable());
        assert_eq!(controller.tasks().len(), 1);
        assert_eq!(controller.tasks()[0].title, "FROM_CACHE");
    }
}
