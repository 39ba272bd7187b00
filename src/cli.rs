use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::api::{ApiClient, ApiError};
use crate::controller::{BackendStatus, TaskListController};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all tasks
    List,

    /// Add a new task
    Add {
        /// Title of the task
        title: String,
    },

    /// Flip a task's done state
    Toggle {
        /// Id of the task to toggle
        id: i64,
    },

    /// Delete a task immediately (no undo window outside the TUI)
    Remove {
        /// Id of the task to delete
        id: i64,
    },

    /// Delete every completed task
    Clear,

    /// Show the backend status badge
    Status,

    /// Launch the interactive task list
    Tui,
}

fn build_controller() -> Result<TaskListController> {
    TaskListController::new(ApiClient::from_env())
}

pub async fn handle_list() -> Result<()> {
    let mut controller = build_controller()?;
    controller.load().await;

    if controller.is_unreachable() {
        println!("⚠️  Backend unreachable — showing cached tasks");
    }

    if controller.tasks().is_empty() {
        println!("No tasks");
        return Ok(());
    }

    println!("{:<6} {:<5} {:<40} {:<17}", "ID", "DONE", "TITLE", "CREATED");
    println!("{}", "-".repeat(70));

    for task in controller.tasks() {
        let done = if task.done { "[x]" } else { "[ ]" };
        let title = truncate_title(&task.title);

        println!(
            "{:<6} {:<5} {:<40} {:<17}",
            task.id,
            done,
            title,
            task.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} remaining", controller.remaining());
    Ok(())
}

/// Shorten long titles for the table. Counts characters, not bytes, so
/// multi-byte titles never split inside a code point.
fn truncate_title(title: &str) -> String {
    if title.chars().count() > 37 {
        let short: String = title.chars().take(37).collect();
        format!("{short}...")
    } else {
        title.to_string()
    }
}

pub async fn handle_add(title: String) -> Result<()> {
    let mut controller = build_controller()?;

    match controller.add(&title).await? {
        Some(task) => {
            println!("Task '{}' added with id {}", task.title, task.id);
            Ok(())
        }
        None => Err(anyhow::anyhow!("Title must not be empty")),
    }
}

pub async fn handle_toggle(id: i64) -> Result<()> {
    let mut controller = build_controller()?;
    controller.load().await;

    if controller.is_unreachable() {
        return Err(anyhow::anyhow!("Backend unreachable, cannot toggle"));
    }
    if !controller.tasks().iter().any(|t| t.id == id) {
        return Err(anyhow::anyhow!("Task with id {} not found", id));
    }

    controller.toggle(id).await?;

    match controller.tasks().iter().find(|t| t.id == id) {
        Some(task) => {
            let state = if task.done { "done" } else { "open" };
            println!("Task {id} is now {state}");
        }
        None => println!("Task {id} was already gone on the backend"),
    }
    Ok(())
}

pub async fn handle_remove(id: i64) -> Result<()> {
    let api = ApiClient::from_env();

    match api.delete_task(id).await {
        Ok(()) => {
            println!("Task {id} deleted");
            Ok(())
        }
        Err(ApiError::NotFound) => Err(anyhow::anyhow!("Task with id {} not found", id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_clear() -> Result<()> {
    let mut controller = build_controller()?;
    controller.load().await;

    if controller.is_unreachable() {
        return Err(anyhow::anyhow!("Backend unreachable, cannot clear"));
    }

    let cleared = controller.clear_completed().await;
    println!("Cleared {cleared} completed task(s)");
    Ok(())
}

pub async fn handle_status() -> Result<()> {
    let mut controller = build_controller()?;
    controller.refresh_status().await;

    match controller.status() {
        BackendStatus::Online(text) => println!("🟢 {text}"),
        BackendStatus::Offline => println!("🔴 Offline"),
        BackendStatus::Unknown => println!("Status unknown"),
    }
    Ok(())
}

pub async fn handle_tui() -> Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        return Err(anyhow::anyhow!(
            "The interactive list needs a terminal; try 'taskbuddy list'"
        ));
    }

    crate::tui::run_tui()
        .await
        .map_err(|e| anyhow::anyhow!("TUI error: {}", e))
}
