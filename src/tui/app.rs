use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use log::warn;
use std::io::Write;
use std::time::{Duration, Instant};

use crate::api::ApiClient;
use crate::controller::{BackendStatus, TaskListController};
use crate::theme::{self, Theme};
use crate::tui::state::{AppMode, AppState};

const TICK: Duration = Duration::from_millis(250);
/// Re-ping the backend roughly every 5 seconds.
const PING_EVERY: Duration = Duration::from_secs(5);

struct Palette {
    header: Color,
    badge_ok: Color,
    badge_err: Color,
    muted: Color,
    selection: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            header: Color::Cyan,
            badge_ok: Color::Green,
            badge_err: Color::Red,
            muted: Color::DarkGrey,
            selection: Color::Yellow,
        },
        Theme::Light => Palette {
            header: Color::DarkBlue,
            badge_ok: Color::DarkGreen,
            badge_err: Color::DarkRed,
            muted: Color::Grey,
            selection: Color::DarkMagenta,
        },
    }
}

pub async fn run_app<W: Write>(out: &mut W) -> Result<()> {
    let api = ApiClient::from_env();
    let mut controller = TaskListController::new(api)?;
    controller.load().await;
    controller.refresh_status().await;

    let mut state = AppState::new(theme::init_theme());
    let mut last_ping = Instant::now();

    loop {
        state.clamp_selection(controller.tasks().len());
        draw(out, &controller, &state)?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && !handle_key(key, &mut controller, &mut state).await?
                {
                    break;
                }
            }
        }

        let deleted = controller.expire_pending().await;
        if !deleted.is_empty() {
            state.message = None;
        }

        if last_ping.elapsed() >= PING_EVERY {
            controller.refresh_status().await;
            last_ping = Instant::now();
        }
    }

    Ok(())
}

/// Returns false when the app should exit.
async fn handle_key(
    key: KeyEvent,
    controller: &mut TaskListController,
    state: &mut AppState,
) -> Result<bool> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(false);
    }

    match state.mode {
        AppMode::AddingTask => handle_adding_key(key, controller, state).await,
        AppMode::Normal => handle_normal_key(key, controller, state).await,
    }
}

async fn handle_adding_key(
    key: KeyEvent,
    controller: &mut TaskListController,
    state: &mut AppState,
) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            state.input.title.clear();
            state.mode = AppMode::Normal;
        }
        KeyCode::Enter => {
            state.mode = AppMode::Normal;
            match state.input.take_title() {
                Some(title) => match controller.add(&title).await {
                    Ok(Some(task)) => {
                        state.selected_index = 0;
                        state.message = Some(format!("Added '{}'", task.title));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Add failed: {e}");
                        state.message = Some(format!("Add failed: {e}"));
                    }
                },
                None => state.message = Some("Title must not be empty".to_string()),
            }
        }
        KeyCode::Backspace => state.input.handle_backspace(),
        KeyCode::Char(c) => state.input.handle_char(c),
        _ => {}
    }
    Ok(true)
}

async fn handle_normal_key(
    key: KeyEvent,
    controller: &mut TaskListController,
    state: &mut AppState,
) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
        KeyCode::Up | KeyCode::Char('k') => state.move_selection_up(),
        KeyCode::Down | KeyCode::Char('j') => {
            state.move_selection_down(controller.tasks().len())
        }
        KeyCode::Char('a') => {
            state.mode = AppMode::AddingTask;
            state.message = None;
        }
        KeyCode::Char(' ') => {
            if let Some(task) = controller.tasks().get(state.selected_index) {
                let id = task.id;
                if let Err(e) = controller.toggle(id).await {
                    warn!("Toggle failed: {e}");
                    state.message = Some(format!("Toggle failed: {e}"));
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(task) = controller.tasks().get(state.selected_index) {
                let id = task.id;
                let title = task.title.clone();
                controller.delete(id);
                state.message = Some(format!("Task '{title}' deleted — press u to undo"));
            }
        }
        KeyCode::Char('u') => {
            if controller.undo_last() {
                state.message = Some("Restored".to_string());
            }
        }
        KeyCode::Char('c') => {
            let cleared = controller.clear_completed().await;
            state.message = Some(format!("Cleared {cleared} completed task(s)"));
        }
        KeyCode::Char('r') => {
            controller.load().await;
            controller.refresh_status().await;
            state.message = Some("Reloaded".to_string());
        }
        KeyCode::Char('t') => {
            state.toggle_theme();
            if let Err(e) = theme::set_theme(state.theme) {
                warn!("Failed to persist theme: {e}");
            }
        }
        _ => {}
    }
    Ok(true)
}

fn draw<W: Write>(out: &mut W, controller: &TaskListController, state: &AppState) -> Result<()> {
    let colors = palette(state.theme);

    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    queue!(
        out,
        SetForegroundColor(colors.header),
        Print("TaskBuddy"),
        ResetColor,
        Print("   ")
    )?;

    match controller.status() {
        BackendStatus::Online(text) => {
            queue!(
                out,
                SetForegroundColor(colors.badge_ok),
                Print(format!("🟢 {text}")),
                ResetColor
            )?;
        }
        BackendStatus::Offline => {
            queue!(
                out,
                SetForegroundColor(colors.badge_err),
                Print("🔴 Offline"),
                ResetColor
            )?;
        }
        BackendStatus::Unknown => {}
    }
    queue!(out, Print("\r\n"))?;

    if controller.is_unreachable() {
        queue!(
            out,
            SetForegroundColor(colors.badge_err),
            Print("⚠️  Backend unreachable — showing cached tasks\r\n"),
            ResetColor
        )?;
    }
    queue!(out, Print("\r\n"))?;

    if controller.tasks().is_empty() {
        queue!(
            out,
            SetForegroundColor(colors.muted),
            Print("No tasks. Press 'a' to add one.\r\n"),
            ResetColor
        )?;
    }

    for (i, task) in controller.tasks().iter().enumerate() {
        let marker = if i == state.selected_index { "▶ " } else { "  " };
        let check = if task.done { "✅" } else { "⬜" };
        let line = format!("{marker}{check} {}  ", task.title);

        if i == state.selected_index {
            queue!(
                out,
                SetForegroundColor(colors.selection),
                Print(line),
                ResetColor
            )?;
        } else {
            queue!(out, Print(line))?;
        }
        queue!(
            out,
            SetForegroundColor(colors.muted),
            Print(format!("(#{})\r\n", task.id)),
            ResetColor
        )?;
    }

    queue!(
        out,
        Print(format!("\r\n{} remaining\r\n", controller.remaining()))
    )?;

    // Undo toasts with live countdown, one per pending deletion.
    let now = Instant::now();
    for pending in controller.pending() {
        let secs = pending.remaining(now).as_secs_f32().ceil() as u64;
        queue!(
            out,
            SetForegroundColor(colors.badge_err),
            Print(format!(
                "🗑  '{}' will be deleted in {secs}s — press u to undo\r\n",
                pending.task.title
            )),
            ResetColor
        )?;
    }

    if let Some(message) = &state.message {
        queue!(
            out,
            SetForegroundColor(colors.muted),
            Print(format!("{message}\r\n")),
            ResetColor
        )?;
    }

    match state.mode {
        AppMode::AddingTask => {
            queue!(
                out,
                Print(format!("\r\nNew task: {}_\r\n", state.input.title)),
                SetForegroundColor(colors.muted),
                Print("Enter to save, Esc to cancel\r\n"),
                ResetColor
            )?;
        }
        AppMode::Normal => {
            queue!(
                out,
                SetForegroundColor(colors.muted),
                Print(
                    "\r\n↑/↓ select · space toggle · a add · d delete · u undo · c clear done · r reload · t theme · q quit\r\n"
                ),
                ResetColor
            )?;
        }
    }

    out.flush()?;
    Ok(())
}
