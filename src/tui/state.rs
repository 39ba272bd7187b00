use crate::theme::Theme;

/// UI-side state for the interactive list. Task data itself lives in the
/// controller; this is only selection, input, and transient messaging.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub selected_index: usize,
    pub mode: AppMode,
    pub message: Option<String>,
    pub input: TitleInput,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    AddingTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitleInput {
    pub title: String,
}

impl TitleInput {
    pub fn handle_char(&mut self, c: char) {
        self.title.push(c);
    }

    pub fn handle_backspace(&mut self) {
        self.title.pop();
    }

    /// Take the buffered title if it is non-empty after trimming.
    pub fn take_title(&mut self) -> Option<String> {
        let title = self.title.trim().to_string();
        self.title.clear();
        if title.is_empty() {
            None
        } else {
            Some(title)
        }
    }
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        AppState {
            selected_index: 0,
            mode: AppMode::Normal,
            message: None,
            input: TitleInput::default(),
            theme,
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_selection_down(&mut self, task_count: usize) {
        if self.selected_index + 1 < task_count {
            self.selected_index += 1;
        }
    }

    /// Keep the selection valid after the list shrinks.
    pub fn clamp_selection(&mut self, task_count: usize) {
        if task_count == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= task_count {
            self.selected_index = task_count - 1;
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }
}
