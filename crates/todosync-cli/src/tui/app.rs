//! Application state and logic

use todosync_core::{Applied, Completion, Dispatcher, StatusFilter, TodoState, VisibleTask};
use tracing::debug;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Typing into the new-todo input
    Editing,
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Synchronization state
    pub state: TodoState,
    /// Sends requests; results come back on the completion channel
    dispatcher: Dispatcher,
    /// Selected row in the visible list
    pub selected: usize,
    /// Animation frame counter for busy rows
    pub spinner_tick: usize,
    /// Whether help overlay is visible
    pub show_help: bool,
}

impl App {
    pub fn new(state: TodoState, dispatcher: Dispatcher) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            state,
            dispatcher,
            selected: 0,
            spinner_tick: 0,
            show_help: false,
        }
    }

    /// Request the owner's todos
    pub fn load(&mut self) {
        let owner = self.state.begin_load();
        self.dispatcher.load(owner);
    }

    /// Feed a finished request back into the state
    pub fn apply(&mut self, completion: Completion) {
        match self.state.apply(completion) {
            Ok(Applied::Cleared(report)) => {
                debug!(
                    "Clear finished: {} removed, {} failed",
                    report.removed.len(),
                    report.failures.len()
                );
            }
            Ok(applied) => debug!("Applied {:?}", applied),
            Err(e) => debug!("Completion failed: {}", e),
        }

        // Give focus back to the input once it re-opens
        if self.state.take_input_reopened() {
            self.input_mode = InputMode::Editing;
        }
        self.clamp_selection();
    }

    /// Advance time-based state: notice expiry and the spinner
    pub fn tick(&mut self) {
        self.state.tick();
        self.spinner_tick = self.spinner_tick.wrapping_add(1);
    }

    /// Tasks currently on screen
    pub fn visible(&self) -> Vec<VisibleTask> {
        self.state.visible()
    }

    pub fn current_task(&self) -> Option<VisibleTask> {
        self.visible().into_iter().nth(self.selected)
    }

    /// Move selection up
    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Move selection down
    pub fn move_down(&mut self) {
        let len = self.visible().len();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.state.set_filter(filter);
        self.clamp_selection();
    }

    /// Focus the input; typing stays ignored while an add is in flight
    pub fn enter_editing(&mut self) {
        self.input_mode = InputMode::Editing;
    }

    pub fn exit_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Insert a character into the draft
    pub fn insert_char(&mut self, c: char) {
        if self.state.input_disabled() {
            return;
        }
        let mut draft = self.state.draft().to_string();
        draft.push(c);
        self.state.set_draft(draft);
    }

    /// Delete the last character of the draft
    pub fn delete_char(&mut self) {
        if self.state.input_disabled() {
            return;
        }
        let mut draft = self.state.draft().to_string();
        draft.pop();
        self.state.set_draft(draft);
    }

    /// Submit the draft as a new todo
    pub fn submit(&mut self) {
        match self.state.submit_draft() {
            Ok(ticket) => self.dispatcher.create(ticket),
            Err(e) => debug!("Add not sent: {}", e),
        }
    }

    /// Delete the selected todo
    pub fn delete_current(&mut self) {
        let Some(task) = self.current_task() else {
            return;
        };
        match self.state.begin_delete(&task.id) {
            Ok(id) => self.dispatcher.delete(id),
            Err(e) => debug!("Delete not sent: {}", e),
        }
    }

    /// Delete every completed todo
    pub fn clear_completed(&mut self) {
        if !self.state.has_completed() {
            return;
        }
        let batch = self.state.begin_clear_completed();
        self.dispatcher.clear(batch);
    }

    /// Dismiss the error notice
    pub fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}
