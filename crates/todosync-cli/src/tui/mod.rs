//! todosync TUI
//!
//! Terminal user interface for the todo list.
//!
//! ## Layout
//!
//! - Top: new-todo input (disabled while an add is being saved)
//! - Error banner (only while a notice is showing)
//! - Todo list, with a spinner on rows that have a request in flight
//! - Footer: items left, filter tabs, clear-completed hint
//!
//! ## Keys
//!
//! - j/k or ↑/↓: Move selection up/down
//! - a or Enter: Focus the input
//! - d: Delete selected todo
//! - c: Clear completed todos
//! - 1/2/3: Show All / Active / Completed
//! - Esc: Dismiss error (leaves the input when typing)
//! - q: Quit

mod app;
mod ui;

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use todosync_core::{Completion, Config, Dispatcher, OwnerId, RemoteStore, StatusFilter, TodoState};

use app::{App, InputMode};

/// Run the TUI application
pub async fn run(config: &Config, owner: OwnerId, remote: Arc<dyn RemoteStore>) -> Result<()> {
    let (dispatcher, completions) = Dispatcher::new(remote);
    let state = TodoState::new(owner).with_notice_timeout(config.notice_timeout());
    let mut app = App::new(state, dispatcher);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    info!("TUI started for owner {}", owner);
    app.load();

    let result = run_app(&mut terminal, &mut app, completions).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut completions: UnboundedReceiver<Completion>,
) -> Result<()> {
    loop {
        // Expire the notice and advance the spinner
        app.tick();

        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            biased;

            // Finished requests
            Some(completion) = completions.recv() => {
                app.apply(completion);
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                // Check for terminal events (non-blocking)
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        match app.input_mode {
                            InputMode::Normal => handle_normal_mode(app, key.code, key.modifiers),
                            InputMode::Editing => handle_editing_mode(app, key.code, key.modifiers),
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events in normal mode
fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        // Quit
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        // Navigation
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),

        // Input
        KeyCode::Char('a') | KeyCode::Char('i') | KeyCode::Enter => app.enter_editing(),

        // Actions
        KeyCode::Char('d') => app.delete_current(),
        KeyCode::Char('c') => app.clear_completed(),

        // Filters
        KeyCode::Char('1') => app.set_filter(StatusFilter::All),
        KeyCode::Char('2') => app.set_filter(StatusFilter::Active),
        KeyCode::Char('3') => app.set_filter(StatusFilter::Completed),

        KeyCode::Esc => app.dismiss_error(),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

/// Handle key events while typing a new todo
fn handle_editing_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Esc => app.exit_editing(),
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todosync_core::MemoryRemoteStore;

    fn app() -> App {
        let (dispatcher, _rx) = Dispatcher::new(Arc::new(MemoryRemoteStore::new()));
        App::new(TodoState::new(OwnerId(1)), dispatcher)
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.exit_editing();
        handle_normal_mode(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(app.should_quit);

        let mut app = self::app();
        handle_editing_mode(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_editing_keys_build_draft() {
        let mut app = app();
        for c in ['q', 'x', '1'] {
            handle_editing_mode(&mut app, KeyCode::Char(c), KeyModifiers::NONE);
        }
        handle_editing_mode(&mut app, KeyCode::Backspace, KeyModifiers::NONE);

        assert_eq!(app.state.draft(), "qx");
        assert!(!app.should_quit);

        handle_editing_mode(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_filter_keys() {
        let mut app = app();
        app.exit_editing();

        handle_normal_mode(&mut app, KeyCode::Char('3'), KeyModifiers::NONE);
        assert_eq!(app.state.filter(), StatusFilter::Completed);
        handle_normal_mode(&mut app, KeyCode::Char('2'), KeyModifiers::NONE);
        assert_eq!(app.state.filter(), StatusFilter::Active);
        handle_normal_mode(&mut app, KeyCode::Char('1'), KeyModifiers::NONE);
        assert_eq!(app.state.filter(), StatusFilter::All);
    }

    #[test]
    fn test_escape_in_normal_mode_dismisses_error() {
        let mut app = app();
        handle_editing_mode(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.state.error_message().is_some());

        handle_editing_mode(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.state.error_message().is_some());

        handle_normal_mode(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.state.error_message().is_none());
    }
}
