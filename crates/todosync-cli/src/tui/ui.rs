//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use todosync_core::{LoadState, StatusFilter};

use super::app::{App, InputMode};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    let has_error = app.state.error_message().is_some();
    // The footer only exists while there is something to count
    let has_footer = !app.state.is_empty();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(if has_error { 1 } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(if has_footer { 1 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_input(frame, app, chunks[0]);
    if has_error {
        draw_error_banner(frame, app, chunks[1]);
    }
    draw_list(frame, app, chunks[2]);
    if has_footer {
        draw_footer(frame, app, chunks[3]);
    }
    draw_status_bar(frame, app, chunks[4]);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn spinner(app: &App) -> &'static str {
    SPINNER[app.spinner_tick % SPINNER.len()]
}

/// Draw the new-todo input
fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let disabled = app.state.input_disabled();
    let is_active = app.input_mode == InputMode::Editing;

    let border_style = if is_active && !disabled {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    let title = if disabled {
        format!(" {} Saving... ", spinner(app))
    } else {
        " What needs to be done? ".to_string()
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let text_style = if disabled {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(Span::styled(app.state.draft(), text_style)).block(block);
    frame.render_widget(paragraph, area);

    if is_active && !disabled {
        let typed = u16::try_from(app.state.draft().chars().count()).unwrap_or(u16::MAX);
        let cursor_x = area
            .x
            .saturating_add(1)
            .saturating_add(typed)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

/// Draw the current error notice
fn draw_error_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(message) = app.state.error_message() else {
        return;
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" ✗ {}", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  (Esc to dismiss)", Style::default().add_modifier(Modifier::DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the todo list
fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.input_mode == InputMode::Normal;
    let visible = app.visible();

    let items: Vec<ListItem> = visible
        .iter()
        .map(|task| {
            let busy = if app.state.is_pending(&task.id) {
                spinner(app)
            } else {
                " "
            };
            let mark = if task.completed { "[x]" } else { "[ ]" };

            let title_style = if task.completed {
                Style::default().add_modifier(Modifier::CROSSED_OUT | Modifier::DIM)
            } else if task.is_pending() {
                Style::default().add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", busy), Style::default().fg(Color::Yellow)),
                Span::raw(format!("{} ", mark)),
                Span::styled(task.title.clone(), title_style),
            ]))
        })
        .collect();

    let border_style = if is_active {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let title = match app.state.load_state() {
        LoadState::Loading => format!(" todos {} ", spinner(app)),
        _ => " todos ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    if items.is_empty() {
        let hint = match app.state.load_state() {
            LoadState::Loading => "Loading...",
            LoadState::Failed => "Could not load todos",
            _ => "Nothing here yet",
        };
        let paragraph = Paragraph::new(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let highlight_style = if is_active {
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style);

    let mut state = ListState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw counter, filter tabs and the clear-completed hint
fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(format!(
        " {} items left  ",
        app.state.active_count()
    ))];

    for (i, filter) in StatusFilter::ALL.iter().enumerate() {
        let style = if *filter == app.state.filter() {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("{}:{}", i + 1, filter), style));
        spans.push(Span::raw(" "));
    }

    if app.state.has_completed() {
        spans.push(Span::styled(
            " c:Clear completed",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Draw the key hints at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.input_mode {
        InputMode::Editing => "Enter:add  Esc:done",
        InputMode::Normal => "a:add  d:delete  1/2/3:filter  Esc:dismiss  ?:help  q:quit",
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Calculate centered popup area
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = 16.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the popup area
    frame.render_widget(ratatui::widgets::Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  a, Enter    Type a new todo"),
        Line::from("  d           Delete todo"),
        Line::from("  c           Clear completed"),
        Line::from("  1/2/3       All / Active / Completed"),
        Line::from("  Esc         Dismiss error"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, popup_area);
}
