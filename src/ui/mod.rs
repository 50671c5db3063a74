mod editor;
mod help;
mod list;
mod status_line;

#[cfg(test)]
mod tests;

use crate::app::{AppMode, AppState};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io::{self, Stdout};

pub use editor::EditorRenderer;
pub use help::{HelpRenderer, HelpSection, SECTIONS};
pub use list::{paint_half_blocks, ListRenderer};
pub use status_line::StatusLineRenderer;

// Errors from setting up or tearing down the terminal.
#[derive(thiserror::Error, Debug)]
pub enum UiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

pub fn render(frame: &mut Frame, app: &mut AppState) {
    let area = frame.area();
    app.terminal_width = area.width;
    app.terminal_height = area.height;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    match app.mode {
        AppMode::Help => HelpRenderer::render(frame, chunks[0]),
        AppMode::Normal | AppMode::Editing | AppMode::Prompt => {
            ListRenderer::render(frame, app, chunks[0])
        }
    }
    StatusLineRenderer::render(frame, app, chunks[1]);
}

pub fn setup_terminal() -> Result<Tui, UiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Tui) -> Result<(), UiError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
