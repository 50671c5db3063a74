use crate::app::{AppMode, AppState};
use crate::editor::EditorState;
use crate::model::EntryStatus;
use unicode_width::UnicodeWidthStr;
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    widgets::Paragraph,
    Frame,
};

const EDIT_HINTS: &str = "EDIT | Ctrl+S save | Ctrl+D discard | Enter new line | Ctrl+V paste";
const STALLED_HINTS: &str = "EDIT | render stalled | Ctrl+R retry | Ctrl+D discard";

// Status line renderer
pub struct StatusLineRenderer;

impl StatusLineRenderer {
    pub fn render(frame: &mut Frame, app: &AppState, area: Rect) {
        let (content, style) = Self::get_content_and_style(app);
        if app.mode == AppMode::Prompt {
            let width = u16::try_from(content.width()).unwrap_or(u16::MAX);
            let x = area.x.saturating_add(width).min(area.right().saturating_sub(1));
            frame.set_cursor_position(Position::new(x, area.y));
        }
        frame.render_widget(Paragraph::new(content).style(style), area);
    }

    fn get_content_and_style(app: &AppState) -> (String, Style) {
        match app.mode {
            AppMode::Normal => Self::render_normal_mode(app),
            AppMode::Editing => Self::render_edit_mode(app),
            AppMode::Help => Self::render_help_mode(),
            AppMode::Prompt => Self::render_prompt_mode(app),
        }
    }

    fn render_normal_mode(app: &AppState) -> (String, Style) {
        if let Some(ref msg) = app.message {
            let style = Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD);
            return (msg.clone(), style);
        }

        let mut content = format!(
            "mathmemo | {} formulas | copy: {}",
            app.list.len(),
            app.default_export.label()
        );
        if let Some(name) = app.filename.as_ref().and_then(|p| p.file_name()) {
            content.push_str(&format!(" | {}", name.to_string_lossy()));
        }
        if app.is_dirty {
            content.push_str(" [+]");
        }
        if let Some(formula) = app
            .list
            .selected()
            .and_then(|id| app.list.get(id))
            .and_then(|entry| entry.status.formula())
        {
            content.push_str(&format!(" | {}", formula.replace('\n', " ")));
        }
        if !app.pipeline.is_ready() {
            content.push_str(" | starting renderer...");
        } else if !app.pipeline.is_idle() {
            content.push_str(" | rendering...");
        }

        (content, Style::default().fg(Color::Gray).bg(Color::Black))
    }

    fn render_edit_mode(app: &AppState) -> (String, Style) {
        let stalled = app
            .editor
            .as_ref()
            .is_some_and(|session| session.state() == EditorState::Stalled);
        let failed = app
            .editor
            .as_ref()
            .and_then(|session| app.list.get(session.entry()))
            .is_some_and(|entry| matches!(entry.status, EntryStatus::Failed { .. }));

        let content = match (&app.message, stalled) {
            (_, true) => STALLED_HINTS.to_string(),
            (Some(msg), false) => format!("EDIT | {}", msg),
            (None, false) if failed => format!("{} | last render failed", EDIT_HINTS),
            (None, false) => EDIT_HINTS.to_string(),
        };
        let style = Style::default()
            .fg(Color::Black)
            .bg(if stalled { Color::Yellow } else { Color::Cyan })
            .add_modifier(Modifier::BOLD);

        (content, style)
    }

    fn render_prompt_mode(app: &AppState) -> (String, Style) {
        let content = match &app.prompt {
            Some(prompt) => format!("{}: {}", prompt.kind.label(), prompt.input),
            None => String::new(),
        };
        let style = Style::default().fg(Color::Black).bg(Color::Green);
        (content, style)
    }

    fn render_help_mode() -> (String, Style) {
        let content = String::from("Press ESC or q to close help");
        let style = Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        (content, style)
    }
}
