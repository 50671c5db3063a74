use crate::app::AppState;
use crate::editor::{EditorState, PreviewStatus, PREVIEW_ROWS};
use crate::svg;
use crate::ui::list::{paint_half_blocks, rgb_color};
use log::debug;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use resvg::tiny_skia::Pixmap;

const TITLE: &str = " Edit formula ";

// Inline editor: text lines, a status row and the live preview strip.
pub struct EditorRenderer;

impl EditorRenderer {
    pub fn render(frame: &mut Frame, app: &mut AppState, area: Rect) {
        let Some(session) = app.editor.as_ref() else {
            return;
        };
        let theme = &app.config.theme;
        let base = Style::default()
            .fg(rgb_color(theme.foreground))
            .bg(rgb_color(theme.background));
        let accent = rgb_color(theme.selection_background);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(TITLE)
            .border_style(base.fg(accent))
            .style(base);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let text_rows = session.line_count() as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(text_rows),
                Constraint::Length(1),
                Constraint::Length(PREVIEW_ROWS),
            ])
            .split(inner);

        // Keep the cursor column visible on long lines.
        let (line, col) = session.cursor_line_col();
        let width = usize::from(chunks[0].width.max(1));
        let h_scroll = col.saturating_sub(width - 1);
        let lines: Vec<Line> = session.text().split('\n').map(Line::from).collect();
        let text = Paragraph::new(lines)
            .style(base)
            .scroll((0, h_scroll as u16));
        frame.render_widget(text, chunks[0]);

        let cursor_y = chunks[0].y + line as u16;
        if cursor_y < chunks[0].y + chunks[0].height {
            let cursor_x = chunks[0].x + (col - h_scroll) as u16;
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }

        let (status, status_style) = match (session.state(), session.preview_status()) {
            (EditorState::Stalled, _) => (
                String::from("stalled: Ctrl+R retry / Ctrl+D discard"),
                base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            (EditorState::PendingRender { .. }, _) => {
                (String::from("saving..."), base.add_modifier(Modifier::ITALIC))
            }
            (EditorState::Opened, PreviewStatus::Failed(reason)) => {
                (format!("error: {}", reason), base.fg(Color::Red))
            }
            (EditorState::Opened, PreviewStatus::Rendering) => (
                String::from("rendering..."),
                base.add_modifier(Modifier::DIM),
            ),
            (EditorState::Opened, PreviewStatus::Ready | PreviewStatus::Idle) => (
                String::from("Ctrl+S save | Ctrl+D discard"),
                base.add_modifier(Modifier::DIM),
            ),
        };
        frame.render_widget(Paragraph::new(status).style(status_style), chunks[1]);

        Self::render_preview(frame, app, chunks[2]);
    }

    // The latest preview, even while a newer one renders, so the strip
    // does not flicker between keystrokes.
    fn render_preview(frame: &mut Frame, app: &mut AppState, area: Rect) {
        if area.height == 0 {
            return;
        }
        let Some(session) = app.editor.as_ref() else {
            return;
        };
        let id = session.entry();
        let Some(record) = session.preview().cloned() else {
            return;
        };

        if app.layout.thumbnail(id, area.width, area.height, false).is_none() {
            let style = app.paint_style(false);
            let padding = app.presentation.vertical_padding();
            let Some(mut pixmap) = Pixmap::new(u32::from(area.width), u32::from(area.height) * 2)
            else {
                return;
            };
            if let Err(err) = svg::paint_entry(&record, &style, &mut pixmap, &mut app.renderer, padding) {
                debug!("Preview of {:?} not painted: {}", record.formula(), err);
                return;
            }
            app.layout
                .store_thumbnail(id, area.width, area.height, false, pixmap);
        }
        if let Some(pixmap) = app.layout.thumbnail(id, area.width, area.height, false) {
            paint_half_blocks(frame.buffer_mut(), area, pixmap, 0);
        }
    }
}
