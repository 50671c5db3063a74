use crate::app::AppState;
use crate::layout::EntrySlot;
use crate::model::{EntryId, EntryStatus};
use crate::svg::{self, Rgb};
use crate::ui::editor::EditorRenderer;
use log::debug;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};
use resvg::tiny_skia::Pixmap;

const UPPER_HALF: &str = "▀";
const EMPTY_HINT: &str = "No formulas yet. Press a to add one, ? for help.";

pub fn rgb_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Draws `pixmap` into `area`, two pixel rows per cell: the upper pixel as
/// the foreground of a half block, the lower one as its background.
/// `skip_rows` cell rows are cut from the top of the image.
pub fn paint_half_blocks(buf: &mut Buffer, area: Rect, pixmap: &Pixmap, skip_rows: u16) {
    let cols = area.width.min(u16::try_from(pixmap.width()).unwrap_or(u16::MAX));
    for row in 0..area.height {
        let top_y = u32::from(row + skip_rows) * 2;
        if top_y >= pixmap.height() {
            break;
        }
        for col in 0..cols {
            let x = u32::from(col);
            let Some(top) = pixmap.pixel(x, top_y) else {
                continue;
            };
            let bottom = pixmap.pixel(x, top_y + 1).unwrap_or(top);
            let (top, bottom) = (top.demultiply(), bottom.demultiply());
            if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                cell.set_symbol(UPPER_HALF)
                    .set_fg(Color::Rgb(top.red(), top.green(), top.blue()))
                    .set_bg(Color::Rgb(bottom.red(), bottom.green(), bottom.blue()));
            }
        }
    }
}

pub struct ListRenderer;

impl ListRenderer {
    pub fn render(frame: &mut Frame, app: &mut AppState, area: Rect) {
        let background = Style::default().bg(rgb_color(app.config.theme.background));
        frame.render_widget(Block::default().style(background), area);

        app.layout.update(
            &app.list,
            app.editor.as_ref(),
            &mut app.presentation,
            area.width,
        );

        if app.list.is_empty() {
            let hint = Paragraph::new(EMPTY_HINT)
                .style(background.fg(rgb_color(app.config.theme.foreground)))
                .wrap(Wrap { trim: true });
            frame.render_widget(hint, area);
            return;
        }

        let max_scroll = app.layout.total_rows().saturating_sub(u32::from(area.height));
        app.scroll_top = app.scroll_top.min(max_scroll);
        if let Some(focus) = app.focus_entry() {
            app.scroll_top = app.layout.scroll_to_show(focus, app.scroll_top, area.height);
        }

        for (id, slot) in app.layout.visible_entries(app.scroll_top, area.height) {
            Self::render_entry(frame, app, area, id, slot);
        }
    }

    fn render_entry(frame: &mut Frame, app: &mut AppState, area: Rect, id: EntryId, slot: EntrySlot) {
        let scroll_top = app.scroll_top;
        let skip_rows = scroll_top.saturating_sub(slot.top) as u16;
        let y = area.y + slot.top.saturating_sub(scroll_top) as u16;
        let bottom = (area.y + area.height).min(y.saturating_add(slot.rows - skip_rows));
        if y >= bottom {
            return;
        }
        let row_rect = Rect::new(area.x, y, area.width, bottom - y);

        let Some(entry) = app.list.get(id) else {
            return;
        };
        if entry.editing {
            EditorRenderer::render(frame, app, row_rect);
            return;
        }

        let selected = app.list.selected() == Some(id);
        let style = app.paint_style(selected);
        let row_style = Style::default()
            .fg(rgb_color(style.foreground))
            .bg(rgb_color(style.background));
        frame.render_widget(Block::default().style(row_style), row_rect);

        match entry.status.clone() {
            EntryStatus::Ready(record) => {
                let cols = slot.cols.min(area.width);
                if app.layout.thumbnail(id, cols, slot.rows, selected).is_none() {
                    match Pixmap::new(u32::from(cols), u32::from(slot.rows) * 2) {
                        Some(mut pixmap) => {
                            let padding = app.presentation.vertical_padding();
                            match svg::paint_entry(&record, &style, &mut pixmap, &mut app.renderer, padding) {
                                Ok(()) => app.layout.store_thumbnail(id, cols, slot.rows, selected, pixmap),
                                Err(err) => debug!("No preview for {:?}: {}", record.formula(), err),
                            }
                        }
                        None => debug!("Empty thumbnail for {:?}", record.formula()),
                    }
                }
                match app.layout.thumbnail(id, cols, slot.rows, selected) {
                    Some(pixmap) => {
                        let rect = Rect::new(row_rect.x, row_rect.y, cols, row_rect.height);
                        paint_half_blocks(frame.buffer_mut(), rect, pixmap, skip_rows);
                    }
                    None => {
                        let text = Paragraph::new(record.formula().to_string()).style(row_style);
                        frame.render_widget(text, row_rect);
                    }
                }
            }
            EntryStatus::Empty => {
                let text = Paragraph::new("…").style(row_style.add_modifier(Modifier::DIM));
                frame.render_widget(text, row_rect);
            }
            EntryStatus::Failed { formula, reason } => {
                let line = Line::from(vec![
                    Span::styled("✗ ", row_style.fg(Color::Red).add_modifier(Modifier::BOLD)),
                    Span::styled(formula, row_style),
                    Span::styled(format!("  ({})", reason), row_style.fg(Color::Red)),
                ]);
                let text = Paragraph::new(line).wrap(Wrap { trim: false });
                frame.render_widget(text, row_rect);
            }
        }
    }
}
