//! The inline editor session bound to one list entry.
//!
//! The session never writes to the list. It keeps the text being edited and
//! the most recent preview for it; the edit actions decide what to store in
//! the entry on commit or abort.

use std::time::Instant;

use log::debug;
use unicode_width::UnicodeWidthStr;

use crate::layout::{CellMetrics, Size};
use crate::model::{EntryId, EntryStatus};
use crate::render::RenderRecord;

/// Border rows plus the status row of the editor block.
pub const EDITOR_CHROME_ROWS: u16 = 3;
/// Rows reserved for the live preview inside the editor block.
pub const PREVIEW_ROWS: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Opened,
    /// A commit is waiting for the render of the current text.
    PendingRender { deadline: Instant },
    /// The commit wait ran out. The user may retry or discard.
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewStatus {
    Idle,
    Rendering,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    entry: EntryId,
    text: String,
    cursor: usize,
    preview: Option<RenderRecord>,
    preview_error: Option<String>,
    state: EditorState,
    had_content: bool,
}

impl EditorSession {
    /// Opens a session on `entry`, seeded from its current status. A rendered
    /// entry starts with its own record as the preview, so committing it
    /// unchanged needs no render.
    pub fn open(entry: EntryId, status: &EntryStatus) -> Self {
        let text = status.formula().unwrap_or_default().to_string();
        Self {
            entry,
            cursor: text.len(),
            text,
            preview: status.record().cloned(),
            preview_error: None,
            state: EditorState::Opened,
            had_content: !matches!(status, EntryStatus::Empty),
        }
    }

    pub fn entry(&self) -> EntryId {
        self.entry
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the cursor, always on a char boundary.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn desired_formula(&self) -> &str {
        &self.text
    }

    /// Whether the entry held a formula before editing started.
    pub fn had_content(&self) -> bool {
        self.had_content
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// The latest preview, even if the text has moved on since.
    pub fn preview(&self) -> Option<&RenderRecord> {
        self.preview.as_ref()
    }

    /// The preview, only when it matches the current text.
    pub fn ready_record(&self) -> Option<&RenderRecord> {
        self.preview
            .as_ref()
            .filter(|record| record.formula() == self.text)
    }

    pub fn preview_status(&self) -> PreviewStatus {
        if self.ready_record().is_some() {
            PreviewStatus::Ready
        } else if let Some(reason) = &self.preview_error {
            PreviewStatus::Failed(reason.clone())
        } else if self.text.trim().is_empty() {
            PreviewStatus::Idle
        } else {
            PreviewStatus::Rendering
        }
    }

    /// Takes a preview result. Results for text that is no longer current
    /// are discarded and `false` is returned.
    pub fn accept_preview(&mut self, record: RenderRecord) -> bool {
        if record.formula() != self.text {
            debug!("Discarding stale preview for {:?}", record.formula());
            return false;
        }
        self.preview = Some(record);
        self.preview_error = None;
        true
    }

    /// Records a failed preview if it concerns the current text.
    pub fn preview_failed(&mut self, formula: &str, reason: impl Into<String>) -> bool {
        if formula != self.text {
            return false;
        }
        self.preview_error = Some(reason.into());
        true
    }

    pub fn preview_error(&self) -> Option<&str> {
        self.preview_error.as_deref()
    }

    pub fn begin_commit(&mut self, deadline: Instant) {
        self.state = EditorState::PendingRender { deadline };
    }

    pub fn stall(&mut self) {
        self.state = EditorState::Stalled;
    }

    pub fn resume(&mut self) {
        self.state = EditorState::Opened;
    }

    // Text editing

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.text_changed();
    }

    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
        self.text_changed();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) -> bool {
        match self.prev_boundary(self.cursor) {
            Some(start) => {
                self.text.replace_range(start..self.cursor, "");
                self.cursor = start;
                self.text_changed();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self) -> bool {
        match self.next_boundary(self.cursor) {
            Some(end) => {
                self.text.replace_range(self.cursor..end, "");
                self.text_changed();
                true
            }
            None => false,
        }
    }

    pub fn delete_word_backward(&mut self) -> bool {
        let start = self.word_start_before(self.cursor);
        if start == self.cursor {
            return false;
        }
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        self.text_changed();
        true
    }

    pub fn delete_to_line_end(&mut self) -> bool {
        let end = self.line_end(self.cursor);
        if end == self.cursor {
            return false;
        }
        self.text.replace_range(self.cursor..end, "");
        self.text_changed();
        true
    }

    pub fn delete_to_line_start(&mut self) -> bool {
        let start = self.line_start(self.cursor);
        if start == self.cursor {
            return false;
        }
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        self.text_changed();
        true
    }

    // Cursor movement

    pub fn move_left(&mut self) {
        if let Some(pos) = self.prev_boundary(self.cursor) {
            self.cursor = pos;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(pos) = self.next_boundary(self.cursor) {
            self.cursor = pos;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    pub fn move_end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    pub fn move_word_left(&mut self) {
        self.cursor = self.word_start_before(self.cursor);
    }

    pub fn move_word_right(&mut self) {
        let rest = &self.text[self.cursor..];
        let word_end = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map_or(rest.len(), |(i, _)| i);
        let after = &rest[word_end..];
        let gap = after
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map_or(after.len(), |(i, _)| i);
        self.cursor += word_end + gap;
    }

    pub fn move_up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            return;
        }
        let column = self.text[start..self.cursor].chars().count();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.offset_in_line(prev_start, column);
    }

    pub fn move_down(&mut self) {
        let end = self.line_end(self.cursor);
        if end == self.text.len() {
            return;
        }
        let column = self.text[self.line_start(self.cursor)..self.cursor]
            .chars()
            .count();
        self.cursor = self.offset_in_line(end + 1, column);
    }

    // Geometry

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Cursor position as (line, display column).
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let start = self.line_start(self.cursor);
        (line, self.text[start..self.cursor].width())
    }

    /// Size the editor wants in the list: full viewport width, tall enough
    /// for every text line, the preview strip and the block chrome.
    pub fn preferred_size(&self, metrics: CellMetrics, viewport_width: f32) -> Size {
        let rows = self.line_count() as f32 + f32::from(EDITOR_CHROME_ROWS + PREVIEW_ROWS);
        Size::new(viewport_width, rows * metrics.row_px)
    }

    fn text_changed(&mut self) {
        self.preview_error = None;
        if self.state != EditorState::Opened {
            self.state = EditorState::Opened;
        }
    }

    fn prev_boundary(&self, pos: usize) -> Option<usize> {
        self.text[..pos].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self, pos: usize) -> Option<usize> {
        self.text[pos..].chars().next().map(|c| pos + c.len_utf8())
    }

    fn line_start(&self, pos: usize) -> usize {
        self.text[..pos].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.text[pos..].find('\n').map_or(self.text.len(), |i| pos + i)
    }

    fn offset_in_line(&self, line_start: usize, column: usize) -> usize {
        let line_end = self.line_end(line_start);
        self.text[line_start..line_end]
            .char_indices()
            .nth(column)
            .map_or(line_end, |(i, _)| line_start + i)
    }

    fn word_start_before(&self, pos: usize) -> usize {
        let before = &self.text[..pos];
        let trimmed = before.trim_end_matches(char::is_whitespace);
        trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8())
    }
}
