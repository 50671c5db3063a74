use crate::clipboard::ClipboardSink;
use crate::config::AppConfig;
use crate::editor::{EditorSession, EditorState};
use crate::export::{ExportKind, ExportSettings, TempFileStore};
use crate::layout::{CellMetrics, ListLayout, Presentation};
use crate::model::{EntryId, EntryStatus, FormulaList};
use crate::render::{ChannelEvent, Delivery, Purpose, RenderChannel, RenderPipeline, RenderRecord};
use crate::svg::{PaintStyle, ResvgRenderer};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Editing,
    Help,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    SaveAs,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Open => "Open",
            PromptKind::SaveAs => "Save as",
        }
    }
}

/// A file path being typed on the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrompt {
    pub kind: PromptKind,
    pub input: String,
}

pub type Pipeline = RenderPipeline<Box<dyn RenderChannel>>;

pub struct AppState {
    pub running: bool,
    pub mode: AppMode,
    pub config: AppConfig,
    pub list: FormulaList,
    pub editor: Option<EditorSession>,
    pub pipeline: Pipeline,
    pub presentation: Presentation,
    pub layout: ListLayout,
    pub renderer: ResvgRenderer,
    pub temp_files: TempFileStore,
    pub clipboard: Box<dyn ClipboardSink>,
    pub default_export: ExportKind,
    pub filename: Option<PathBuf>,
    pub is_dirty: bool,
    pub prompt: Option<PathPrompt>,

    // Viewport state
    pub scroll_top: u32,
    pub terminal_width: u16,
    pub terminal_height: u16,

    // Message for status line
    pub message: Option<String>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        channel: Box<dyn RenderChannel>,
        events: Receiver<ChannelEvent>,
        clipboard: Box<dyn ClipboardSink>,
    ) -> Self {
        let timeout = Duration::from_millis(config.render.timeout_ms);
        let presentation = Presentation::new(&config.display, CellMetrics::default());

        Self {
            running: true,
            mode: AppMode::Normal,
            list: FormulaList::new(),
            editor: None,
            pipeline: RenderPipeline::new(channel, events, timeout),
            presentation,
            layout: ListLayout::new(),
            renderer: ResvgRenderer::new(),
            temp_files: TempFileStore::new(),
            clipboard,
            default_export: config.export.default,
            filename: config.filename.clone(),
            is_dirty: false,
            prompt: None,
            scroll_top: 0,
            terminal_width: 80,
            terminal_height: 24,
            message: None,
            config,
        }
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings::from_config(&self.config)
    }

    pub fn paint_style(&self, selected: bool) -> PaintStyle {
        let theme = &self.config.theme;
        if selected {
            PaintStyle {
                foreground: theme.selection_foreground,
                background: theme.selection_background,
            }
        } else {
            PaintStyle {
                foreground: theme.foreground,
                background: theme.background,
            }
        }
    }

    /// The entry the view should keep on screen.
    pub fn focus_entry(&self) -> Option<EntryId> {
        self.editor
            .as_ref()
            .map(EditorSession::entry)
            .or_else(|| self.list.selected())
    }

    /// Queues formulas for rendering into new entries at the end of the list.
    /// Entries arriving this way do not mark the list as changed.
    pub fn enqueue_formulas(&mut self, formulas: &[String]) {
        for formula in formulas {
            let deliveries = self.pipeline.enqueue_append(formula);
            self.apply_deliveries(deliveries);
        }
    }

    /// Sends the editor's current text for a live preview.
    pub fn request_preview(&mut self) {
        let Some(text) = self.editor.as_ref().map(|s| s.desired_formula().to_string()) else {
            return;
        };
        let deliveries = self.pipeline.request_preview(&text);
        self.apply_deliveries(deliveries);
    }

    /// Applies whatever the render pipeline has produced and settles a
    /// pending commit once its render arrives or its deadline passes.
    pub fn pump(&mut self, now: Instant) {
        let deliveries = self.pipeline.poll(now);
        self.apply_deliveries(deliveries);
        self.settle_commit(now);
    }

    pub fn apply_deliveries(&mut self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            self.apply_delivery(delivery);
        }
    }

    fn apply_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Appended(record) => {
                let id = self.place_arrival(EntryStatus::Ready(record));
                self.presentation.invalidate(id);
                if self.editor.is_none() {
                    self.list.select(id);
                }
            }
            Delivery::Preview(record) => {
                if let Some(session) = self.editor.as_mut() {
                    if session.accept_preview(record) {
                        self.presentation.invalidate(session.entry());
                    }
                }
            }
            Delivery::Failed {
                formula,
                purpose: Purpose::Append,
                error,
            } => {
                warn!("Render of {:?} failed: {}", formula, error);
                let id = self.place_arrival(EntryStatus::Failed {
                    formula,
                    reason: error.to_string(),
                });
                self.presentation.invalidate(id);
                if self.editor.is_none() {
                    self.list.select(id);
                }
                self.set_message(format!("Render failed: {}", error));
            }
            Delivery::Failed {
                formula,
                purpose: Purpose::Preview,
                error,
            } => {
                if let Some(session) = self.editor.as_mut() {
                    if session.preview_failed(&formula, error.to_string()) {
                        self.presentation.invalidate(session.entry());
                    }
                }
            }
        }
    }

    // Arrivals go before a blank tail entry being edited so it stays last.
    fn place_arrival(&mut self, status: EntryStatus) -> EntryId {
        let before = self
            .editor
            .as_ref()
            .map(EditorSession::entry)
            .filter(|&tail| {
                self.list.is_last(tail)
                    && self
                        .list
                        .get(tail)
                        .is_some_and(|entry| entry.status == EntryStatus::Empty)
            })
            .and_then(|tail| self.list.position(tail));

        let id = self.list.append(status);
        if let Some(index) = before {
            let last = self.list.len() - 1;
            if let Err(err) = self.list.move_entry(last, index) {
                debug!("Could not keep edited entry last: {}", err);
            }
        }
        id
    }

    fn settle_commit(&mut self, now: Instant) {
        let Some(session) = self.editor.as_ref() else {
            return;
        };
        let EditorState::PendingRender { deadline } = session.state() else {
            return;
        };
        if let Some(record) = session.ready_record().cloned() {
            self.finish_commit(record);
        } else if let Some(reason) = session.preview_error().map(str::to_string) {
            self.fail_commit(reason);
        } else if now >= deadline {
            info!("Commit render did not arrive in time");
            if let Some(session) = self.editor.as_mut() {
                session.stall();
            }
            self.set_message("Render is taking too long: Ctrl+R to retry, Ctrl+D to discard");
        }
    }

    /// Opens the inline editor on `id`.
    pub fn open_editor(&mut self, id: EntryId) -> bool {
        if self.editor.is_some() {
            return false;
        }
        let Some(entry) = self.list.get(id) else {
            return false;
        };
        let session = EditorSession::open(id, &entry.status);
        let needs_preview = session.ready_record().is_none() && !session.text().is_empty();
        if self.list.set_editing(id, true).is_err() {
            return false;
        }
        debug!("Opened editor on entry {:?}", id);
        self.list.select(id);
        self.editor = Some(session);
        self.mode = AppMode::Editing;
        self.presentation.invalidate(id);
        if needs_preview {
            self.request_preview();
        }
        true
    }

    /// Creates an empty entry at the end of the list and edits it.
    pub fn append_new_and_edit(&mut self) -> Option<EntryId> {
        if self.editor.is_some() {
            return None;
        }
        let id = self.list.append_empty();
        self.open_editor(id).then_some(id)
    }

    /// Writes `record` into the edited entry and closes the editor. When the
    /// entry is the last one, a fresh entry is appended and opened.
    pub fn finish_commit(&mut self, record: RenderRecord) {
        let Some(session) = self.close_editor() else {
            return;
        };
        let id = session.entry();
        let unchanged = self.list.get(id).and_then(|e| e.status.record()) == Some(&record);
        if self.list.replace_render_record(id, record).is_err() {
            warn!("Edited entry vanished before commit");
            return;
        }
        if !unchanged {
            self.is_dirty = true;
        }
        self.set_message("Formula saved");
        if self.list.is_last(id) {
            self.append_new_and_edit();
        }
    }

    /// Marks the edited entry as failed with the current text.
    pub fn fail_commit(&mut self, reason: String) {
        let Some(session) = self.close_editor() else {
            return;
        };
        let id = session.entry();
        if self.list.set_failed(id, session.text(), reason.clone()).is_ok() {
            self.is_dirty = true;
        }
        self.set_message(format!("Render failed: {}", reason));
    }

    /// Closes the editor without writing. An entry that never held a
    /// formula is removed.
    pub fn abort_edit(&mut self) {
        let Some(session) = self.close_editor() else {
            return;
        };
        if !session.had_content() {
            self.list.remove(session.entry());
        }
    }

    fn close_editor(&mut self) -> Option<EditorSession> {
        let session = self.editor.take()?;
        let id = session.entry();
        if let Err(err) = self.list.set_editing(id, false) {
            debug!("Edited entry vanished before close: {}", err);
        }
        self.presentation.invalidate(id);
        self.mode = AppMode::Normal;
        Some(session)
    }
}
