//! Size negotiation for list entries.
//!
//! [`Presentation`] answers how big an entry wants to be. [`ListLayout`]
//! caches those answers, turns them into terminal rows and keeps the painted
//! thumbnails, dropping both whenever an entry is invalidated.

use std::collections::{HashMap, HashSet};

use resvg::tiny_skia::Pixmap;

use crate::config::DisplaySettings;
use crate::editor::EditorSession;
use crate::model::{Entry, EntryId, FormulaList};
use crate::render::RenderRecord;
use crate::svg;

/// Size reported for entries with nothing to show yet.
pub const PLACEHOLDER_SIZE: Size = Size {
    width: 500.0,
    height: 64.0,
};

/// Tallest a rendered entry may get, in rows.
pub const MAX_ENTRY_ROWS: u16 = 12;
/// Tallest the editor block may get, in rows.
pub const MAX_EDITOR_ROWS: u16 = 30;
/// Blank rows between entries.
pub const ENTRY_GAP: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Pixel size of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub col_px: f32,
    pub row_px: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            col_px: 8.0,
            row_px: 16.0,
        }
    }
}

impl CellMetrics {
    /// Cells needed to hold `size`, never less than one in each direction.
    pub fn cells(&self, size: Size) -> (u16, u16) {
        let cols = (size.width / self.col_px).ceil().clamp(1.0, f32::from(u16::MAX));
        let rows = (size.height / self.row_px).ceil().clamp(1.0, f32::from(u16::MAX));
        (cols as u16, rows as u16)
    }

    pub fn width_px(&self, cols: u16) -> f32 {
        f32::from(cols) * self.col_px
    }
}

/// Entries whose cached size or paint is out of date.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Invalidations {
    pub all: bool,
    pub entries: Vec<EntryId>,
}

pub struct Presentation {
    display_reduction: f32,
    vertical_padding: f32,
    metrics: CellMetrics,
    pending: Invalidations,
}

impl Presentation {
    pub fn new(display: &DisplaySettings, metrics: CellMetrics) -> Self {
        Self {
            display_reduction: display.reduction_factor,
            vertical_padding: display.vertical_padding as f32,
            metrics,
            pending: Invalidations::default(),
        }
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    pub fn vertical_padding(&self) -> f32 {
        self.vertical_padding
    }

    /// Preferred size of `entry` in pixels for a viewport `viewport_width`
    /// pixels wide. An entry being edited takes the editor's size.
    pub fn measure(&self, entry: &Entry, editor: Option<&EditorSession>, viewport_width: f32) -> Size {
        if entry.editing {
            if let Some(session) = editor {
                return session.preferred_size(self.metrics, viewport_width);
            }
        }
        match entry.status.record() {
            Some(record) => self.measure_record(record, viewport_width),
            None => PLACEHOLDER_SIZE,
        }
    }

    /// The markup's intrinsic size plus vertical padding, divided by the
    /// display reduction factor, shrunk proportionally to fit the viewport.
    pub fn measure_record(&self, record: &RenderRecord, viewport_width: f32) -> Size {
        let Some(intrinsic) = svg::intrinsic_size(record.markup()) else {
            return PLACEHOLDER_SIZE;
        };
        let width = intrinsic.width / self.display_reduction;
        let height = (intrinsic.height + 2.0 * self.vertical_padding) / self.display_reduction;
        if width > viewport_width && viewport_width > 0.0 {
            let shrink = viewport_width / width;
            Size::new(viewport_width, height * shrink)
        } else {
            Size::new(width, height)
        }
    }

    pub fn invalidate(&mut self, id: EntryId) {
        if !self.pending.entries.contains(&id) {
            self.pending.entries.push(id);
        }
    }

    pub fn invalidate_all(&mut self) {
        self.pending.all = true;
    }

    pub fn take_invalidations(&mut self) -> Invalidations {
        std::mem::take(&mut self.pending)
    }
}

/// Where an entry sits in the scrolled list, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySlot {
    pub top: u32,
    pub rows: u16,
    pub cols: u16,
}

struct Thumbnail {
    cols: u16,
    rows: u16,
    selected: bool,
    pixmap: Pixmap,
}

#[derive(Default)]
pub struct ListLayout {
    sizes: HashMap<EntryId, Size>,
    slots: Vec<(EntryId, EntrySlot)>,
    thumbnails: HashMap<EntryId, Thumbnail>,
    viewport_cols: u16,
    total_rows: u32,
}

impl ListLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-lays-out the list, re-measuring only invalidated or new entries.
    pub fn update(
        &mut self,
        list: &FormulaList,
        editor: Option<&EditorSession>,
        presentation: &mut Presentation,
        viewport_cols: u16,
    ) {
        let invalidations = presentation.take_invalidations();
        if invalidations.all || viewport_cols != self.viewport_cols {
            self.sizes.clear();
            self.thumbnails.clear();
            self.viewport_cols = viewport_cols;
        }
        for id in &invalidations.entries {
            self.sizes.remove(id);
            self.thumbnails.remove(id);
        }

        let live: HashSet<EntryId> = list.ids().into_iter().collect();
        self.sizes.retain(|id, _| live.contains(id));
        self.thumbnails.retain(|id, _| live.contains(id));

        let metrics = presentation.metrics();
        let viewport_width = metrics.width_px(viewport_cols);
        self.slots.clear();
        let mut top = 0u32;
        for (id, entry) in list.iter() {
            let session = editor.filter(|session| session.entry() == id);
            let size = *self
                .sizes
                .entry(id)
                .or_insert_with(|| presentation.measure(entry, session, viewport_width));
            let (cols, rows) = metrics.cells(size);
            let max_rows = if entry.editing {
                MAX_EDITOR_ROWS
            } else {
                MAX_ENTRY_ROWS
            };
            let slot = EntrySlot {
                top,
                rows: rows.min(max_rows),
                cols: cols.min(viewport_cols.max(1)),
            };
            self.slots.push((id, slot));
            top += u32::from(slot.rows + ENTRY_GAP);
        }
        self.total_rows = top;
    }

    pub fn slot(&self, id: EntryId) -> Option<EntrySlot> {
        self.slots
            .iter()
            .find(|(slot_id, _)| *slot_id == id)
            .map(|(_, slot)| *slot)
    }

    pub fn slots(&self) -> &[(EntryId, EntrySlot)] {
        &self.slots
    }

    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    pub fn cached_size(&self, id: EntryId) -> Option<Size> {
        self.sizes.get(&id).copied()
    }

    /// Entries overlapping the window of `height` rows starting at `scroll_top`.
    pub fn visible_entries(&self, scroll_top: u32, height: u16) -> Vec<(EntryId, EntrySlot)> {
        let bottom = scroll_top + u32::from(height);
        self.slots
            .iter()
            .filter(|(_, slot)| slot.top < bottom && slot.top + u32::from(slot.rows) > scroll_top)
            .copied()
            .collect()
    }

    /// Scroll offset that brings `id` fully into a window of `height` rows,
    /// moving as little as possible.
    pub fn scroll_to_show(&self, id: EntryId, scroll_top: u32, height: u16) -> u32 {
        let Some(slot) = self.slot(id) else {
            return scroll_top;
        };
        let bottom = slot.top + u32::from(slot.rows);
        if slot.top < scroll_top {
            slot.top
        } else if bottom > scroll_top + u32::from(height) {
            bottom.saturating_sub(u32::from(height)).min(slot.top)
        } else {
            scroll_top
        }
    }

    pub fn thumbnail(&self, id: EntryId, cols: u16, rows: u16, selected: bool) -> Option<&Pixmap> {
        self.thumbnails
            .get(&id)
            .filter(|t| t.cols == cols && t.rows == rows && t.selected == selected)
            .map(|t| &t.pixmap)
    }

    pub fn store_thumbnail(&mut self, id: EntryId, cols: u16, rows: u16, selected: bool, pixmap: Pixmap) {
        self.thumbnails.insert(
            id,
            Thumbnail {
                cols,
                rows,
                selected,
                pixmap,
            },
        );
    }
}
