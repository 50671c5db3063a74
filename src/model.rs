use indextree::{Arena, NodeId};
use thiserror::Error;

use crate::render::RenderRecord;

/// Stable handle to a list entry. Ids of removed entries never resolve again.
pub type EntryId = NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// Created for editing, nothing rendered yet.
    Empty,
    Ready(RenderRecord),
    /// Rendering was attempted and did not produce markup.
    Failed { formula: String, reason: String },
}

impl EntryStatus {
    pub fn formula(&self) -> Option<&str> {
        match self {
            EntryStatus::Empty => None,
            EntryStatus::Ready(record) => Some(record.formula()),
            EntryStatus::Failed { formula, .. } => Some(formula),
        }
    }

    pub fn record(&self) -> Option<&RenderRecord> {
        match self {
            EntryStatus::Ready(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub status: EntryStatus,
    pub editing: bool,
}

impl Entry {
    pub fn new(status: EntryStatus) -> Self {
        Self {
            status,
            editing: false,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ListError {
    #[error("No entry at position {0}")]
    OutOfRange(usize),
    #[error("Entry no longer exists")]
    StaleEntry,
    #[error("List structure error: {0}")]
    Structure(String),
}

/// Ordered formula entries kept as the children of a hidden root node.
pub struct FormulaList {
    arena: Arena<Entry>,
    root: NodeId,
    selected: Option<EntryId>,
}

impl Default for FormulaList {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaList {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(Entry::new(EntryStatus::Empty));
        Self {
            arena,
            root,
            selected: None,
        }
    }

    pub fn len(&self) -> usize {
        self.root.children(&self.arena).count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children(&self.arena).next().is_none()
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.root.children(&self.arena).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &Entry)> + '_ {
        self.root
            .children(&self.arena)
            .filter_map(move |id| self.arena.get(id).map(|node| (id, node.get())))
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.root.children(&self.arena).any(|child| child == id)
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        if !self.contains(id) {
            return None;
        }
        self.arena.get(id).map(|node| node.get())
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        if !self.contains(id) {
            return None;
        }
        self.arena.get_mut(id).map(|node| node.get_mut())
    }

    pub fn id_at(&self, index: usize) -> Option<EntryId> {
        self.root.children(&self.arena).nth(index)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.root.children(&self.arena).position(|child| child == id)
    }

    pub fn last(&self) -> Option<EntryId> {
        self.root.children(&self.arena).last()
    }

    pub fn is_last(&self, id: EntryId) -> bool {
        self.last() == Some(id)
    }

    pub fn append(&mut self, status: EntryStatus) -> EntryId {
        let id = self.arena.new_node(Entry::new(status));
        self.root.append(id, &mut self.arena);
        id
    }

    pub fn append_empty(&mut self) -> EntryId {
        self.append(EntryStatus::Empty)
    }

    /// Inserts before the entry currently at `index`; `index == len` appends.
    pub fn insert_at(&mut self, index: usize, status: EntryStatus) -> Result<EntryId, ListError> {
        let len = self.len();
        if index > len {
            return Err(ListError::OutOfRange(index));
        }
        if index == len {
            return Ok(self.append(status));
        }
        let anchor = self.id_at(index).ok_or(ListError::OutOfRange(index))?;
        let id = self.arena.new_node(Entry::new(status));
        anchor
            .checked_insert_before(id, &mut self.arena)
            .map_err(|err| ListError::Structure(err.to_string()))?;
        Ok(id)
    }

    /// Moves the entry at `from` so that it ends up at position `to`.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), ListError> {
        let len = self.len();
        if from >= len {
            return Err(ListError::OutOfRange(from));
        }
        if to >= len {
            return Err(ListError::OutOfRange(to));
        }
        if from == to {
            return Ok(());
        }
        let id = self.id_at(from).ok_or(ListError::OutOfRange(from))?;
        id.detach(&mut self.arena);
        let result = match self.id_at(to) {
            Some(anchor) => anchor.checked_insert_before(id, &mut self.arena),
            None => self.root.checked_append(id, &mut self.arena),
        };
        result.map_err(|err| ListError::Structure(err.to_string()))
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Entry, ListError> {
        let id = self.id_at(index).ok_or(ListError::OutOfRange(index))?;
        self.remove(id).ok_or(ListError::StaleEntry)
    }

    /// Removes `id`, moving the selection to the entry that takes its place.
    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let index = self.position(id)?;
        let entry = self.arena.get(id)?.get().clone();
        id.remove(&mut self.arena);

        if self.selected == Some(id) {
            let len = self.len();
            self.selected = if len == 0 {
                None
            } else {
                self.id_at(index.min(len - 1))
            };
        }
        Some(entry)
    }

    pub fn replace_render_record(&mut self, id: EntryId, record: RenderRecord) -> Result<(), ListError> {
        let entry = self.get_mut(id).ok_or(ListError::StaleEntry)?;
        entry.status = EntryStatus::Ready(record);
        Ok(())
    }

    pub fn set_failed(
        &mut self,
        id: EntryId,
        formula: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<(), ListError> {
        let entry = self.get_mut(id).ok_or(ListError::StaleEntry)?;
        entry.status = EntryStatus::Failed {
            formula: formula.into(),
            reason: reason.into(),
        };
        Ok(())
    }

    pub fn set_editing(&mut self, id: EntryId, editing: bool) -> Result<(), ListError> {
        let entry = self.get_mut(id).ok_or(ListError::StaleEntry)?;
        entry.editing = editing;
        Ok(())
    }

    /// Formula sources in list order. Entries with nothing rendered are skipped.
    pub fn formulas(&self) -> Vec<String> {
        self.iter()
            .filter_map(|(_, entry)| entry.status.formula().map(str::to_string))
            .collect()
    }

    pub fn selected(&self) -> Option<EntryId> {
        self.selected.filter(|id| self.contains(*id))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected().and_then(|id| self.position(id))
    }

    pub fn select(&mut self, id: EntryId) -> bool {
        if self.contains(id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        match self.id_at(index) {
            Some(id) => {
                self.selected = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
