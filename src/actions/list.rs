use crate::app::AppState;
use anyhow::Result;

/// Appends an empty entry and opens the editor on it.
pub fn append_new(app: &mut AppState) {
    if app.append_new_and_edit().is_none() {
        app.set_message("Finish the current edit first");
    }
}

pub fn edit_selected(app: &mut AppState) {
    match app.list.selected() {
        Some(id) => {
            app.open_editor(id);
        }
        None => append_new(app),
    }
}

pub fn delete_selected(app: &mut AppState) {
    let Some(id) = app.list.selected() else {
        app.set_message("Nothing selected");
        return;
    };
    if app.list.remove(id).is_some() {
        app.presentation.invalidate_all();
        app.is_dirty = true;
        app.set_message("Formula deleted");
    }
}

pub fn move_entry_up(app: &mut AppState) -> Result<()> {
    if let Some(index) = app.list.selected_index() {
        if index > 0 {
            app.list.move_entry(index, index - 1)?;
            app.presentation.invalidate_all();
            app.is_dirty = true;
        }
    }
    Ok(())
}

pub fn move_entry_down(app: &mut AppState) -> Result<()> {
    if let Some(index) = app.list.selected_index() {
        if index + 1 < app.list.len() {
            app.list.move_entry(index, index + 1)?;
            app.presentation.invalidate_all();
            app.is_dirty = true;
        }
    }
    Ok(())
}
