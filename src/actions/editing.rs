use crate::app::AppState;
use crate::editor::{EditorSession, EditorState};
use log::debug;
use std::time::{Duration, Instant};

// Runs an edit on the open session, then refreshes the preview if the text changed.
fn edit_with(app: &mut AppState, edit: impl FnOnce(&mut EditorSession)) {
    let Some(session) = app.editor.as_mut() else {
        return;
    };
    let before = session.text().to_string();
    let lines_before = session.line_count();
    edit(session);

    let id = session.entry();
    let changed = before != session.text();
    if session.line_count() != lines_before {
        app.presentation.invalidate(id);
    }
    if changed {
        app.request_preview();
    }
}

pub fn type_char(app: &mut AppState, c: char) {
    edit_with(app, |session| session.insert_char(c));
}

pub fn insert_newline(app: &mut AppState) {
    edit_with(app, EditorSession::insert_newline);
}

pub fn backspace(app: &mut AppState) {
    edit_with(app, |session| {
        session.backspace();
    });
}

pub fn delete_char(app: &mut AppState) {
    edit_with(app, |session| {
        session.delete();
    });
}

pub fn delete_word_backward(app: &mut AppState) {
    edit_with(app, |session| {
        session.delete_word_backward();
    });
}

pub fn delete_to_end(app: &mut AppState) {
    edit_with(app, |session| {
        session.delete_to_line_end();
    });
}

pub fn delete_to_start(app: &mut AppState) {
    edit_with(app, |session| {
        session.delete_to_line_start();
    });
}

pub fn paste_at_cursor(app: &mut AppState) {
    if app.editor.is_none() {
        return;
    }
    match app.clipboard.get_text() {
        Ok(text) => edit_with(app, |session| session.insert_str(&text)),
        Err(err) => app.set_message(format!("Nothing to paste: {}", err)),
    }
}

pub fn move_cursor_left(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_left();
    }
}

pub fn move_cursor_right(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_right();
    }
}

pub fn move_cursor_up(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_up();
    }
}

pub fn move_cursor_down(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_down();
    }
}

pub fn move_cursor_home(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_home();
    }
}

pub fn move_cursor_end(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_end();
    }
}

pub fn move_cursor_word_left(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_word_left();
    }
}

pub fn move_cursor_word_right(app: &mut AppState) {
    if let Some(session) = app.editor.as_mut() {
        session.move_word_right();
    }
}

/// Commits the editor. A preview matching the text is written at once;
/// otherwise the render is awaited until the commit deadline.
pub fn confirm_edit(app: &mut AppState) {
    let Some(session) = app.editor.as_ref() else {
        return;
    };
    if session.text().trim().is_empty() {
        app.abort_edit();
        app.set_message("Empty formula discarded");
        return;
    }
    if let Some(record) = session.ready_record().cloned() {
        app.finish_commit(record);
        return;
    }
    if let Some(reason) = session.preview_error().map(str::to_string) {
        app.fail_commit(reason);
        return;
    }

    let deadline = Instant::now() + Duration::from_millis(app.config.editor.commit_timeout_ms);
    app.request_preview();
    if let Some(session) = app.editor.as_mut() {
        debug!("Waiting for render of {:?}", session.text());
        session.begin_commit(deadline);
    }
    app.set_message("Rendering...");
    app.pump(Instant::now());
}

pub fn discard_edit(app: &mut AppState) {
    if app.editor.is_some() {
        app.abort_edit();
        app.set_message("Edit discarded");
    }
}

/// Waits again after a commit timed out.
pub fn retry_commit(app: &mut AppState) {
    let Some(session) = app.editor.as_mut() else {
        return;
    };
    if session.state() != EditorState::Stalled {
        return;
    }
    session.resume();
    confirm_edit(app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::TestApp;
    use crate::app::AppMode;
    use crate::clipboard::{ClipboardPayload, ClipboardSink};
    use crate::model::EntryStatus;

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            type_char(app, c);
        }
    }

    #[test]
    fn test_commit_with_ready_preview_chains_new_entry() {
        let mut test = TestApp::new();
        test.app.append_new_and_edit();
        type_text(&mut test.app, "x^2");
        test.render_all();

        confirm_edit(&mut test.app);
        assert_eq!(test.app.list.formulas(), vec!["x^2"]);
        // The committed entry was last, so a fresh one is open.
        assert_eq!(test.app.list.len(), 2);
        assert_eq!(test.app.mode, AppMode::Editing);
        assert!(test.app.is_dirty);
    }

    #[test]
    fn test_commit_waits_for_render() {
        let mut test = TestApp::with_entries(&["a", "b"]);
        test.app.list.select_index(0);
        crate::actions::edit_selected(&mut test.app);
        type_text(&mut test.app, "+1");

        confirm_edit(&mut test.app);
        assert!(matches!(
            test.app.editor.as_ref().unwrap().state(),
            EditorState::PendingRender { .. }
        ));

        test.render_all();
        assert!(test.app.editor.is_none());
        assert_eq!(test.app.list.formulas(), vec!["a+1", "b"]);
    }

    #[test]
    fn test_unchanged_commit_keeps_formula() {
        let mut test = TestApp::with_entries(&["a", "b"]);
        test.app.list.select_index(0);
        crate::actions::edit_selected(&mut test.app);
        let submitted = test.submitted.borrow().len();

        confirm_edit(&mut test.app);
        assert_eq!(test.submitted.borrow().len(), submitted);
        assert_eq!(test.app.list.formulas(), vec!["a", "b"]);
        assert!(!test.app.is_dirty);
    }

    #[test]
    fn test_commit_of_failed_render_marks_entry() {
        let mut test = TestApp::with_entries(&["a", "b"]);
        test.app.list.select_index(0);
        crate::actions::edit_selected(&mut test.app);
        type_text(&mut test.app, "}");
        test.fail_in_flight("Extra close brace");

        confirm_edit(&mut test.app);
        let id = test.app.list.id_at(0).unwrap();
        assert!(matches!(
            &test.app.list.get(id).unwrap().status,
            EntryStatus::Failed { formula, .. } if formula == "a}"
        ));
        assert!(test.app.editor.is_none());
    }

    #[test]
    fn test_discard_restores_entry() {
        let mut test = TestApp::with_entries(&["a", "b"]);
        test.app.list.select_index(1);
        let id = test.app.list.selected().unwrap();
        let before = test.app.list.get(id).unwrap().status.clone();
        let markup = before.record().unwrap().markup().to_vec();

        crate::actions::edit_selected(&mut test.app);
        type_text(&mut test.app, "zzz");
        test.render_all();

        discard_edit(&mut test.app);
        let after = &test.app.list.get(id).unwrap().status;
        assert_eq!(after, &before);
        assert_eq!(after.record().unwrap().markup(), markup.as_slice());
        assert_eq!(test.app.list.position(id), Some(1));
        assert!(!test.app.list.get(id).unwrap().editing);
        assert_eq!(test.app.list.formulas(), vec!["a", "b"]);
        assert_eq!(test.app.list.selected_index(), Some(1));
        assert_eq!(test.app.mode, AppMode::Normal);
    }

    #[test]
    fn test_empty_commit_aborts() {
        let mut test = TestApp::new();
        test.app.append_new_and_edit();
        type_text(&mut test.app, "  ");
        confirm_edit(&mut test.app);
        assert!(test.app.list.is_empty());
        assert!(test.app.editor.is_none());
    }

    #[test]
    fn test_paste_inserts_clipboard_text() {
        let mut test = TestApp::new();
        test.clipboard
            .clone()
            .set(ClipboardPayload::Text("\\alpha".into()))
            .unwrap();
        test.app.append_new_and_edit();
        paste_at_cursor(&mut test.app);
        assert_eq!(test.app.editor.as_ref().unwrap().text(), "\\alpha");
        assert_eq!(test.app.pipeline.in_flight().unwrap().formula, "\\alpha");
    }

    #[test]
    fn test_retry_after_stall() {
        let mut test = TestApp::new();
        test.app.append_new_and_edit();
        type_text(&mut test.app, "q");
        test.app.config.editor.commit_timeout_ms = 1;
        confirm_edit(&mut test.app);
        test.app.pump(Instant::now() + Duration::from_millis(5));
        assert_eq!(test.app.editor.as_ref().unwrap().state(), EditorState::Stalled);

        test.app.config.editor.commit_timeout_ms = 60_000;
        retry_commit(&mut test.app);
        test.render_all();
        assert_eq!(test.app.list.formulas(), vec!["q"]);
    }
}
