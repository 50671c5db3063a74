mod common;

use common::Harness;
use mathmemo::{
    actions::{self, Action},
    editor::{EditorState, PreviewStatus},
    AppMode, EntryStatus,
};
use std::time::{Duration, Instant};

#[test]
fn test_new_formula_lifecycle() {
    let mut h = Harness::new();
    actions::execute_action(Action::AppendNew, &mut h.app).unwrap();
    assert_eq!(h.app.mode, AppMode::Editing);

    h.type_text("\\sqrt{2}");
    // Every keystroke asks for a preview, but only the newest text is kept.
    h.render_all();
    let session = h.app.editor.as_ref().unwrap();
    assert_eq!(session.preview_status(), PreviewStatus::Ready);
    assert!(h.engine.max_outstanding() <= 1);

    actions::execute_action(Action::ConfirmEdit, &mut h.app).unwrap();
    assert_eq!(h.app.list.formulas(), vec!["\\sqrt{2}"]);
    // A fresh entry follows the committed last one.
    assert_eq!(h.app.list.len(), 2);
    assert!(h.app.editor.is_some());

    actions::execute_action(Action::DiscardEdit, &mut h.app).unwrap();
    assert_eq!(h.app.list.len(), 1);
    assert_eq!(h.app.mode, AppMode::Normal);
    assert!(h.app.is_dirty);
}

#[test]
fn test_stale_previews_never_reach_the_editor() {
    let mut h = Harness::new();
    actions::append_new(&mut h.app);
    h.type_text("ab");

    // "a" went out first; answering it must not mark "ab" as ready.
    assert_eq!(h.engine.complete_next().as_deref(), Some("a"));
    h.pump();
    let session = h.app.editor.as_ref().unwrap();
    assert_eq!(session.preview_status(), PreviewStatus::Rendering);
    assert!(session.ready_record().is_none());

    h.render_all();
    let session = h.app.editor.as_ref().unwrap();
    assert_eq!(session.ready_record().unwrap().formula(), "ab");
}

#[test]
fn test_editing_middle_entry_does_not_chain() {
    let mut h = Harness::with_entries(&["a", "b", "c"]);
    h.app.list.select_index(1);
    actions::edit_selected(&mut h.app);
    h.type_text("'");
    h.render_all();

    actions::confirm_edit(&mut h.app);
    assert_eq!(h.app.list.formulas(), vec!["a", "b'", "c"]);
    assert!(h.app.editor.is_none());
    assert_eq!(h.app.list.selected_index(), Some(1));
}

#[test]
fn test_typing_while_pending_cancels_the_wait() {
    let mut h = Harness::with_entries(&["a"]);
    h.app.list.select_index(0);
    actions::edit_selected(&mut h.app);
    h.type_text("b");

    actions::confirm_edit(&mut h.app);
    assert!(matches!(
        h.app.editor.as_ref().unwrap().state(),
        EditorState::PendingRender { .. }
    ));

    h.type_text("c");
    assert_eq!(h.app.editor.as_ref().unwrap().state(), EditorState::Opened);
    h.render_all();
    // Previews arrived but nobody asked to commit.
    assert!(h.app.editor.is_some());
    assert_eq!(h.app.list.formulas(), vec!["a"]);
}

#[test]
fn test_stalled_commit_can_be_discarded() {
    let mut h = Harness::with_entries(&["a"]);
    h.app.config.editor.commit_timeout_ms = 10;
    h.app.list.select_index(0);
    actions::edit_selected(&mut h.app);
    h.type_text("x");

    actions::confirm_edit(&mut h.app);
    h.app.pump(Instant::now() + Duration::from_millis(50));
    assert_eq!(h.app.editor.as_ref().unwrap().state(), EditorState::Stalled);
    assert!(h.app.message.as_deref().unwrap().contains("Ctrl+R"));

    actions::discard_edit(&mut h.app);
    assert_eq!(h.app.list.formulas(), vec!["a"]);
    assert!(h.app.editor.is_none());
}

#[test]
fn test_render_error_on_commit_marks_entry_failed() {
    let mut h = Harness::new();
    actions::append_new(&mut h.app);
    h.type_text("\\frac{1");
    actions::confirm_edit(&mut h.app);

    h.engine.fail_next("Missing close brace");
    h.pump();
    // Earlier previews may still be waiting; fail all of them.
    while h.engine.fail_next("Missing close brace").is_some() {
        h.pump();
    }

    assert!(h.app.editor.is_none());
    let id = h.app.list.id_at(0).unwrap();
    assert!(matches!(
        &h.app.list.get(id).unwrap().status,
        EntryStatus::Failed { formula, reason }
            if formula == "\\frac{1" && reason.contains("Missing close brace")
    ));
}

#[test]
fn test_quit_is_refused_while_dirty() {
    let mut h = Harness::with_entries(&["a"]);
    h.app.is_dirty = true;
    actions::execute_action(Action::Quit, &mut h.app).unwrap();
    assert!(h.app.running);

    actions::execute_action(Action::ForceQuit, &mut h.app).unwrap();
    assert!(!h.app.running);
}
