use crate::actions;
use crate::app::test_support::TestApp;
use crate::app::AppMode;
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

fn draw(test: &mut TestApp, width: u16, height: u16) -> Buffer {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| super::render(frame, &mut test.app))
        .unwrap();
    terminal.backend().buffer().clone()
}

fn row_text(buffer: &Buffer, y: u16) -> String {
    (0..buffer.area.width)
        .map(|x| buffer[(x, y)].symbol())
        .collect()
}

fn screen_text(buffer: &Buffer) -> String {
    (0..buffer.area.height)
        .map(|y| row_text(buffer, y))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_empty_list_shows_hint() {
    let mut test = TestApp::new();
    let buffer = draw(&mut test, 60, 10);
    assert!(row_text(&buffer, 0).starts_with("No formulas yet."));
    assert!(row_text(&buffer, 9).starts_with("mathmemo | 0 formulas | copy: Formula"));
}

#[test]
fn test_rendered_entry_is_painted_with_half_blocks() {
    let mut test = TestApp::with_entries(&["a"]);
    let buffer = draw(&mut test, 60, 12);

    // The box is 2000x1000 units plus padding: 11 columns by 4 rows.
    assert_eq!(buffer[(0, 0)].symbol(), "▀");
    assert_eq!(buffer[(10, 3)].symbol(), "▀");
    assert_ne!(buffer[(11, 0)].symbol(), "▀");
    assert!(row_text(&buffer, 11).contains("1 formulas"));
    assert!(row_text(&buffer, 11).contains("| a"));
}

#[test]
fn test_failed_entry_shows_source_and_reason() {
    let mut test = TestApp::new();
    test.app.enqueue_formulas(&["\\frac{".to_string()]);
    test.fail_in_flight("Missing close brace");
    test.app.clear_message();

    let buffer = draw(&mut test, 100, 12);
    let first = row_text(&buffer, 0);
    assert!(first.starts_with("✗ \\frac{"));
    assert!(first.contains("Missing close brace"));
}

#[test]
fn test_editor_block_shows_text_and_hints() {
    let mut test = TestApp::new();
    actions::append_new(&mut test.app);
    for c in "x^2".chars() {
        actions::type_char(&mut test.app, c);
    }
    assert_eq!(test.app.mode, AppMode::Editing);

    let buffer = draw(&mut test, 60, 16);
    assert!(row_text(&buffer, 0).contains("Edit formula"));
    assert!(row_text(&buffer, 1).starts_with("│x^2"));
    assert!(row_text(&buffer, 2).contains("rendering..."));
    assert!(row_text(&buffer, 15).starts_with("EDIT | Ctrl+S save"));
}

#[test]
fn test_editor_preview_strip_is_painted() {
    let mut test = TestApp::new();
    actions::append_new(&mut test.app);
    actions::type_char(&mut test.app, 'x');
    test.render_all();

    let buffer = draw(&mut test, 60, 16);
    assert!(row_text(&buffer, 2).contains("Ctrl+S save"));
    // Preview strip starts under the status row, inside the border.
    assert_eq!(buffer[(1, 3)].symbol(), "▀");
}

#[test]
fn test_help_screen_lists_sections() {
    let mut test = TestApp::new();
    actions::show_help(&mut test.app);

    let buffer = draw(&mut test, 60, 50);
    let text = screen_text(&buffer);
    assert!(text.contains("mathmemo Help"));
    assert!(text.contains("Copy as PNG image"));
    assert!(row_text(&buffer, 49).starts_with("Press ESC or q to close help"));
}

#[test]
fn test_status_line_marks_unsaved_changes() {
    let mut test = TestApp::with_entries(&["a", "b"]);
    test.app.is_dirty = true;
    let buffer = draw(&mut test, 80, 20);
    assert!(row_text(&buffer, 19).contains("2 formulas | copy: Formula [+]"));
}

#[test]
fn test_open_prompt_is_typed_on_status_line() {
    let mut test = TestApp::with_entries(&["a"]);
    actions::begin_open(&mut test.app);
    actions::prompt_clear(&mut test.app);
    for c in "notes.mathmemo".chars() {
        actions::prompt_char(&mut test.app, c);
    }
    assert_eq!(test.app.mode, AppMode::Prompt);

    let buffer = draw(&mut test, 60, 10);
    assert!(row_text(&buffer, 9).starts_with("Open: notes.mathmemo"));
}
