use crate::actions::Action;
use crate::app::{AppMode, AppState};
use crate::export::ExportKind;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

pub fn handle_events(app: &mut AppState) -> Result<Option<Action>> {
    if event::poll(Duration::from_millis(10))? {
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                return Ok(handle_key_event(app, key));
            }
            Event::Resize(_, _) => app.presentation.invalidate_all(),
            _ => {}
        }
    }
    Ok(None)
}

pub fn handle_key_event(app: &AppState, key: KeyEvent) -> Option<Action> {
    match app.mode {
        AppMode::Normal => handle_normal_mode(key),
        AppMode::Editing => handle_editing_mode(key),
        AppMode::Help => handle_help_mode(key),
        AppMode::Prompt => handle_prompt_mode(key),
    }
}

fn handle_normal_mode(key: KeyEvent) -> Option<Action> {
    use KeyCode::*;

    match (key.code, key.modifiers) {
        // Quit
        (Char('q'), KeyModifiers::NONE) => Some(Action::Quit),
        (Char('Q'), KeyModifiers::SHIFT) => Some(Action::ForceQuit),
        (Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),

        // Entry movement (before plain arrows)
        (Char('K'), KeyModifiers::SHIFT) | (Up, KeyModifiers::ALT) => Some(Action::MoveEntryUp),
        (Char('J'), KeyModifiers::SHIFT) | (Down, KeyModifiers::ALT) => {
            Some(Action::MoveEntryDown)
        }

        // Selection
        (Char('k'), KeyModifiers::NONE) | (Up, _) => Some(Action::SelectPrevious),
        (Char('j'), KeyModifiers::NONE) | (Down, _) => Some(Action::SelectNext),
        (Char('g'), KeyModifiers::NONE) | (Home, _) => Some(Action::SelectFirst),
        (Char('G'), KeyModifiers::SHIFT) | (End, _) => Some(Action::SelectLast),

        // List
        (Char('a'), KeyModifiers::NONE) | (Char('o'), KeyModifiers::NONE) => {
            Some(Action::AppendNew)
        }
        (Char('e'), KeyModifiers::NONE) | (Enter, KeyModifiers::NONE) => {
            Some(Action::EditSelected)
        }
        (Char('d'), KeyModifiers::NONE) | (Delete, _) => Some(Action::DeleteSelected),

        // Clipboard
        (Char('y'), KeyModifiers::NONE) => Some(Action::CopyDefault),
        (Char('c'), KeyModifiers::NONE) => Some(Action::CycleDefaultExport),
        (Char('1'), KeyModifiers::NONE) => Some(Action::CopyAs(ExportKind::Vector)),
        (Char('2'), KeyModifiers::NONE) => Some(Action::CopyAs(ExportKind::VectorText)),
        (Char('3'), KeyModifiers::NONE) => Some(Action::CopyAs(ExportKind::Raster)),
        (Char('4'), KeyModifiers::NONE) => Some(Action::CopyAs(ExportKind::RasterTempFile)),
        (Char('5'), KeyModifiers::NONE) => Some(Action::CopyAs(ExportKind::SourceText)),

        // File operations
        (Char('s'), KeyModifiers::NONE) => Some(Action::Save),
        (Char('S'), KeyModifiers::SHIFT) => Some(Action::SaveAs),
        (Char('O'), KeyModifiers::SHIFT) => Some(Action::Open),

        // Help
        (Char('?'), _) => Some(Action::ShowHelp),

        _ => None,
    }
}

// Enter inserts a line break; commit and discard need explicit chords, and
// Esc does nothing so a stray press never loses work.
fn handle_editing_mode(key: KeyEvent) -> Option<Action> {
    use KeyCode::*;

    match (key.code, key.modifiers) {
        // Commit protocol
        (Char('s'), KeyModifiers::CONTROL) | (Enter, KeyModifiers::ALT) => {
            Some(Action::ConfirmEdit)
        }
        (Char('d'), KeyModifiers::CONTROL) => Some(Action::DiscardEdit),
        (Char('r'), KeyModifiers::CONTROL) => Some(Action::RetryCommit),
        (Esc, _) => None,

        // Text entry
        (Enter, _) => Some(Action::InsertNewline),
        (Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => Some(Action::TypeChar(c)),

        // Deletion
        (Backspace, KeyModifiers::NONE) => Some(Action::Backspace),
        (Backspace, KeyModifiers::CONTROL) => Some(Action::DeleteWordBackward),
        (Backspace, KeyModifiers::ALT) => Some(Action::DeleteWordBackward),
        (Char('w'), KeyModifiers::CONTROL) => Some(Action::DeleteWordBackward),
        (Delete, _) => Some(Action::Delete),
        (Char('k'), KeyModifiers::CONTROL) => Some(Action::DeleteToEnd),
        (Char('u'), KeyModifiers::CONTROL) => Some(Action::DeleteToStart),

        // Movement
        (Left, KeyModifiers::NONE) => Some(Action::MoveCursorLeft),
        (Right, KeyModifiers::NONE) => Some(Action::MoveCursorRight),
        (Up, _) => Some(Action::MoveCursorUp),
        (Down, _) => Some(Action::MoveCursorDown),
        (Left, KeyModifiers::CONTROL) | (Left, KeyModifiers::ALT) => {
            Some(Action::MoveCursorWordLeft)
        }
        (Right, KeyModifiers::CONTROL) | (Right, KeyModifiers::ALT) => {
            Some(Action::MoveCursorWordRight)
        }
        (Char('b'), KeyModifiers::ALT) => Some(Action::MoveCursorWordLeft),
        (Char('f'), KeyModifiers::ALT) => Some(Action::MoveCursorWordRight),
        (Home, _) => Some(Action::MoveCursorHome),
        (End, _) => Some(Action::MoveCursorEnd),
        (Char('a'), KeyModifiers::CONTROL) => Some(Action::MoveCursorHome),
        (Char('e'), KeyModifiers::CONTROL) => Some(Action::MoveCursorEnd),

        // Clipboard
        (Char('v'), KeyModifiers::CONTROL) => Some(Action::PasteAtCursor),

        _ => None,
    }
}

fn handle_prompt_mode(key: KeyEvent) -> Option<Action> {
    use KeyCode::*;

    match (key.code, key.modifiers) {
        (Enter, _) => Some(Action::PromptConfirm),
        (Esc, _) => Some(Action::PromptCancel),
        (Backspace, _) => Some(Action::PromptBackspace),
        (Char('u'), KeyModifiers::CONTROL) => Some(Action::PromptClear),
        (Char('c'), KeyModifiers::CONTROL) => Some(Action::PromptCancel),
        (Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => Some(Action::PromptChar(c)),
        _ => None,
    }
}

fn handle_help_mode(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Some(Action::CloseHelp),
        _ => None,
    }
}
