mod clipboard;
mod editing;
mod file;
mod help;
mod list;
mod movement;

use crate::app::AppState;
use crate::export::ExportKind;
use anyhow::Result;

// Re-export all public functions from submodules
pub use clipboard::*;
pub use editing::*;
pub use file::*;
pub use help::*;
pub use list::*;
pub use movement::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Application control
    Quit,
    ForceQuit,

    // Movement
    SelectPrevious,
    SelectNext,
    SelectFirst,
    SelectLast,

    // List manipulation
    AppendNew,
    EditSelected,
    DeleteSelected,
    MoveEntryUp,
    MoveEntryDown,

    // Editing
    TypeChar(char),
    InsertNewline,
    Backspace,
    Delete,
    MoveCursorLeft,
    MoveCursorRight,
    MoveCursorUp,
    MoveCursorDown,
    MoveCursorHome,
    MoveCursorEnd,
    MoveCursorWordLeft,
    MoveCursorWordRight,
    DeleteWordBackward,
    DeleteToEnd,
    DeleteToStart,
    PasteAtCursor,
    ConfirmEdit,
    DiscardEdit,
    RetryCommit,

    // Clipboard
    CopyDefault,
    CopyAs(ExportKind),
    CycleDefaultExport,

    // File operations
    Save,
    SaveAs,
    Open,
    PromptChar(char),
    PromptBackspace,
    PromptClear,
    PromptConfirm,
    PromptCancel,

    // Help
    ShowHelp,
    CloseHelp,
}

pub fn execute_action(action: Action, app: &mut AppState) -> Result<()> {
    match action {
        Action::Quit => {
            if app.is_dirty {
                app.set_message("Unsaved changes! Press Shift+Q to force quit or 's' to save");
            } else {
                app.running = false;
            }
        }
        Action::ForceQuit => {
            app.running = false;
        }

        // Movement actions
        Action::SelectPrevious => movement::select_previous(app),
        Action::SelectNext => movement::select_next(app),
        Action::SelectFirst => movement::select_first(app),
        Action::SelectLast => movement::select_last(app),

        // List manipulation
        Action::AppendNew => list::append_new(app),
        Action::EditSelected => list::edit_selected(app),
        Action::DeleteSelected => list::delete_selected(app),
        Action::MoveEntryUp => list::move_entry_up(app)?,
        Action::MoveEntryDown => list::move_entry_down(app)?,

        // Editing
        Action::TypeChar(c) => editing::type_char(app, c),
        Action::InsertNewline => editing::insert_newline(app),
        Action::Backspace => editing::backspace(app),
        Action::Delete => editing::delete_char(app),
        Action::MoveCursorLeft => editing::move_cursor_left(app),
        Action::MoveCursorRight => editing::move_cursor_right(app),
        Action::MoveCursorUp => editing::move_cursor_up(app),
        Action::MoveCursorDown => editing::move_cursor_down(app),
        Action::MoveCursorHome => editing::move_cursor_home(app),
        Action::MoveCursorEnd => editing::move_cursor_end(app),
        Action::MoveCursorWordLeft => editing::move_cursor_word_left(app),
        Action::MoveCursorWordRight => editing::move_cursor_word_right(app),
        Action::DeleteWordBackward => editing::delete_word_backward(app),
        Action::DeleteToEnd => editing::delete_to_end(app),
        Action::DeleteToStart => editing::delete_to_start(app),
        Action::PasteAtCursor => editing::paste_at_cursor(app),
        Action::ConfirmEdit => editing::confirm_edit(app),
        Action::DiscardEdit => editing::discard_edit(app),
        Action::RetryCommit => editing::retry_commit(app),

        // Clipboard
        Action::CopyDefault => clipboard::copy_default(app)?,
        Action::CopyAs(kind) => clipboard::copy_as(app, kind)?,
        Action::CycleDefaultExport => clipboard::cycle_default_export(app),

        // File operations
        Action::Save => file::save(app)?,
        Action::SaveAs => file::save_as(app),
        Action::Open => file::begin_open(app),
        Action::PromptChar(c) => file::prompt_char(app, c),
        Action::PromptBackspace => file::prompt_backspace(app),
        Action::PromptClear => file::prompt_clear(app),
        Action::PromptConfirm => file::confirm_prompt(app)?,
        Action::PromptCancel => file::cancel_prompt(app),

        // Help
        Action::ShowHelp => help::show_help(app),
        Action::CloseHelp => help::close_help(app),
    }
    Ok(())
}
