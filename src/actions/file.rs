use crate::app::{AppMode, AppState, PathPrompt, PromptKind};
use crate::parser;
use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};

/// Path the file prompt starts with when no file is set.
pub const DEFAULT_SAVE_NAME: &str = "formulas.mathmemo";

pub fn save(app: &mut AppState) -> Result<()> {
    if let Some(path) = app.filename.clone() {
        write_list(app, &path)?;
    } else {
        app.set_message("No filename set - use Shift+S for Save As");
    }
    Ok(())
}

/// Asks for the path to save to on the status line.
pub fn save_as(app: &mut AppState) {
    begin_prompt(app, PromptKind::SaveAs);
}

/// Asks for a list to open on the status line.
pub fn begin_open(app: &mut AppState) {
    begin_prompt(app, PromptKind::Open);
}

fn begin_prompt(app: &mut AppState, kind: PromptKind) {
    if app.editor.is_some() {
        return;
    }
    let input = app
        .filename
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| DEFAULT_SAVE_NAME.to_string());
    app.prompt = Some(PathPrompt { kind, input });
    app.mode = AppMode::Prompt;
    app.clear_message();
}

pub fn prompt_char(app: &mut AppState, c: char) {
    if let Some(prompt) = app.prompt.as_mut() {
        prompt.input.push(c);
    }
}

pub fn prompt_backspace(app: &mut AppState) {
    if let Some(prompt) = app.prompt.as_mut() {
        prompt.input.pop();
    }
}

pub fn prompt_clear(app: &mut AppState) {
    if let Some(prompt) = app.prompt.as_mut() {
        prompt.input.clear();
    }
}

pub fn cancel_prompt(app: &mut AppState) {
    app.prompt = None;
    app.mode = AppMode::Normal;
}

/// Runs the prompted Open or Save As on the typed path.
pub fn confirm_prompt(app: &mut AppState) -> Result<()> {
    let Some(prompt) = app.prompt.take() else {
        return Ok(());
    };
    app.mode = AppMode::Normal;

    let input = prompt.input.trim();
    if input.is_empty() {
        app.set_message("No file name given");
        return Ok(());
    }
    let path = PathBuf::from(input);
    match prompt.kind {
        PromptKind::SaveAs => {
            write_list(app, &path)?;
            app.filename = Some(path);
        }
        PromptKind::Open => {
            if let Err(err) = open(app, &path) {
                warn!("Open of {} failed: {:#}", path.display(), err);
                app.set_message(format!("Failed to open: {}", err));
                return Err(err);
            }
        }
    }
    Ok(())
}

fn write_list(app: &mut AppState, path: &Path) -> Result<()> {
    let formulas = app.list.formulas();
    match parser::save_file(&formulas, path) {
        Ok(()) => {
            app.set_message(format!("Saved to {}", path.display()));
            app.is_dirty = false;
            Ok(())
        }
        Err(e) => {
            app.set_message(format!("Failed to save: {}", e));
            Err(e.into())
        }
    }
}

/// Reads a list and queues its formulas for rendering after the current
/// entries.
pub fn open(app: &mut AppState, path: &Path) -> Result<usize> {
    let formulas = parser::load_file(path)?;
    // Merging into an existing list leaves it unsaved.
    if !app.list.is_empty() || app.filename.is_some() {
        app.is_dirty = true;
    }
    app.enqueue_formulas(&formulas);
    if app.filename.is_none() {
        app.filename = Some(path.to_path_buf());
    }
    app.set_message(format!(
        "Rendering {} formulas from {}",
        formulas.len(),
        path.display()
    ));
    Ok(formulas.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::app::test_support::TestApp;

    #[test]
    fn test_save_writes_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.mathmemo");
        let mut test = TestApp::with_entries(&["a", "b"]);
        test.app.filename = Some(path.clone());
        test.app.is_dirty = true;

        save(&mut test.app).unwrap();
        assert!(!test.app.is_dirty);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "% mathmemo-list v2\n1\na\n1\nb\n"
        );
    }

    #[test]
    fn test_save_without_filename() {
        let mut test = TestApp::with_entries(&["a"]);
        test.app.is_dirty = true;
        save(&mut test.app).unwrap();
        assert!(test.app.is_dirty);
        assert!(test.app.message.as_deref().unwrap().contains("Save As"));
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut test = TestApp::with_entries(&["a"]);
        test.app.filename = Some(dir.path().join("missing").join("list.mathmemo"));
        test.app.is_dirty = true;

        assert!(save(&mut test.app).is_err());
        assert!(test.app.is_dirty);
        assert!(test.app.message.as_deref().unwrap().starts_with("Failed to save"));
    }

    fn type_path(app: &mut AppState, path: &Path) {
        prompt_clear(app);
        for c in path.display().to_string().chars() {
            prompt_char(app, c);
        }
    }

    #[test]
    fn test_save_as_prompt_starts_from_default_name() {
        let mut test = TestApp::with_entries(&["a"]);
        save_as(&mut test.app);
        assert_eq!(test.app.mode, AppMode::Prompt);
        assert_eq!(
            test.app.prompt,
            Some(PathPrompt {
                kind: PromptKind::SaveAs,
                input: DEFAULT_SAVE_NAME.to_string(),
            })
        );

        cancel_prompt(&mut test.app);
        assert_eq!(test.app.mode, AppMode::Normal);
        assert!(test.app.prompt.is_none());
        assert!(test.app.filename.is_none());
    }

    #[test]
    fn test_save_as_writes_typed_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typed.mathmemo");
        let mut test = TestApp::with_entries(&["a"]);
        test.app.is_dirty = true;

        save_as(&mut test.app);
        type_path(&mut test.app, &path);
        confirm_prompt(&mut test.app).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "% mathmemo-list v2\n1\na\n");
        assert_eq!(test.app.filename, Some(path));
        assert!(!test.app.is_dirty);
        assert_eq!(test.app.mode, AppMode::Normal);
    }

    #[test]
    fn test_prompt_editing_and_blank_input() {
        let mut test = TestApp::new();
        begin_open(&mut test.app);
        prompt_clear(&mut test.app);
        prompt_char(&mut test.app, 'x');
        prompt_char(&mut test.app, 'y');
        prompt_backspace(&mut test.app);
        assert_eq!(test.app.prompt.as_ref().unwrap().input, "x");

        prompt_backspace(&mut test.app);
        confirm_prompt(&mut test.app).unwrap();
        assert_eq!(test.app.message.as_deref(), Some("No file name given"));
        assert_eq!(test.app.mode, AppMode::Normal);
    }

    #[test]
    fn test_prompt_not_offered_while_editing() {
        let mut test = TestApp::new();
        test.app.append_new_and_edit();
        begin_open(&mut test.app);
        assert!(test.app.prompt.is_none());
        assert_eq!(test.app.mode, AppMode::Editing);
    }

    #[test]
    fn test_runtime_open_merges_and_marks_dirty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("more.mathmemo");
        fs::write(&path, "% mathmemo-list v2\n1\nb\n").unwrap();
        let mut test = TestApp::with_entries(&["a"]);

        begin_open(&mut test.app);
        type_path(&mut test.app, &path);
        confirm_prompt(&mut test.app).unwrap();
        test.render_all();

        assert_eq!(test.app.list.formulas(), vec!["a", "b"]);
        assert!(test.app.is_dirty);
        assert_eq!(test.app.filename, Some(path));
    }

    #[test]
    fn test_open_of_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut test = TestApp::with_entries(&["a"]);

        begin_open(&mut test.app);
        type_path(&mut test.app, &dir.path().join("absent.mathmemo"));
        assert!(confirm_prompt(&mut test.app).is_err());
        assert!(test.app.message.as_deref().unwrap().starts_with("Failed to open"));
        assert_eq!(test.app.list.formulas(), vec!["a"]);
        assert!(!test.app.is_dirty);
    }

    #[test]
    fn test_open_appends_after_current_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.txt");
        fs::write(&path, "\\[b\\]\n\\[c\\]\n").unwrap();
        let mut test = TestApp::with_entries(&["a"]);

        assert_eq!(open(&mut test.app, &path).unwrap(), 2);
        test.render_all();
        assert_eq!(test.app.list.formulas(), vec!["a", "b", "c"]);
        assert_eq!(test.app.filename, Some(path));
        assert!(test.app.is_dirty);
    }

    #[test]
    fn test_open_into_empty_list_is_clean() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.mathmemo");
        fs::write(&path, "% mathmemo-list v2\n1\nx\n").unwrap();
        let mut test = TestApp::new();

        open(&mut test.app, &path).unwrap();
        test.render_all();
        assert_eq!(test.app.list.formulas(), vec!["x"]);
        assert!(!test.app.is_dirty);
    }
}
