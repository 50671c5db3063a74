use crate::app::{AppMode, AppState};

pub fn show_help(app: &mut AppState) {
    if app.editor.is_none() {
        app.mode = AppMode::Help;
    }
}

pub fn close_help(app: &mut AppState) {
    app.mode = AppMode::Normal;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::TestApp;

    #[test]
    fn test_help_mode() {
        let mut test = TestApp::new();

        show_help(&mut test.app);
        assert!(matches!(test.app.mode, AppMode::Help));

        close_help(&mut test.app);
        assert!(matches!(test.app.mode, AppMode::Normal));
    }

    #[test]
    fn test_help_not_shown_while_editing() {
        let mut test = TestApp::new();
        test.app.append_new_and_edit();
        show_help(&mut test.app);
        assert!(matches!(test.app.mode, AppMode::Editing));
    }
}
