use crate::app::AppState;

pub fn select_previous(app: &mut AppState) {
    match app.list.selected_index() {
        Some(index) => {
            app.list.select_index(index.saturating_sub(1));
        }
        None => select_last(app),
    }
}

pub fn select_next(app: &mut AppState) {
    match app.list.selected_index() {
        Some(index) if index + 1 < app.list.len() => {
            app.list.select_index(index + 1);
        }
        Some(_) => {}
        None => select_first(app),
    }
}

pub fn select_first(app: &mut AppState) {
    app.list.select_index(0);
}

pub fn select_last(app: &mut AppState) {
    if let Some(last) = app.list.last() {
        app.list.select(last);
    }
}
