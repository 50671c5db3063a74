use crate::app::AppState;
use crate::clipboard::ClipboardPayload;
use crate::errors::{AppError, AppResult};
use crate::export::{self, ExportKind};
use crate::model::EntryStatus;
use anyhow::Result;
use log::warn;

pub fn copy_default(app: &mut AppState) -> Result<()> {
    let kind = app.default_export;
    copy_as(app, kind)
}

/// Copies the selected entry in the `kind` representation. Failures are
/// reported on the status line.
pub fn copy_as(app: &mut AppState, kind: ExportKind) -> Result<()> {
    let copied = selected_payload(app, kind)
        .and_then(|payload| app.clipboard.set(payload).map_err(AppError::from));
    match copied {
        Ok(()) => app.set_message(format!("Copied as {}", kind.label())),
        Err(err) => {
            warn!("{} copy failed: {}", kind.label(), err);
            app.set_message(err.to_string());
        }
    }
    Ok(())
}

// Failed entries only have their source to offer.
fn selected_payload(app: &mut AppState, kind: ExportKind) -> AppResult<ClipboardPayload> {
    let status = app
        .list
        .selected()
        .and_then(|id| app.list.get(id))
        .map(|entry| entry.status.clone())
        .ok_or(AppError::NoSelection)?;

    match (status, kind) {
        (EntryStatus::Ready(record), _) => {
            let settings = app.export_settings();
            let payload =
                export::convert(kind, &record, &settings, &mut app.renderer, &mut app.temp_files)?;
            Ok(payload)
        }
        (EntryStatus::Failed { formula, .. }, ExportKind::SourceText) => {
            Ok(ClipboardPayload::Text(formula))
        }
        _ => Err(AppError::NotRendered),
    }
}

pub fn cycle_default_export(app: &mut AppState) {
    app.default_export = app.default_export.next();
    app.set_message(format!("Default copy: {}", app.default_export.label()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::TestApp;

    #[test]
    fn test_copy_default_is_source_text() {
        let mut test = TestApp::with_entries(&["e^{i\\pi}"]);
        copy_default(&mut test.app).unwrap();
        assert_eq!(
            test.clipboard.last(),
            Some(ClipboardPayload::Text("e^{i\\pi}".into()))
        );
        assert_eq!(test.app.message.as_deref(), Some("Copied as Formula"));
    }

    #[test]
    fn test_copy_vector_replaces_placeholder() {
        let mut test = TestApp::with_entries(&["x"]);
        copy_as(&mut test.app, ExportKind::Vector).unwrap();
        let Some(ClipboardPayload::Svg(markup)) = test.clipboard.last() else {
            panic!("expected SVG payload");
        };
        let markup = String::from_utf8(markup).unwrap();
        assert!(markup.contains("fill=\"black\""));
        assert!(!markup.contains("currentColor"));
    }

    #[test]
    fn test_copy_vector_text_is_raw_markup() {
        let mut test = TestApp::with_entries(&["x"]);
        copy_as(&mut test.app, ExportKind::VectorText).unwrap();
        let Some(ClipboardPayload::Text(markup)) = test.clipboard.last() else {
            panic!("expected text payload");
        };
        assert!(markup.starts_with("<?xml"));
        assert!(markup.contains("currentColor"));
    }

    #[test]
    fn test_copy_raster_uses_reduction_factor() {
        let mut test = TestApp::with_entries(&["x"]);
        copy_as(&mut test.app, ExportKind::Raster).unwrap();
        let Some(ClipboardPayload::Image(image)) = test.clipboard.last() else {
            panic!("expected image payload");
        };
        assert_eq!((image.width, image.height), (167, 83));
        assert_eq!(image.rgba.len(), 167 * 83 * 4);
    }

    #[test]
    fn test_copy_temp_file_keeps_file() {
        let mut test = TestApp::with_entries(&["x"]);
        copy_as(&mut test.app, ExportKind::RasterTempFile).unwrap();
        let Some(ClipboardPayload::FileUrls(urls)) = test.clipboard.last() else {
            panic!("expected file list payload");
        };
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("file://"));
        assert!(urls[0].ends_with(".png"));
        assert_eq!(test.app.temp_files.len(), 1);
        assert!(test.app.temp_files.paths()[0].exists());
    }

    #[test]
    fn test_each_kind_reaches_clipboard_under_its_type() {
        let mut test = TestApp::with_entries(&["x"]);
        for (kind, mime) in [
            (ExportKind::Vector, "image/svg+xml"),
            (ExportKind::VectorText, "text/plain;charset=utf-8"),
            (ExportKind::Raster, "image/png"),
            (ExportKind::RasterTempFile, "text/uri-list"),
            (ExportKind::SourceText, "text/plain;charset=utf-8"),
        ] {
            copy_as(&mut test.app, kind).unwrap();
            assert_eq!(test.clipboard.last().unwrap().mime_type(), mime, "{:?}", kind);
        }
        assert_eq!(test.clipboard.history().len(), 5);
    }

    #[test]
    fn test_failed_entry_copies_only_source() {
        let mut test = TestApp::new();
        test.app.enqueue_formulas(&["\\oops".to_string()]);
        test.fail_in_flight("Undefined control sequence");

        copy_as(&mut test.app, ExportKind::Vector).unwrap();
        assert!(test.clipboard.last().is_none());
        assert_eq!(
            test.app.message.as_deref(),
            Some("Entry has no rendered formula")
        );

        copy_as(&mut test.app, ExportKind::SourceText).unwrap();
        assert_eq!(
            test.clipboard.last(),
            Some(ClipboardPayload::Text("\\oops".into()))
        );
    }

    #[test]
    fn test_copy_without_selection_reports() {
        let mut test = TestApp::new();
        copy_default(&mut test.app).unwrap();
        assert_eq!(test.app.message.as_deref(), Some("Nothing is selected"));
        assert!(test.clipboard.last().is_none());
    }

    #[test]
    fn test_cycle_default_export() {
        let mut test = TestApp::new();
        assert_eq!(test.app.default_export, ExportKind::SourceText);
        cycle_default_export(&mut test.app);
        assert_eq!(test.app.default_export, ExportKind::Vector);
        assert_eq!(test.app.message.as_deref(), Some("Default copy: SVG"));
    }
}
