use thiserror::Error;

// Bring in specific errors from the modules we wrap
use crate::clipboard::ClipboardError;
use crate::config::ConfigError;
use crate::export::ExportError;
use crate::model::ListError;
use crate::parser::PersistError;
use crate::render::{ChannelError, RenderError};
use crate::svg::SvgError;
use crate::ui::UiError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("File error: {0}")]
    Persist(#[from] PersistError),

    #[error("List error: {0}")]
    List(#[from] ListError),

    #[error("SVG error: {0}")]
    Svg(#[from] SvgError),

    #[error("UI error: {0}")]
    Ui(#[from] UiError),

    #[error("Nothing is selected")]
    NoSelection,

    #[error("Entry has no rendered formula")]
    NotRendered,
}

pub type AppResult<T> = Result<T, AppError>;
