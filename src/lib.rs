pub mod app;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod errors;
pub mod export;
pub mod layout;
pub mod logging;
pub mod model;
pub mod parser;
pub mod render;
pub mod svg;
pub mod ui;

// Internal modules
pub mod actions;
pub mod event;

// Re-export commonly used types
pub use app::{AppMode, AppState};
pub use config::AppConfig;
pub use errors::{AppError, AppResult};
pub use export::ExportKind;
pub use model::{Entry, EntryId, EntryStatus, FormulaList};
pub use render::{ChannelEvent, RenderChannel, RenderRecord};
