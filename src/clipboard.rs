use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use clipboard_rs::Clipboard as _;
use log::{debug, warn};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Clipboard write failed: {0}")]
    Write(String),
    #[error("Clipboard read failed: {0}")]
    Read(String),
}

/// RGBA pixels, row-major, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// What a copy places on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardPayload {
    /// Vector markup under the SVG image type.
    Svg(Vec<u8>),
    Text(String),
    Image(RasterImage),
    /// `file://` URLs of files to paste.
    FileUrls(Vec<String>),
}

pub const TEXT_MIME: &str = "text/plain;charset=utf-8";
pub const SVG_MIME: &str = "image/svg+xml";
pub const PNG_MIME: &str = "image/png";
pub const URI_LIST_MIME: &str = "text/uri-list";

impl ClipboardPayload {
    pub fn kind_label(&self) -> &'static str {
        match self {
            ClipboardPayload::Svg(_) => "SVG image",
            ClipboardPayload::Text(_) => "text",
            ClipboardPayload::Image(_) => "image",
            ClipboardPayload::FileUrls(_) => "file list",
        }
    }

    /// The clipboard type the payload is offered under.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ClipboardPayload::Svg(_) => SVG_MIME,
            ClipboardPayload::Text(_) => TEXT_MIME,
            ClipboardPayload::Image(_) => PNG_MIME,
            ClipboardPayload::FileUrls(_) => URI_LIST_MIME,
        }
    }
}

/// Body of a `text/uri-list`: one URL per line, each ending in CRLF.
pub fn uri_list(urls: &[String]) -> String {
    urls.iter().map(|url| format!("{}\r\n", url)).collect()
}

pub trait ClipboardSink {
    fn set(&mut self, payload: ClipboardPayload) -> Result<(), ClipboardError>;
    fn get_text(&mut self) -> Result<String, ClipboardError>;
}

// How a payload is handed to the platform clipboard.
#[derive(Debug, PartialEq, Eq)]
enum SystemWrite {
    Text(String),
    Image(RasterImage),
    Typed { format: &'static str, bytes: Vec<u8> },
}

impl From<ClipboardPayload> for SystemWrite {
    fn from(payload: ClipboardPayload) -> Self {
        let format = payload.mime_type();
        match payload {
            ClipboardPayload::Text(text) => SystemWrite::Text(text),
            ClipboardPayload::Image(image) => SystemWrite::Image(image),
            ClipboardPayload::Svg(markup) => SystemWrite::Typed {
                format,
                bytes: markup,
            },
            ClipboardPayload::FileUrls(urls) => SystemWrite::Typed {
                format,
                bytes: uri_list(&urls).into_bytes(),
            },
        }
    }
}

/// The desktop clipboard, opened on first use.
///
/// Text and images go through arboard. SVG markup and file lists are
/// written under their own MIME types through clipboard-rs.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
    typed: Option<clipboard_rs::ClipboardContext>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("not initialised".into()))
    }

    fn typed_clipboard(&mut self) -> Result<&clipboard_rs::ClipboardContext, ClipboardError> {
        if self.typed.is_none() {
            let context = clipboard_rs::ClipboardContext::new()
                .map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
            self.typed = Some(context);
        }
        self.typed
            .as_ref()
            .ok_or_else(|| ClipboardError::Unavailable("not initialised".into()))
    }
}

impl ClipboardSink for SystemClipboard {
    fn set(&mut self, payload: ClipboardPayload) -> Result<(), ClipboardError> {
        let result = match SystemWrite::from(payload) {
            SystemWrite::Text(text) => self.clipboard()?.set_text(text).map_err(|e| e.to_string()),
            SystemWrite::Image(image) => self
                .clipboard()?
                .set_image(arboard::ImageData {
                    width: image.width as usize,
                    height: image.height as usize,
                    bytes: Cow::Owned(image.rgba),
                })
                .map_err(|e| e.to_string()),
            SystemWrite::Typed { format, bytes } => {
                debug!("Writing {} bytes as {}", bytes.len(), format);
                self.typed_clipboard()?
                    .set_buffer(format, bytes)
                    .map_err(|e| e.to_string())
            }
        };
        result.map_err(|err| {
            warn!("Clipboard write failed: {}", err);
            ClipboardError::Write(err)
        })
    }

    fn get_text(&mut self) -> Result<String, ClipboardError> {
        self.clipboard()?
            .get_text()
            .map_err(|err| ClipboardError::Read(err.to_string()))
    }
}

/// In-process clipboard. Clones share the same contents, so a clone kept
/// outside the application sees everything written through it.
#[derive(Default, Clone)]
pub struct MemoryClipboard {
    contents: Rc<RefCell<Vec<ClipboardPayload>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<ClipboardPayload> {
        self.contents.borrow().last().cloned()
    }

    pub fn history(&self) -> Vec<ClipboardPayload> {
        self.contents.borrow().clone()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set(&mut self, payload: ClipboardPayload) -> Result<(), ClipboardError> {
        self.contents.borrow_mut().push(payload);
        Ok(())
    }

    fn get_text(&mut self) -> Result<String, ClipboardError> {
        match self.contents.borrow().last() {
            Some(ClipboardPayload::Text(text)) => Ok(text.clone()),
            Some(other) => Err(ClipboardError::Read(format!(
                "clipboard holds {}, not text",
                other.kind_label()
            ))),
            None => Err(ClipboardError::Read("clipboard is empty".into())),
        }
    }
}
