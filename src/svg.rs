//! Vector markup handling: parsing, recolouring and painting into pixmaps.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use log::debug;
use regex::bytes::Regex;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use thiserror::Error;

use crate::layout::Size;
use crate::render::RenderRecord;

/// Colour token the engine writes where the foreground colour belongs.
pub const COLOR_PLACEHOLDER: &str = "currentColor";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SvgError {
    #[error("SVG parse error: {0}")]
    Parse(String),
    #[error("No SVG loaded")]
    NotLoaded,
    #[error("Pixmap allocation failed for {0}x{1}")]
    Allocation(u32, u32),
}

/// An opaque colour parsed from `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);

    pub fn to_skia(self) -> Color {
        Color::from_rgba8(self.0, self.1, self.2, 0xff)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("colour '{}' must look like #rrggbb", s))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("colour '{}' must look like #rrggbb", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|err| format!("colour '{}': {}", s, err))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Target rectangle in pixmap pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Colours for painting one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintStyle {
    pub foreground: Rgb,
    pub background: Rgb,
}

/// Replaces the colour placeholder throughout `markup`.
pub fn recolor(markup: &[u8], color: &str) -> Vec<u8> {
    String::from_utf8_lossy(markup)
        .replace(COLOR_PLACEHOLDER, color)
        .into_bytes()
}

fn viewbox_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r#"viewBox\s*=\s*["']\s*([-+0-9.eE]+)[\s,]+([-+0-9.eE]+)[\s,]+([-+0-9.eE]+)[\s,]+([-+0-9.eE]+)\s*["']"#,
            )
            .ok()
        })
        .as_ref()
}

/// Width and height of the root `viewBox`, in SVG user units.
pub fn viewbox_size(markup: &[u8]) -> Option<Size> {
    let captures = viewbox_pattern()?.captures(markup)?;
    let number = |i: usize| -> Option<f32> {
        std::str::from_utf8(captures.get(i)?.as_bytes())
            .ok()?
            .parse()
            .ok()
    };
    let (width, height) = (number(3)?, number(4)?);
    (width > 0.0 && height > 0.0).then(|| Size::new(width, height))
}

/// Size of a document in its own units: the `viewBox` when present,
/// otherwise the size the parser resolves from `width`/`height`.
pub fn intrinsic_size(markup: &[u8]) -> Option<Size> {
    viewbox_size(markup).or_else(|| {
        let tree = usvg::Tree::from_data(markup, &usvg::Options::default()).ok()?;
        let size = tree.size();
        Some(Size::new(size.width(), size.height()))
    })
}

/// Something that can load one SVG document at a time and paint it.
pub trait SvgRenderer {
    fn load(&mut self, markup: &[u8]) -> Result<(), SvgError>;
    /// Size of the loaded document in its own units.
    fn intrinsic_size(&self) -> Option<Size>;
    /// Paints the loaded document stretched to `rect`.
    fn paint(&self, target: &mut Pixmap, rect: PaintRect) -> Result<(), SvgError>;
}

struct Loaded {
    tree: usvg::Tree,
    viewbox: Option<Size>,
}

/// [`SvgRenderer`] backed by resvg. The font database is loaded once and
/// shared by every document the renderer parses.
pub struct ResvgRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
    loaded: Option<Loaded>,
}

impl Default for ResvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResvgRenderer {
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        debug!("Loaded {} font faces for SVG rendering", db.len());
        Self {
            fontdb: Arc::new(db),
            loaded: None,
        }
    }
}

impl SvgRenderer for ResvgRenderer {
    fn load(&mut self, markup: &[u8]) -> Result<(), SvgError> {
        self.loaded = None;
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree =
            usvg::Tree::from_data(markup, &options).map_err(|err| SvgError::Parse(err.to_string()))?;
        self.loaded = Some(Loaded {
            tree,
            viewbox: viewbox_size(markup),
        });
        Ok(())
    }

    fn intrinsic_size(&self) -> Option<Size> {
        let loaded = self.loaded.as_ref()?;
        loaded.viewbox.or_else(|| {
            let size = loaded.tree.size();
            Some(Size::new(size.width(), size.height()))
        })
    }

    fn paint(&self, target: &mut Pixmap, rect: PaintRect) -> Result<(), SvgError> {
        let loaded = self.loaded.as_ref().ok_or(SvgError::NotLoaded)?;
        let size = loaded.tree.size();
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Ok(());
        }
        let transform = Transform::from_row(
            rect.width / size.width(),
            0.0,
            0.0,
            rect.height / size.height(),
            rect.x,
            rect.y,
        );
        resvg::render(&loaded.tree, transform, &mut target.as_mut());
        Ok(())
    }
}

/// Paints `record` into the whole of `target`: background fill, markup
/// recoloured to the foreground, scaled to fit while keeping its aspect
/// ratio, with `vertical_padding` units of space above and below.
pub fn paint_entry(
    record: &RenderRecord,
    style: &PaintStyle,
    target: &mut Pixmap,
    renderer: &mut dyn SvgRenderer,
    vertical_padding: f32,
) -> Result<(), SvgError> {
    target.fill(style.background.to_skia());

    let markup = recolor(record.markup(), &style.foreground.to_string());
    renderer.load(&markup)?;
    let intrinsic = renderer.intrinsic_size().ok_or(SvgError::NotLoaded)?;

    let padded_height = intrinsic.height + 2.0 * vertical_padding;
    let (target_w, target_h) = (target.width() as f32, target.height() as f32);
    let scale = (target_w / intrinsic.width).min(target_h / padded_height);
    let width = intrinsic.width * scale;
    let height = intrinsic.height * scale;
    let rect = PaintRect {
        x: (target_w - width) / 2.0,
        y: (target_h - padded_height * scale) / 2.0 + vertical_padding * scale,
        width,
        height,
    };
    renderer.paint(target, rect)
}
