//! Converters from a render record to clipboard payloads.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use resvg::tiny_skia::Pixmap;
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

use crate::clipboard::{ClipboardPayload, RasterImage};
use crate::config::AppConfig;
use crate::layout::Size;
use crate::render::RenderRecord;
use crate::svg::{self, PaintRect, Rgb, SvgError, SvgRenderer};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Svg(#[from] SvgError),
    #[error("Reduction factor must be positive, got {0}")]
    InvalidReduction(f32),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Temporary file error: {0}")]
    TempFile(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// Recoloured markup as an SVG image.
    Vector,
    /// Raw markup as plain text.
    VectorText,
    /// Bitmap image.
    Raster,
    /// Bitmap written to a temporary PNG, offered as a file URL.
    RasterTempFile,
    /// The formula source.
    SourceText,
}

impl ExportKind {
    pub const ALL: [ExportKind; 5] = [
        ExportKind::Vector,
        ExportKind::VectorText,
        ExportKind::Raster,
        ExportKind::RasterTempFile,
        ExportKind::SourceText,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ExportKind::Vector => "vector",
            ExportKind::VectorText => "vector_text",
            ExportKind::Raster => "raster",
            ExportKind::RasterTempFile => "raster_temp_file",
            ExportKind::SourceText => "source_text",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportKind::Vector => "SVG",
            ExportKind::VectorText => "SVG Text",
            ExportKind::Raster => "PNG Image",
            ExportKind::RasterTempFile => "PNG File",
            ExportKind::SourceText => "Formula",
        }
    }

    /// The following kind, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|kind| *kind == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == wanted)
            .ok_or_else(|| {
                let keys: Vec<_> = Self::ALL.iter().map(|kind| kind.key()).collect();
                format!("unknown export kind '{}' (expected one of {})", s, keys.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Colour substituted for the placeholder in exported markup.
    pub color: String,
    /// Intrinsic size is divided by this to get bitmap pixels.
    pub copy_reduction: f32,
}

impl ExportSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            color: config.export.color.clone(),
            copy_reduction: config.copy_image.reduction_factor,
        }
    }
}

/// Temporary PNG files handed out as file URLs. They stay on disk as long
/// as the store lives, so pastes in other programs keep working.
#[derive(Default)]
pub struct TempFileStore {
    dir: Option<PathBuf>,
    files: Vec<NamedTempFile>,
}

impl TempFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store placing its files in `dir` instead of the system temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            files: Vec::new(),
        }
    }

    pub fn create_png(&mut self, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let mut builder = Builder::new();
        builder.prefix("mathmemo-").suffix(".png");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        let path = file.path().to_path_buf();
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        self.files.push(file);
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|file| file.path().to_path_buf()).collect()
    }
}

/// Bitmap size for a document of `intrinsic` size: each side divided by
/// `reduction`, rounded, at least one pixel.
pub fn raster_dimensions(intrinsic: Size, reduction: f32) -> Result<(u32, u32), ExportError> {
    if reduction.is_nan() || reduction <= 0.0 {
        return Err(ExportError::InvalidReduction(reduction));
    }
    let side = |units: f32| (units / reduction).round().max(1.0) as u32;
    Ok((side(intrinsic.width), side(intrinsic.height)))
}

/// Paints `record` on white at the export size.
pub fn rasterize(
    record: &RenderRecord,
    settings: &ExportSettings,
    renderer: &mut dyn SvgRenderer,
) -> Result<Pixmap, ExportError> {
    let markup = svg::recolor(record.markup(), &settings.color);
    renderer.load(&markup)?;
    let intrinsic = renderer.intrinsic_size().ok_or(SvgError::NotLoaded)?;
    let (width, height) = raster_dimensions(intrinsic, settings.copy_reduction)?;

    let mut pixmap = Pixmap::new(width, height).ok_or(SvgError::Allocation(width, height))?;
    pixmap.fill(Rgb::WHITE.to_skia());
    renderer.paint(
        &mut pixmap,
        PaintRect {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        },
    )?;
    Ok(pixmap)
}

pub fn convert(
    kind: ExportKind,
    record: &RenderRecord,
    settings: &ExportSettings,
    renderer: &mut dyn SvgRenderer,
    temp_files: &mut TempFileStore,
) -> Result<ClipboardPayload, ExportError> {
    let payload = match kind {
        ExportKind::Vector => {
            ClipboardPayload::Svg(svg::recolor(record.markup(), &settings.color))
        }
        ExportKind::VectorText => ClipboardPayload::Text(record.markup_text()),
        ExportKind::SourceText => ClipboardPayload::Text(record.formula().to_string()),
        ExportKind::Raster => {
            let pixmap = rasterize(record, settings, renderer)?;
            ClipboardPayload::Image(RasterImage {
                width: pixmap.width(),
                height: pixmap.height(),
                rgba: pixmap.take(),
            })
        }
        ExportKind::RasterTempFile => {
            let pixmap = rasterize(record, settings, renderer)?;
            let png = pixmap
                .encode_png()
                .map_err(|err| ExportError::Encode(err.to_string()))?;
            let path = temp_files.create_png(&png)?;
            info!("Exported {:?} to {}", record.formula(), path.display());
            ClipboardPayload::FileUrls(vec![file_url(&path)])
        }
    };
    Ok(payload)
}

/// `file://` URL for an absolute path, percent-encoding what URLs reserve.
pub fn file_url(path: &Path) -> String {
    let mut url = String::from("file://");
    for byte in path.to_string_lossy().bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'/' | b'-' | b'_' | b'.' | b'~' => {
                url.push(byte as char)
            }
            other => url.push_str(&format!("%{:02X}", other)),
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_keys_parse_and_cycle() {
        for kind in ExportKind::ALL {
            assert_eq!(kind.key().parse::<ExportKind>(), Ok(kind));
        }
        assert_eq!("Raster-Temp-File".parse(), Ok(ExportKind::RasterTempFile));
        assert!("jpeg".parse::<ExportKind>().is_err());
        assert_eq!(ExportKind::SourceText.next(), ExportKind::Vector);
        assert_eq!(ExportKind::Vector.next(), ExportKind::VectorText);
    }

    #[test]
    fn raster_dimensions_round_and_clamp() {
        assert_eq!(raster_dimensions(Size::new(2000.0, 1000.0), 12.0).unwrap(), (167, 83));
        assert_eq!(raster_dimensions(Size::new(3.0, 2.0), 12.0).unwrap(), (1, 1));
        assert!(matches!(
            raster_dimensions(Size::new(3.0, 2.0), 0.0),
            Err(ExportError::InvalidReduction(_))
        ));
    }

    #[test]
    fn file_urls_escape_spaces() {
        assert_eq!(
            file_url(Path::new("/tmp/my dir/a.png")),
            "file:///tmp/my%20dir/a.png"
        );
    }
}
