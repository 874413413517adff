//! SVG markup to raster target to PNG file.

use std::path::Path;
use std::sync::Arc;

use resvg::usvg::fontdb;
use resvg::{tiny_skia, usvg};
use tracing::debug;

use crate::TypefaceProvider;

/// Rendering errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgError {
    /// The markup did not parse.
    Parse(String),
    /// Requested or intrinsic dimensions were unusable (zero or overflow).
    InvalidDimensions,
    /// PNG encoding or writing failed.
    Encode(String),
}

impl std::fmt::Display for SvgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "could not parse SVG: {}", msg),
            Self::InvalidDimensions => write!(f, "invalid raster dimensions"),
            Self::Encode(msg) => write!(f, "PNG encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for SvgError {}

/// Render `markup` into a premultiplied-RGBA raster target.
///
/// With `size`, the document is scaled to exactly those pixel dimensions;
/// without it, the document's intrinsic size is used. Text resolves only
/// against the typefaces registered with `fonts` - system fonts are never
/// consulted, so output is identical across machines.
pub fn render_svg(
    markup: &str,
    fonts: &TypefaceProvider,
    size: Option<(u32, u32)>,
) -> Result<tiny_skia::Pixmap, SvgError> {
    let mut db = fontdb::Database::new();
    fonts.install_into(&mut db);

    let mut options = usvg::Options::default();
    options.fontdb = Arc::new(db);
    let tree =
        usvg::Tree::from_str(markup, &options).map_err(|err| SvgError::Parse(err.to_string()))?;

    let intrinsic = tree.size();
    let (width, height) = match size {
        Some((width, height)) => (width, height),
        None => {
            let int_size = intrinsic.to_int_size();
            (int_size.width(), int_size.height())
        }
    };
    if width == 0 || height == 0 {
        return Err(SvgError::InvalidDimensions);
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(SvgError::InvalidDimensions)?;
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / intrinsic.width(),
        height as f32 / intrinsic.height(),
    );
    debug!(width, height, "rendering SVG document");
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Render `markup` and encode the raster target to a PNG file at `path`.
pub fn render_svg_to_png(
    markup: &str,
    fonts: &TypefaceProvider,
    size: Option<(u32, u32)>,
    path: impl AsRef<Path>,
) -> Result<(), SvgError> {
    let pixmap = render_svg(markup, fonts, size)?;
    pixmap
        .save_png(path.as_ref())
        .map_err(|err| SvgError::Encode(err.to_string()))
}
