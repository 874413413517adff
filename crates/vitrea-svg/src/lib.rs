//! SVG rendering for harness test output.
//!
//! A thin wrapper over the `resvg` stack: callers register typefaces with a
//! [`TypefaceProvider`], hand serialized markup to [`render_svg`] or
//! [`render_svg_to_png`], and get a raster target of the requested or
//! intrinsic size back. Document parsing, shaping, rasterization, and PNG
//! encoding all belong to the external libraries; this crate only carries
//! the registration and selection semantics the harness tests rely on.

pub mod render;
pub mod typeface;

pub use render::*;
pub use typeface::*;

// The underlying stack, for callers that need to work with the raster
// target or the font database directly.
pub use resvg::usvg::fontdb;
pub use resvg::{tiny_skia, usvg};
