//! The raw command interface loaded per context.

use std::sync::Arc;

use crate::{FenceSync, GlStandard, GlVersion};

/// A GL texture object name. Zero is the "no texture" sentinel.
pub type TextureId = u32;

/// The "no texture" sentinel returned when texture import fails.
pub const NO_TEXTURE: TextureId = 0;

/// Driver error code meaning no error is pending.
pub const NO_ERROR: u32 = 0;

/// Binding targets the harness uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    /// Ordinary 2D texture.
    Texture2D,
    /// External-image texture target, used when importing cross-API images.
    External,
}

/// The GPU command interface a driver exposes for one context.
///
/// Loaded while the context is current. Both the real driver and the mock
/// driver used in tests implement this; methods take `&self` and
/// implementations use interior mutability where they need state.
///
/// Only the operations the harness itself needs are modeled; this is not a
/// general GL binding.
pub trait GlApi: Send + Sync {
    /// The family this interface speaks.
    fn standard(&self) -> GlStandard;

    /// The driver version, or [`GlVersion::ZERO`] if it could not be read.
    fn version(&self) -> GlVersion;

    /// Whether the driver advertises `name`, whole-word matched.
    fn has_extension(&self, name: &str) -> bool;

    /// Pop the oldest pending driver error, or [`NO_ERROR`].
    fn get_error(&self) -> u32;

    /// Create a texture object name.
    fn gen_texture(&self) -> TextureId;

    /// Bind `texture` to `target` on the current context.
    fn bind_texture(&self, target: TextureTarget, texture: TextureId);

    /// Delete a texture object.
    fn delete_texture(&self, texture: TextureId);

    /// Flush the command stream.
    fn flush(&self);

    /// Block until all submitted commands retire.
    fn finish(&self);

    /// The driver's own fence-sync entry points, if it exposes them.
    ///
    /// Returning `Some` here is not enough for the harness to use them; the
    /// driver must also advertise the capability by version or extension
    /// (see [`crate::native_sync_advertised`]), and interface validation
    /// checks the two agree.
    fn native_fence_sync(&self) -> Option<Arc<dyn FenceSync>>;
}
