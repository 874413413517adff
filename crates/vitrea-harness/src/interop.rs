//! Cross-API texture interop.
//!
//! Textures can leave a context as opaque images and enter another API's
//! texture namespace, driver permitting. All operations degrade to "not
//! available" results rather than errors: interop is a capability, and the
//! caller is expected to probe it.

use tracing::debug;
use vitrea_gl::{NO_ERROR, TextureId, TextureTarget};
use vitrea_platform::ImageId;

use crate::GpuTestContext;

/// Extension the display must carry to export 2D textures as images.
const IMAGE_EXPORT_EXTENSION: &str = "EGL_KHR_gl_texture_2D_image";

/// Extension the GL driver must carry to import images as textures.
const IMAGE_IMPORT_EXTENSION: &str = "GL_OES_EGL_image_external";

/// An opaque cross-API image wrapping a GPU texture.
///
/// Not a copy: the image aliases the texture's storage. Release it with
/// [`GpuTestContext::release_external_image`]; the handle must not be used
/// afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct ExternalImage {
    id: ImageId,
}

impl ExternalImage {
    pub fn id(&self) -> ImageId {
        self.id
    }
}

impl GpuTestContext {
    /// Wrap `texture` as a cross-API image.
    ///
    /// Returns `None` when the display lacks the export extension or its
    /// entry points did not resolve.
    pub fn export_texture(&self, texture: TextureId) -> Option<ExternalImage> {
        let fns = self.image_fns()?;
        if !self.display_extensions().has(IMAGE_EXPORT_EXTENSION) {
            return None;
        }
        (fns.create_from_texture)(self.display_id(), self.context_id(), texture)
            .map(|id| ExternalImage { id })
    }

    /// Create a texture backed by `image`'s storage.
    ///
    /// The driver's error state is validated before and after the bind; on
    /// any error the allocated texture is deleted and `None` is returned,
    /// leaving no half-imported object behind.
    pub fn import_external_texture(&self, image: &ExternalImage) -> Option<TextureId> {
        let fns = self.image_fns()?;
        let bind_external = fns.bind_external.clone()?;
        let gl = self.interface().clone();
        if !gl.has_extension(IMAGE_IMPORT_EXTENSION) {
            return None;
        }

        // Start from a clean error state so a stale error is not blamed on
        // the import.
        while gl.get_error() != NO_ERROR {}

        let texture = gl.gen_texture();
        if texture == vitrea_gl::NO_TEXTURE {
            return None;
        }
        gl.bind_texture(TextureTarget::External, texture);
        if gl.get_error() != NO_ERROR {
            debug!("external texture bind failed, rolling back");
            gl.delete_texture(texture);
            return None;
        }
        bind_external(image.id);
        if gl.get_error() != NO_ERROR {
            debug!("binding image as texture storage failed, rolling back");
            gl.delete_texture(texture);
            return None;
        }
        Some(texture)
    }

    /// Release a cross-API image handle.
    pub fn release_external_image(&self, image: ExternalImage) {
        if let Some(fns) = self.image_fns() {
            (fns.destroy)(self.display_id(), image.id);
        }
    }
}
