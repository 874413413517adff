//! The platform display trait and the per-thread current binding.

use std::sync::Arc;

use vitrea_gl::{ExtensionSet, GlApi, GlStandard};

use crate::{
    ConfigId, ConfigRequest, ContextId, DisplayId, DisplayImageFns, DisplaySyncFns, DriverQuirks,
    PlatformError, SurfaceId,
};

/// What is bound on a thread: display, draw/read surfaces, context.
///
/// The default value is the unbound state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentBinding {
    pub display: Option<DisplayId>,
    pub draw: Option<SurfaceId>,
    pub read: Option<SurfaceId>,
    pub context: Option<ContextId>,
}

impl CurrentBinding {
    /// The unbound state.
    pub const UNBOUND: CurrentBinding = CurrentBinding {
        display: None,
        draw: None,
        read: None,
        context: None,
    };

    pub fn is_unbound(&self) -> bool {
        self.context.is_none()
    }
}

/// A platform's display service.
///
/// One implementation exists per driver: the EGL backend in production and
/// the mock driver in tests. Implementations are shared behind
/// `Arc<dyn PlatformDisplay>` and must be callable from any thread; the
/// current binding they report and mutate is per calling thread, which is
/// the one piece of implicit global state in the system.
pub trait PlatformDisplay: Send + Sync {
    /// Open (or re-reference) the display connection.
    ///
    /// Idempotent: every successful call must be paired with one
    /// [`release`](Self::release), and the underlying connection closes only
    /// when the last reference is released.
    fn connect(&self) -> Result<DisplayId, PlatformError>;

    /// Drop one reference to the connection, closing it if this was the
    /// last owner.
    fn release(&self, display: DisplayId);

    /// The display-level extension list.
    fn display_extensions(&self, display: DisplayId) -> ExtensionSet;

    /// Bind the display to an API family for subsequent context creation.
    fn bind_api(&self, display: DisplayId, standard: GlStandard) -> Result<(), PlatformError>;

    /// Negotiate a pixel configuration.
    fn choose_config(
        &self,
        display: DisplayId,
        request: &ConfigRequest,
    ) -> Result<ConfigId, PlatformError>;

    /// Create a rendering context.
    ///
    /// `share` must name a live context of the same family; `client_version`
    /// is only meaningful for the embedded family.
    fn create_context(
        &self,
        display: DisplayId,
        config: ConfigId,
        standard: GlStandard,
        share: Option<ContextId>,
        client_version: Option<u32>,
    ) -> Result<ContextId, PlatformError>;

    fn destroy_context(&self, display: DisplayId, context: ContextId);

    /// Create an off-screen surface against `config`.
    fn create_offscreen_surface(
        &self,
        display: DisplayId,
        config: ConfigId,
        width: u32,
        height: u32,
    ) -> Result<SurfaceId, PlatformError>;

    fn destroy_surface(&self, display: DisplayId, surface: SurfaceId);

    /// Bind (or, with all `None`, unbind) a context and surfaces on the
    /// calling thread. Binding a new context implicitly supersedes whatever
    /// was bound on this thread before.
    fn make_current(
        &self,
        display: DisplayId,
        draw: Option<SurfaceId>,
        read: Option<SurfaceId>,
        context: Option<ContextId>,
    ) -> Result<(), PlatformError>;

    /// The calling thread's current binding.
    fn current(&self) -> CurrentBinding;

    /// Swap `surface`'s buffers. For the harness this is only used as a
    /// command-stream ordering barrier, never to present pixels.
    fn swap_buffers(&self, display: DisplayId, surface: SurfaceId) -> Result<(), PlatformError>;

    /// Load the GPU command interface for the context current on the
    /// calling thread. Must be called with a context of `standard` bound.
    fn load_gl(
        &self,
        display: DisplayId,
        standard: GlStandard,
    ) -> Result<Arc<dyn GlApi>, PlatformError>;

    /// Resolve the display's fence-sync extension, or `None` if it is not
    /// advertised or any required entry point is missing.
    fn fence_sync_fns(&self, display: DisplayId) -> Option<DisplaySyncFns>;

    /// Resolve the display's image extension, or `None` if it is not
    /// advertised or any required entry point is missing.
    fn image_fns(&self, display: DisplayId) -> Option<DisplayImageFns>;

    /// Workarounds the harness should apply on top of this backend.
    fn quirks(&self) -> DriverQuirks {
        DriverQuirks::empty()
    }
}
