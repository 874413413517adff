//! The context handle and its lifecycle.

use std::sync::Arc;

use tracing::debug;
use vitrea_gl::{
    ExtensionSet, GlFence, GlInterface, GlStandard, SyncCondition, SyncFlags, WaitStatus,
};
use vitrea_platform::{
    ConfigId, ContextId, DisplayId, DisplayImageFns, PlatformDisplay, PlatformError, SurfaceId,
};

use crate::negotiate;
use crate::restore::CurrentGuard;
use crate::{HarnessError, SyncError};

/// Options for context negotiation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextOptions {
    /// Pin negotiation to one family, or try them in preference order.
    pub standard: Option<GlStandard>,
    /// For the embedded family, attempt a version 3 context before falling
    /// back to version 2. Opt-in: the newer request crashes some older
    /// drivers outright, which no fallback can recover from.
    pub try_newer_embedded_context: bool,
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Negotiate exactly this family or fail.
    pub fn for_standard(standard: GlStandard) -> Self {
        Self {
            standard: Some(standard),
            ..Self::default()
        }
    }

    pub fn try_newer_embedded_context(mut self, enabled: bool) -> Self {
        self.try_newer_embedded_context = enabled;
        self
    }
}

/// A reference-counted display connection.
///
/// Handles sharing one platform display hold the same `Arc`; the platform's
/// connection is released when the last owner drops, and only then does the
/// underlying connection close.
pub struct DisplayConnection {
    platform: Arc<dyn PlatformDisplay>,
    id: DisplayId,
}

impl DisplayConnection {
    pub(crate) fn open(platform: Arc<dyn PlatformDisplay>) -> Result<Arc<Self>, PlatformError> {
        let id = platform.connect()?;
        Ok(Arc::new(Self { platform, id }))
    }

    pub fn id(&self) -> DisplayId {
        self.id
    }
}

impl Drop for DisplayConnection {
    fn drop(&mut self) {
        self.platform.release(self.id);
    }
}

impl std::fmt::Debug for DisplayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayConnection").field("id", &self.id).finish()
    }
}

/// An off-screen GPU context for test use.
///
/// Owns the display reference, rendering context, and a 1x1 off-screen
/// surface as one unit. The context is not current when the handle is
/// returned; call [`make_current`](Self::make_current) first.
///
/// A handle must be used from one thread at a time. Making the context
/// current on a second thread without unbinding it from the first is caller
/// misuse the harness does not detect.
pub struct GpuTestContext {
    platform: Arc<dyn PlatformDisplay>,
    display: Arc<DisplayConnection>,
    config: ConfigId,
    context: ContextId,
    surface: SurfaceId,
    standard: GlStandard,
    interface: Arc<GlInterface>,
    display_extensions: ExtensionSet,
    image_fns: Option<DisplayImageFns>,
    released: bool,
}

impl GpuTestContext {
    /// Negotiate a context.
    ///
    /// Tries each candidate family in order and returns the first that
    /// fully builds; per-candidate failures are logged and recovered by
    /// advancing to the next. Only exhaustion of all candidates is an
    /// error, and no partially built context ever escapes.
    ///
    /// `share` joins the new context to an existing one's object namespace
    /// and must be of the negotiated family.
    pub fn new(
        platform: Arc<dyn PlatformDisplay>,
        options: ContextOptions,
        share: Option<&GpuTestContext>,
    ) -> Result<Self, HarnessError> {
        let negotiated = negotiate::negotiate(&platform, options, share)?;
        Ok(Self {
            platform,
            display: negotiated.display,
            config: negotiated.config,
            context: negotiated.context,
            surface: negotiated.surface,
            standard: negotiated.standard,
            interface: negotiated.interface,
            display_extensions: negotiated.display_extensions,
            image_fns: negotiated.image_fns,
            released: false,
        })
    }

    /// The family this context speaks.
    pub fn standard(&self) -> GlStandard {
        self.standard
    }

    /// The validated command interface.
    pub fn interface(&self) -> &Arc<GlInterface> {
        &self.interface
    }

    /// The display-level extension list captured at negotiation time.
    pub fn display_extensions(&self) -> &ExtensionSet {
        &self.display_extensions
    }

    pub fn display_id(&self) -> DisplayId {
        self.display.id()
    }

    pub fn context_id(&self) -> ContextId {
        self.context
    }

    /// The configuration the context and surface were built against.
    pub fn config_id(&self) -> ConfigId {
        self.config
    }

    pub(crate) fn image_fns(&self) -> Option<&DisplayImageFns> {
        self.image_fns.as_ref()
    }

    /// Bind this context and its surface on the calling thread, superseding
    /// whatever was bound before.
    pub fn make_current(&self) -> Result<(), PlatformError> {
        self.platform.make_current(
            self.display.id(),
            Some(self.surface),
            Some(self.surface),
            Some(self.context),
        )
    }

    /// Unbind any context from the calling thread.
    pub fn make_not_current(&self) -> Result<(), PlatformError> {
        self.platform.make_current(self.display.id(), None, None, None)
    }

    /// Capture the calling thread's binding for scoped restoration.
    ///
    /// Returns an inert guard when this handle's own context is already
    /// current, since there is nothing to restore to.
    pub fn auto_restore(&self) -> CurrentGuard {
        let current = self.platform.current();
        if current.context == Some(self.context) {
            return CurrentGuard::inert(self.platform.clone(), self.display.id());
        }
        CurrentGuard::capture(self.platform.clone(), self.display.id())
    }

    /// Create an independent context of the same family sharing this one's
    /// object namespace.
    pub fn clone_shared(&self) -> Result<GpuTestContext, HarnessError> {
        GpuTestContext::new(
            self.platform.clone(),
            ContextOptions::for_standard(self.standard),
            Some(self),
        )
    }

    // =========================================================================
    // Fence sync
    // =========================================================================

    /// Whether fence-sync is available on this context, natively or through
    /// the emulation shim.
    pub fn supports_fence_sync(&self) -> bool {
        self.interface.supports_fence_sync()
    }

    /// Insert a fence into the command stream.
    pub fn insert_fence(&self) -> Result<GlFence, SyncError> {
        let sync = self.interface.fence_sync().ok_or(SyncError::Unsupported)?;
        sync.create(SyncCondition::GpuCommandsComplete, SyncFlags::empty())
            .ok_or(SyncError::CreationFailed)
    }

    /// Block until the fence signals, the timeout (nanoseconds) elapses, or
    /// the wait fails. Pass [`vitrea_gl::WAIT_FOREVER`] to block
    /// indefinitely and zero to poll.
    pub fn client_wait_fence(
        &self,
        fence: &GlFence,
        flags: SyncFlags,
        timeout_ns: u64,
    ) -> Result<WaitStatus, SyncError> {
        let sync = self.interface.fence_sync().ok_or(SyncError::Unsupported)?;
        Ok(sync.client_wait(fence, flags, timeout_ns))
    }

    /// Queue a GPU-side wait for the fence without blocking this thread.
    pub fn server_wait_fence(&self, fence: &GlFence) -> Result<(), SyncError> {
        let sync = self.interface.fence_sync().ok_or(SyncError::Unsupported)?;
        sync.server_wait(fence);
        Ok(())
    }

    /// Release a fence.
    pub fn delete_fence(&self, fence: GlFence) -> Result<(), SyncError> {
        let sync = self.interface.fence_sync().ok_or(SyncError::Unsupported)?;
        sync.delete(fence);
        Ok(())
    }

    /// Whether `fence` still names a live sync object. Always false when
    /// the capability is absent.
    pub fn fence_is_valid(&self, fence: &GlFence) -> bool {
        self.interface
            .fence_sync()
            .is_some_and(|sync| sync.is_valid(fence))
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Tear the context down now. Safe to call more than once; `Drop` calls
    /// it too.
    ///
    /// If this handle's context is bound on the calling thread it is
    /// unbound first, which forces the driver to finish teardown
    /// immediately instead of deferring it until some later unbind.
    pub fn destroy(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.platform.current().context == Some(self.context) {
            if let Err(err) = self.make_not_current() {
                debug!(%err, "failed to unbind context during teardown");
            }
        }
        self.platform.destroy_surface(self.display.id(), self.surface);
        self.platform.destroy_context(self.display.id(), self.context);
        // The display reference is dropped last, with the handle; the
        // connection itself closes only when the final owner goes away.
    }
}

impl Drop for GpuTestContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for GpuTestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuTestContext")
            .field("standard", &self.standard)
            .field("context", &self.context)
            .field("surface", &self.surface)
            .field("sync_backing", &self.interface.sync_backing())
            .finish()
    }
}
