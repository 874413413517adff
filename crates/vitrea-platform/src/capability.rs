//! Display-level capability bundles.
//!
//! A backend resolves each bundle once, when a context is built, by looking
//! its entry points up in the driver. Required entry points resolve
//! all-or-nothing: a bundle either comes back complete or not at all, so
//! installing a shim over it is atomic. Optional entry points are `None`
//! slots inside an otherwise complete bundle.

use std::sync::Arc;

use bitflags::bitflags;
use vitrea_gl::TextureId;

use crate::{ContextId, DisplayId, ImageId, PlatformSyncId};

bitflags! {
    /// Flags accepted by the display's client-wait entry point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DisplayWaitFlags: u32 {
        /// Flush the bound context's command stream before waiting.
        const FLUSH_COMMANDS = 1 << 0;
    }
}

/// Timeout sentinel meaning "block until the sync object signals".
pub const DISPLAY_WAIT_FOREVER: u64 = u64::MAX;

/// Outcome of a display-level client wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayWaitStatus {
    Satisfied,
    TimedOut,
    Failed,
}

/// Insert a fence sync object into the bound context's command stream.
pub type CreateSyncFn = Arc<dyn Fn(DisplayId) -> Option<PlatformSyncId> + Send + Sync>;

/// Block until the sync signals, the timeout (nanoseconds) elapses, or the
/// wait fails.
pub type ClientWaitSyncFn =
    Arc<dyn Fn(DisplayId, PlatformSyncId, DisplayWaitFlags, u64) -> DisplayWaitStatus + Send + Sync>;

/// Destroy a sync object.
pub type DestroySyncFn = Arc<dyn Fn(DisplayId, PlatformSyncId) + Send + Sync>;

/// Query a sync object's signaled state; `None` if the handle is invalid.
pub type SyncStatusFn = Arc<dyn Fn(DisplayId, PlatformSyncId) -> Option<bool> + Send + Sync>;

/// Queue a GPU-side wait without blocking the calling thread.
pub type ServerWaitSyncFn = Arc<dyn Fn(DisplayId, PlatformSyncId) -> bool + Send + Sync>;

/// The display's fence-sync extension, fully resolved.
///
/// `server_wait` is resolved separately from the rest: some platforms
/// support create/wait/destroy but no non-blocking GPU-side wait.
#[derive(Clone)]
pub struct DisplaySyncFns {
    pub create: CreateSyncFn,
    pub client_wait: ClientWaitSyncFn,
    pub destroy: DestroySyncFn,
    pub status: SyncStatusFn,
    pub server_wait: Option<ServerWaitSyncFn>,
}

impl std::fmt::Debug for DisplaySyncFns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplaySyncFns")
            .field("server_wait", &self.server_wait.is_some())
            .finish()
    }
}

/// Wrap a texture of the bound context as a cross-API image.
pub type CreateImageFn =
    Arc<dyn Fn(DisplayId, ContextId, TextureId) -> Option<ImageId> + Send + Sync>;

/// Destroy a cross-API image handle.
pub type DestroyImageFn = Arc<dyn Fn(DisplayId, ImageId) + Send + Sync>;

/// Bind an image as the backing store of the texture currently bound to the
/// external-texture target.
pub type BindExternalImageFn = Arc<dyn Fn(ImageId) + Send + Sync>;

/// The display's image extension, fully resolved.
///
/// `bind_external` comes from the GL side of the driver and may be missing
/// even when the display can create images; importing then fails while
/// export still works.
#[derive(Clone)]
pub struct DisplayImageFns {
    pub create_from_texture: CreateImageFn,
    pub destroy: DestroyImageFn,
    pub bind_external: Option<BindExternalImageFn>,
}

impl std::fmt::Debug for DisplayImageFns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayImageFns")
            .field("bind_external", &self.bind_external.is_some())
            .finish()
    }
}
