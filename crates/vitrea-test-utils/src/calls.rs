//! Recorded driver calls for test assertions.

use vitrea_gl::{GlStandard, SyncFlags, TextureId, TextureTarget};
use vitrea_platform::{ContextId, DisplayWaitFlags, ImageId, SurfaceId};

/// One call observed by the simulated driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Connect,
    Release,
    BindApi(GlStandard),
    ChooseConfig(GlStandard),
    CreateContext {
        standard: GlStandard,
        share: Option<ContextId>,
        client_version: Option<u32>,
    },
    DestroyContext(ContextId),
    CreateSurface {
        width: u32,
        height: u32,
    },
    DestroySurface(SurfaceId),
    MakeCurrent {
        context: Option<ContextId>,
    },
    SwapBuffers(SurfaceId),
    LoadGl(GlStandard),

    CreateSync,
    ClientWaitSync {
        flags: DisplayWaitFlags,
        timeout: u64,
    },
    DestroySync,
    ServerWaitSync,
    SyncStatus,

    CreateImage {
        texture: TextureId,
    },
    DestroyImage(ImageId),
    BindExternalImage(ImageId),

    GenTexture(TextureId),
    BindTexture(TextureTarget, TextureId),
    DeleteTexture(TextureId),
    Flush,
    Finish,

    NativeCreateFence,
    NativeClientWait {
        flags: SyncFlags,
        timeout: u64,
    },
    NativeServerWait,
    NativeDeleteFence,
}
