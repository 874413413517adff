//! Fence-sync emulation over the display's sync extension.
//!
//! Run once per context, right after the command interface loads:
//!
//! 1. If the driver advertises fence-sync natively, keep its entry points.
//! 2. Otherwise, resolve the display-level sync extension. Resolution is
//!    all-or-nothing, so installation is atomic.
//! 3. If that is also missing, the context proceeds without sync support;
//!    this is a degraded capability, never a construction failure.
//!
//! The installed shim translates between the two sync models: the one
//! supported creation condition, the flush flag, and the three-way wait
//! result all map one-to-one. A server wait without a resolved non-blocking
//! entry point degrades to an unbounded client wait.

use std::sync::Arc;

use tracing::debug;
use vitrea_gl::{
    FenceSync, GlApi, GlFence, GlInterface, SyncCondition, SyncFlags, WaitStatus,
    native_sync_advertised,
};
use vitrea_platform::{
    DISPLAY_WAIT_FOREVER, DisplayId, DisplaySyncFns, DisplayWaitFlags, DisplayWaitStatus,
    DriverQuirks, PlatformDisplay, PlatformSyncId, SurfaceId,
};

/// Extension name the shim advertises so capability probes see fence-sync
/// as present.
pub const EMULATED_SYNC_EXTENSION: &str = "GL_APPLE_sync";

/// Build the context's interface, installing sync support where possible.
pub(crate) fn install_fence_sync(
    platform: &Arc<dyn PlatformDisplay>,
    display: DisplayId,
    surface: SurfaceId,
    api: Arc<dyn GlApi>,
) -> GlInterface {
    if native_sync_advertised(api.as_ref()) {
        return GlInterface::new(api);
    }

    let Some(fns) = platform.fence_sync_fns(display) else {
        debug!("no native or display-level fence-sync; sync unavailable for this context");
        return GlInterface::new(api);
    };

    let swap_before_wait = platform
        .quirks()
        .contains(DriverQuirks::SWAP_BEFORE_CLIENT_WAIT);
    debug!(
        server_wait = fns.server_wait.is_some(),
        swap_before_wait, "installing emulated fence-sync over the display sync extension"
    );
    let shim = EmulatedFenceSync {
        platform: platform.clone(),
        display,
        surface,
        fns,
        swap_before_wait,
    };
    GlInterface::with_emulated_sync(api, Arc::new(shim), EMULATED_SYNC_EXTENSION)
}

/// Fence-sync backed by display-level sync objects.
struct EmulatedFenceSync {
    platform: Arc<dyn PlatformDisplay>,
    display: DisplayId,
    surface: SurfaceId,
    fns: DisplaySyncFns,
    swap_before_wait: bool,
}

impl EmulatedFenceSync {
    fn sync_id(fence: &GlFence) -> PlatformSyncId {
        PlatformSyncId::from_raw(fence.raw())
    }
}

impl FenceSync for EmulatedFenceSync {
    fn create(&self, condition: SyncCondition, flags: SyncFlags) -> Option<GlFence> {
        // The display extension only expresses completion fences with no
        // creation flags; anything else is caller misuse.
        debug_assert_eq!(condition, SyncCondition::GpuCommandsComplete);
        debug_assert!(flags.is_empty());
        (self.fns.create)(self.display).map(|sync| GlFence::from_raw(sync.raw()))
    }

    fn client_wait(&self, fence: &GlFence, flags: SyncFlags, timeout_ns: u64) -> WaitStatus {
        if self.swap_before_wait {
            // Some drivers reorder later render passes ahead of a display
            // fence; a swap against the unused off-screen surface blocks
            // the reordering so earlier work retires before the wait.
            if let Err(err) = self.platform.swap_buffers(self.display, self.surface) {
                debug!(%err, "pre-wait buffer swap failed");
            }
        }

        let mut display_flags = DisplayWaitFlags::empty();
        if flags.contains(SyncFlags::FLUSH_COMMANDS) {
            display_flags |= DisplayWaitFlags::FLUSH_COMMANDS;
        }

        match (self.fns.client_wait)(self.display, Self::sync_id(fence), display_flags, timeout_ns)
        {
            DisplayWaitStatus::Satisfied => WaitStatus::ConditionSatisfied,
            DisplayWaitStatus::TimedOut => WaitStatus::TimeoutExpired,
            DisplayWaitStatus::Failed => WaitStatus::Failed,
        }
    }

    fn server_wait(&self, fence: &GlFence) {
        if let Some(server_wait) = &self.fns.server_wait {
            server_wait(self.display, Self::sync_id(fence));
            return;
        }
        // No non-blocking entry point resolved; block here instead.
        (self.fns.client_wait)(
            self.display,
            Self::sync_id(fence),
            DisplayWaitFlags::empty(),
            DISPLAY_WAIT_FOREVER,
        );
    }

    fn delete(&self, fence: GlFence) {
        (self.fns.destroy)(self.display, Self::sync_id(&fence));
    }

    fn is_valid(&self, fence: &GlFence) -> bool {
        (self.fns.status)(self.display, Self::sync_id(fence)).is_some()
    }
}
