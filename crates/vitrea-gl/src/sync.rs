//! Fence-sync vocabulary shared by native and emulated implementations.

use bitflags::bitflags;

/// The condition a fence waits for.
///
/// Only completion of previously submitted commands is supported; both the
/// native and the emulated path reject anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCondition {
    GpuCommandsComplete,
}

bitflags! {
    /// Flags accepted by [`FenceSync::client_wait`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SyncFlags: u32 {
        /// Flush the command stream before starting to wait.
        const FLUSH_COMMANDS = 1 << 0;
    }
}

/// Timeout sentinel meaning "block until the fence signals".
pub const WAIT_FOREVER: u64 = u64::MAX;

/// Outcome of a client wait, identical for native and emulated fences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The fence signaled within the timeout.
    ConditionSatisfied,
    /// The timeout elapsed before the fence signaled.
    TimeoutExpired,
    /// The driver rejected the wait.
    Failed,
}

/// An opaque fence handle marking a point in the submitted command stream.
///
/// Fences are single-owner: they are created by [`FenceSync::create`] and
/// consumed by [`FenceSync::delete`]. A fence must only be waited on through
/// the interface of the context that created it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GlFence(u64);

impl GlFence {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Fence-sync operations.
///
/// A context carries at most one implementation, chosen when the context is
/// built: the driver's own entry points when it advertises fence-sync
/// natively, or a translation shim over the platform display's sync
/// extension otherwise. Callers observe the same semantics either way.
pub trait FenceSync: Send + Sync {
    /// Insert a fence into the command stream.
    ///
    /// Returns `None` if the driver rejected the creation.
    fn create(&self, condition: SyncCondition, flags: SyncFlags) -> Option<GlFence>;

    /// Block the calling thread until the fence signals, the timeout (in
    /// nanoseconds) elapses, or the wait fails. A zero timeout polls;
    /// [`WAIT_FOREVER`] blocks indefinitely.
    fn client_wait(&self, fence: &GlFence, flags: SyncFlags, timeout_ns: u64) -> WaitStatus;

    /// Ask the GPU to wait for the fence without blocking the calling
    /// thread. Implementations without a non-blocking path fall back to an
    /// unbounded client wait.
    fn server_wait(&self, fence: &GlFence);

    /// Release the fence. The handle must not be used afterwards.
    fn delete(&self, fence: GlFence);

    /// Whether `fence` still names a live sync object.
    fn is_valid(&self, fence: &GlFence) -> bool;
}
