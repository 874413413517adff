//! Driver behavior quirks.

use bitflags::bitflags;

bitflags! {
    /// Workarounds a display backend asks the harness to apply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DriverQuirks: u32 {
        /// Issue a buffer swap against the off-screen surface before every
        /// emulated client wait. Some drivers reorder later render passes
        /// ahead of a display-level fence; the swap blocks that reordering
        /// so work submitted before the fence retires first.
        const SWAP_BEFORE_CLIENT_WAIT = 1 << 0;
    }
}
