//! Scoped restoration of the per-thread current binding.

use std::sync::Arc;

use tracing::warn;
use vitrea_platform::{CurrentBinding, DisplayId, PlatformDisplay};

/// A token that restores the current binding captured at creation time.
///
/// Capture the guard, rebind whatever is needed, and let the guard drop:
/// the exact binding present at capture time comes back, including the
/// "nothing bound" state. This keeps the process-wide per-thread binding
/// consistent on every exit path, early returns and errors included.
///
/// An inert guard restores nothing; handles return one when their own
/// context is already bound and no restoration is wanted.
#[must_use = "the prior binding is restored when the guard drops"]
pub struct CurrentGuard {
    platform: Arc<dyn PlatformDisplay>,
    /// Display used to address the unbind when the captured binding had no
    /// display of its own.
    fallback_display: DisplayId,
    saved: Option<CurrentBinding>,
}

impl CurrentGuard {
    /// Capture the calling thread's current binding.
    pub(crate) fn capture(platform: Arc<dyn PlatformDisplay>, fallback_display: DisplayId) -> Self {
        let saved = platform.current();
        Self {
            platform,
            fallback_display,
            saved: Some(saved),
        }
    }

    /// A guard that restores nothing.
    pub(crate) fn inert(platform: Arc<dyn PlatformDisplay>, fallback_display: DisplayId) -> Self {
        Self {
            platform,
            fallback_display,
            saved: None,
        }
    }

    pub fn is_inert(&self) -> bool {
        self.saved.is_none()
    }
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        let Some(binding) = self.saved.take() else {
            return;
        };
        let display = binding.display.unwrap_or(self.fallback_display);
        if let Err(err) =
            self.platform
                .make_current(display, binding.draw, binding.read, binding.context)
        {
            warn!(%err, "failed to restore prior context binding");
        }
    }
}
