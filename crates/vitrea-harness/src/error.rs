//! Harness error types.

/// Context construction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// Every candidate API family was tried and none produced a working
    /// context.
    NoCompatibleContext,
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCompatibleContext => write!(f, "no compatible GPU context available"),
        }
    }
}

impl std::error::Error for HarnessError {}

/// Fence-sync operation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The context has no fence-sync implementation; the capability is
    /// absent, not broken. Query
    /// [`supports_fence_sync`](crate::GpuTestContext::supports_fence_sync)
    /// before use.
    Unsupported,
    /// The driver rejected fence creation.
    CreationFailed,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "fence sync is not supported by this context"),
            Self::CreationFailed => write!(f, "fence creation failed"),
        }
    }
}

impl std::error::Error for SyncError {}
