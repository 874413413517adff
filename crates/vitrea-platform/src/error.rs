//! Platform error type.

use vitrea_gl::GlStandard;

/// Errors reported by a [`crate::PlatformDisplay`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The display service (or its driver library) is not available.
    Unavailable(String),
    /// The display refused to bind the requested API family.
    ApiNotSupported(GlStandard),
    /// No pixel configuration satisfied the request.
    NoMatchingConfig,
    /// A driver call failed; `code` is the driver's error code.
    Driver { call: &'static str, code: u32 },
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "display unavailable: {}", msg),
            Self::ApiNotSupported(standard) => {
                write!(f, "display cannot bind the {} API", standard)
            }
            Self::NoMatchingConfig => write!(f, "no matching pixel configuration"),
            Self::Driver { call, code } => {
                write!(f, "{} failed with driver error {:#06x}", call, code)
            }
        }
    }
}

impl std::error::Error for PlatformError {}
