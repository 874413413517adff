//! Off-screen GPU test-context harness.
//!
//! Creates, manages, and tears down a hardware-accelerated rendering
//! context without a window, for code that needs to execute GPU commands
//! from automated tests:
//!
//! - [`GpuTestContext::new`] negotiates an API family with the driver,
//!   trying desktop first and embedded second unless the caller pinned one,
//!   and backs out of every partially built candidate.
//! - The handle owns its display reference, context, and 1x1 off-screen
//!   surface, exposes make-current / make-not-current, scoped binding
//!   restore, and namespace-sharing clones, and tears everything down
//!   deterministically.
//! - Fence-sync is made uniformly available where possible: the driver's
//!   native support when advertised, otherwise a translation shim over the
//!   display's sync extension. When neither exists the context still works
//!   and sync operations report the capability as absent.
//! - Textures can be exported to and imported from opaque cross-API images
//!   when the display carries the image extension.
//!
//! The harness performs no internal parallelism; a context is used from one
//! thread at a time, and the per-thread current binding is the only global
//! state touched.

pub mod context;
pub mod emulation;
pub mod error;
pub mod interop;
pub mod logging;
mod negotiate;
pub mod restore;

pub use context::*;
pub use error::*;
pub use interop::*;
pub use restore::*;
