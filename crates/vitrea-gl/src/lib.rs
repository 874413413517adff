//! GPU command-interface layer for the Vitrea test harness.
//!
//! This crate models the surface a GL driver exposes to the harness:
//!
//! - [`GlStandard`] - the API family a context speaks (desktop vs. embedded)
//! - [`GlVersion`] - driver version with ordering and string parsing
//! - [`ExtensionSet`] - whole-word extension lookup
//! - [`GlApi`] - the raw command interface loaded per context
//! - [`FenceSync`] - the fence-sync operations, native or emulated
//! - [`GlInterface`] - a validated `GlApi` plus exactly one fence-sync
//!   implementation, fixed for the interface's lifetime
//!
//! The crate is backend-agnostic: the real driver and the mock driver used
//! in tests both implement [`GlApi`], so everything above this layer can be
//! exercised without a GPU.

pub mod api;
pub mod extensions;
pub mod interface;
pub mod standard;
pub mod sync;
pub mod version;

pub use api::*;
pub use extensions::*;
pub use interface::*;
pub use standard::*;
pub use sync::*;
pub use version::*;
