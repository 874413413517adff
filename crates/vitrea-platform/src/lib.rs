//! Platform display layer for the Vitrea test harness.
//!
//! The window-system side of a GL driver: display connections, pixel
//! configurations, contexts, off-screen surfaces, the per-thread current
//! binding, and the display-level capability bundles (fence-sync and image
//! extensions) that the harness resolves once per context.
//!
//! Everything is behind the [`PlatformDisplay`] trait so tests can run
//! against a simulated driver. The real EGL backend lives in [`egl`]
//! (enabled by the `egl` feature) and resolves its entry points dynamically
//! at load time.

pub mod capability;
pub mod config;
pub mod display;
pub mod error;
pub mod handles;
pub mod quirks;

#[cfg(all(feature = "egl", not(target_family = "wasm")))]
pub mod egl;

pub use capability::*;
pub use config::*;
pub use display::*;
pub use error::*;
pub use handles::*;
pub use quirks::*;
