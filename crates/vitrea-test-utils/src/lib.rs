//! Test utilities for the Vitrea harness.
//!
//! The centerpiece is [`MockDisplay`], a simulated display driver that
//! implements the same [`vitrea_platform::PlatformDisplay`] trait as the
//! real backend. A [`DriverProfile`] declares exactly what the fake driver
//! supports - which API families, which versions and extensions, which
//! failures to inject - and every driver call is recorded for assertions.
//!
//! # Example
//!
//! ```rust
//! use vitrea_test_utils::{DriverProfile, MockDisplay};
//! use vitrea_platform::PlatformDisplay;
//!
//! let display = MockDisplay::new(DriverProfile::modern());
//! let id = display.connect().unwrap();
//! assert!(display.display_extensions(id).has("EGL_KHR_fence_sync"));
//! display.release(id);
//! assert_eq!(display.open_refs(), 0);
//! ```
//!
//! Methods take `&self` and state lives behind a `parking_lot::Mutex`, so
//! the mock is `Send + Sync` and multi-threaded binding tests work.

pub mod calls;
pub mod mock;
pub mod profile;

pub use calls::*;
pub use mock::*;
pub use profile::*;
