//! Opaque resource identifiers.
//!
//! Each id wraps whatever the backing driver uses to name the resource
//! (a pointer for the EGL backend, a counter for the mock driver). Ids are
//! plain values; ownership and lifetime rules live in the harness layer.

macro_rules! raw_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

raw_id!(
    /// A connection to the platform's display service.
    DisplayId
);
raw_id!(
    /// A negotiated pixel/surface configuration.
    ConfigId
);
raw_id!(
    /// A GPU command-execution context.
    ContextId
);
raw_id!(
    /// A drawable surface.
    SurfaceId
);
raw_id!(
    /// A display-level sync object, backing emulated fences.
    PlatformSyncId
);
raw_id!(
    /// An opaque cross-API image handle.
    ImageId
);
