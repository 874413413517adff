//! Validated command interface with a fixed fence-sync backing.

use std::sync::Arc;

use crate::{
    ExtensionSet, FenceSync, GlApi, GlStandard, GlVersion, TextureId, TextureTarget,
};

/// Which implementation backs the interface's fence-sync slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncBacking {
    /// The driver's own entry points.
    Native,
    /// The translation shim over the platform display's sync extension.
    Emulated,
    /// Fence-sync is unavailable for this context.
    Unsupported,
}

/// Errors reported by [`GlInterface::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    /// The driver did not report a parseable version.
    MissingVersion,
    /// The driver advertises native fence-sync but did not supply the
    /// entry points for it.
    MissingNativeSync,
}

impl std::fmt::Display for InterfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVersion => write!(f, "driver reported no usable version"),
            Self::MissingNativeSync => {
                write!(f, "driver advertises fence-sync but resolved no entry points")
            }
        }
    }
}

impl std::error::Error for InterfaceError {}

/// Whether the driver behind `api` advertises fence-sync natively.
///
/// Desktop drivers carry it from 3.2 or via `GL_ARB_sync`; embedded drivers
/// from 3.0 or via `GL_APPLE_sync` / `GL_NV_fence`.
pub fn native_sync_advertised(api: &dyn GlApi) -> bool {
    match api.standard() {
        GlStandard::Gl => {
            api.version() >= GlVersion::new(3, 2) || api.has_extension("GL_ARB_sync")
        }
        GlStandard::GlEs => {
            api.has_extension("GL_APPLE_sync")
                || api.has_extension("GL_NV_fence")
                || api.version() >= GlVersion::new(3, 0)
        }
    }
}

/// A command interface plus exactly one fence-sync implementation.
///
/// The sync slot is populated once, when the owning context is built, and
/// never changes afterwards: either the driver's native entry points, an
/// emulation shim installed by the harness, or nothing. Extension probes see
/// any names the shim advertises on top of the driver's own list.
pub struct GlInterface {
    api: Arc<dyn GlApi>,
    fence_sync: Option<Arc<dyn FenceSync>>,
    backing: SyncBacking,
    shim_extensions: ExtensionSet,
}

impl GlInterface {
    /// Wrap `api`, taking the driver's native fence-sync if it both
    /// advertises and supplies one.
    pub fn new(api: Arc<dyn GlApi>) -> Self {
        let fence_sync = if native_sync_advertised(api.as_ref()) {
            api.native_fence_sync()
        } else {
            None
        };
        let backing = if fence_sync.is_some() {
            SyncBacking::Native
        } else {
            SyncBacking::Unsupported
        };
        Self {
            api,
            fence_sync,
            backing,
            shim_extensions: ExtensionSet::new(),
        }
    }

    /// Wrap `api` with an emulated fence-sync implementation, advertising
    /// `advertise` as a present extension on top of the driver's list.
    ///
    /// Used when the driver has no native fence-sync but the platform
    /// display's sync extension could back a shim.
    pub fn with_emulated_sync(
        api: Arc<dyn GlApi>,
        shim: Arc<dyn FenceSync>,
        advertise: &str,
    ) -> Self {
        let mut shim_extensions = ExtensionSet::new();
        shim_extensions.add(advertise);
        Self {
            api,
            fence_sync: Some(shim),
            backing: SyncBacking::Emulated,
            shim_extensions,
        }
    }

    pub fn standard(&self) -> GlStandard {
        self.api.standard()
    }

    pub fn version(&self) -> GlVersion {
        self.api.version()
    }

    /// Whether `name` is advertised by the driver or by an installed shim.
    pub fn has_extension(&self, name: &str) -> bool {
        self.api.has_extension(name) || self.shim_extensions.has(name)
    }

    pub fn get_error(&self) -> u32 {
        self.api.get_error()
    }

    pub fn gen_texture(&self) -> TextureId {
        self.api.gen_texture()
    }

    pub fn bind_texture(&self, target: TextureTarget, texture: TextureId) {
        self.api.bind_texture(target, texture);
    }

    pub fn delete_texture(&self, texture: TextureId) {
        self.api.delete_texture(texture);
    }

    pub fn flush(&self) {
        self.api.flush();
    }

    pub fn finish(&self) {
        self.api.finish();
    }

    /// The fence-sync implementation, if any is installed.
    pub fn fence_sync(&self) -> Option<&Arc<dyn FenceSync>> {
        self.fence_sync.as_ref()
    }

    pub fn supports_fence_sync(&self) -> bool {
        self.fence_sync.is_some()
    }

    /// Which implementation backs the sync slot.
    pub fn sync_backing(&self) -> SyncBacking {
        self.backing
    }

    /// The raw command interface.
    pub fn api(&self) -> &Arc<dyn GlApi> {
        &self.api
    }

    /// Check the interface is internally consistent before handing it out.
    pub fn validate(&self) -> Result<(), InterfaceError> {
        if self.api.version() == GlVersion::ZERO {
            return Err(InterfaceError::MissingVersion);
        }
        // A driver that claims fence-sync by version or extension must also
        // have resolved the entry points for it.
        if native_sync_advertised(self.api.as_ref()) && self.backing == SyncBacking::Unsupported {
            return Err(InterfaceError::MissingNativeSync);
        }
        Ok(())
    }
}

impl std::fmt::Debug for GlInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlInterface")
            .field("standard", &self.api.standard())
            .field("version", &self.api.version())
            .field("sync_backing", &self.backing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtensionSet, FenceSync, GlFence, SyncCondition, SyncFlags, WaitStatus};

    struct StubSync;

    impl FenceSync for StubSync {
        fn create(&self, _: SyncCondition, _: SyncFlags) -> Option<GlFence> {
            Some(GlFence::from_raw(1))
        }
        fn client_wait(&self, _: &GlFence, _: SyncFlags, _: u64) -> WaitStatus {
            WaitStatus::ConditionSatisfied
        }
        fn server_wait(&self, _: &GlFence) {}
        fn delete(&self, _: GlFence) {}
        fn is_valid(&self, _: &GlFence) -> bool {
            true
        }
    }

    struct StubApi {
        standard: GlStandard,
        version: GlVersion,
        extensions: ExtensionSet,
        native_sync: bool,
    }

    impl GlApi for StubApi {
        fn standard(&self) -> GlStandard {
            self.standard
        }
        fn version(&self) -> GlVersion {
            self.version
        }
        fn has_extension(&self, name: &str) -> bool {
            self.extensions.has(name)
        }
        fn get_error(&self) -> u32 {
            crate::NO_ERROR
        }
        fn gen_texture(&self) -> TextureId {
            1
        }
        fn bind_texture(&self, _: TextureTarget, _: TextureId) {}
        fn delete_texture(&self, _: TextureId) {}
        fn flush(&self) {}
        fn finish(&self) {}
        fn native_fence_sync(&self) -> Option<Arc<dyn FenceSync>> {
            self.native_sync.then(|| Arc::new(StubSync) as Arc<dyn FenceSync>)
        }
    }

    fn stub(standard: GlStandard, version: GlVersion, exts: &str, native_sync: bool) -> Arc<StubApi> {
        Arc::new(StubApi {
            standard,
            version,
            extensions: ExtensionSet::parse(exts),
            native_sync,
        })
    }

    #[test]
    fn desktop_advertises_sync_by_version_or_extension() {
        assert!(native_sync_advertised(
            stub(GlStandard::Gl, GlVersion::new(3, 2), "", true).as_ref()
        ));
        assert!(native_sync_advertised(
            stub(GlStandard::Gl, GlVersion::new(2, 1), "GL_ARB_sync", true).as_ref()
        ));
        assert!(!native_sync_advertised(
            stub(GlStandard::Gl, GlVersion::new(2, 1), "", false).as_ref()
        ));
    }

    #[test]
    fn embedded_advertises_sync_by_version_or_extension() {
        assert!(native_sync_advertised(
            stub(GlStandard::GlEs, GlVersion::new(3, 0), "", true).as_ref()
        ));
        assert!(native_sync_advertised(
            stub(GlStandard::GlEs, GlVersion::new(2, 0), "GL_NV_fence", true).as_ref()
        ));
        assert!(!native_sync_advertised(
            stub(GlStandard::GlEs, GlVersion::new(2, 0), "", false).as_ref()
        ));
    }

    #[test]
    fn new_picks_native_backing_when_advertised() {
        let iface = GlInterface::new(stub(GlStandard::GlEs, GlVersion::new(3, 0), "", true));
        assert_eq!(iface.sync_backing(), SyncBacking::Native);
        assert!(iface.supports_fence_sync());
        assert!(iface.validate().is_ok());
    }

    #[test]
    fn validate_rejects_advertised_sync_without_entry_points() {
        let iface = GlInterface::new(stub(GlStandard::Gl, GlVersion::new(4, 6), "", false));
        assert_eq!(iface.sync_backing(), SyncBacking::Unsupported);
        assert_eq!(iface.validate(), Err(InterfaceError::MissingNativeSync));
    }

    #[test]
    fn validate_rejects_zero_version() {
        let iface = GlInterface::new(stub(GlStandard::Gl, GlVersion::ZERO, "", false));
        assert_eq!(iface.validate(), Err(InterfaceError::MissingVersion));
    }

    #[test]
    fn shim_extension_is_advertised() {
        let api = stub(GlStandard::GlEs, GlVersion::new(2, 0), "", false);
        let iface = GlInterface::with_emulated_sync(api, Arc::new(StubSync), "GL_APPLE_sync");
        assert_eq!(iface.sync_backing(), SyncBacking::Emulated);
        assert!(iface.has_extension("GL_APPLE_sync"));
        assert!(iface.validate().is_ok());
    }
}
