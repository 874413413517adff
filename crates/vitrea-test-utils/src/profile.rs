//! Declarative description of what the simulated driver supports.

use vitrea_gl::GlVersion;
use vitrea_platform::{DisplayWaitStatus, DriverQuirks};

/// One API family as the fake driver exposes it.
#[derive(Debug, Clone)]
pub struct ApiProfile {
    pub version: GlVersion,
    pub extensions: Vec<String>,
}

impl ApiProfile {
    pub fn new(version: GlVersion, extensions: &[&str]) -> Self {
        Self {
            version,
            extensions: extensions.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// Everything the simulated driver supports, plus failure injection.
///
/// Fields are public; tests construct a preset and mutate what they need.
#[derive(Debug, Clone)]
pub struct DriverProfile {
    /// Desktop family support, or `None` if the driver refuses to bind it.
    pub desktop: Option<ApiProfile>,
    /// Embedded family support.
    pub gles: Option<ApiProfile>,
    /// Display-level extension names.
    pub display_extensions: Vec<String>,
    /// Workarounds the driver asks for.
    pub quirks: DriverQuirks,

    /// Fail [`connect`](vitrea_platform::PlatformDisplay::connect).
    pub fail_connect: bool,
    /// Report no matching pixel configuration.
    pub fail_choose_config: bool,
    /// Fail context creation.
    pub fail_create_context: bool,
    /// Fail off-screen surface creation.
    pub fail_create_surface: bool,
    /// Fail every make-current.
    pub fail_make_current: bool,
    /// Advertise native fence-sync but resolve no entry points for it, so
    /// interface validation fails.
    pub broken_native_sync: bool,

    /// Override the result of display-level client waits.
    pub forced_wait_status: Option<DisplayWaitStatus>,
    /// Override the result of native client waits.
    pub forced_native_wait: Option<vitrea_gl::WaitStatus>,
    /// Raise a driver error when a texture is bound to the external target.
    pub error_on_bind_texture: bool,
    /// Raise a driver error when an external image is bound as backing
    /// store.
    pub error_on_bind_external: bool,
}

impl DriverProfile {
    fn base() -> Self {
        Self {
            desktop: None,
            gles: None,
            display_extensions: Vec::new(),
            quirks: DriverQuirks::empty(),
            fail_connect: false,
            fail_choose_config: false,
            fail_create_context: false,
            fail_create_surface: false,
            fail_make_current: false,
            broken_native_sync: false,
            forced_wait_status: None,
            forced_native_wait: None,
            error_on_bind_texture: false,
            error_on_bind_external: false,
        }
    }

    /// A current desktop driver: both families, native fence-sync
    /// everywhere, image interop available.
    pub fn modern() -> Self {
        Self {
            desktop: Some(ApiProfile::new(GlVersion::new(4, 6), &[])),
            gles: Some(ApiProfile::new(
                GlVersion::new(3, 2),
                &["GL_OES_EGL_image_external"],
            )),
            display_extensions: [
                "EGL_KHR_fence_sync",
                "EGL_KHR_wait_sync",
                "EGL_KHR_image",
                "EGL_KHR_gl_texture_2D_image",
            ]
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
            ..Self::base()
        }
    }

    /// An old embedded driver: ES 2.0 only, no native fence-sync, but the
    /// display carries the sync extension the emulation shim needs.
    pub fn legacy_embedded() -> Self {
        Self {
            gles: Some(ApiProfile::new(
                GlVersion::new(2, 0),
                &["GL_OES_EGL_image_external"],
            )),
            display_extensions: [
                "EGL_KHR_fence_sync",
                "EGL_KHR_image",
                "EGL_KHR_gl_texture_2D_image",
            ]
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
            ..Self::base()
        }
    }

    /// A driver with no fence-sync story at all: ES 2.0, no native support,
    /// no display sync extension. Contexts still build; sync is reported as
    /// unavailable.
    pub fn bare() -> Self {
        Self {
            gles: Some(ApiProfile::new(GlVersion::new(2, 0), &[])),
            ..Self::base()
        }
    }

    /// Add a quirk on top of a preset.
    pub fn with_quirks(mut self, quirks: DriverQuirks) -> Self {
        self.quirks |= quirks;
        self
    }

    /// Remove a display extension from a preset.
    pub fn without_display_extension(mut self, name: &str) -> Self {
        self.display_extensions.retain(|ext| ext != name);
        self
    }
}
