//! EGL-backed implementation of [`PlatformDisplay`].
//!
//! Entry points are resolved dynamically (see [`ffi`]); nothing links at
//! build time. The display connection is process-global and reference
//! counted: every [`connect`](PlatformDisplay::connect) must be paired with
//! a [`release`](PlatformDisplay::release), and the connection is terminated
//! when the last reference goes away.
//!
//! The current-binding accessors delegate to the driver's own per-thread
//! state rather than shadowing it, so they stay truthful even if foreign
//! code rebinds a context behind the harness's back.

pub mod ffi;

use std::ffi::c_void;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use vitrea_gl::{
    ExtensionSet, FenceSync, GlApi, GlFence, GlStandard, GlVersion, SyncCondition, SyncFlags,
    TextureId, TextureTarget, WaitStatus,
};

use crate::{
    ConfigId, ConfigRequest, ContextId, CurrentBinding, DisplayId, DisplayImageFns,
    DisplaySyncFns, DisplayWaitFlags, DisplayWaitStatus, DriverQuirks, ImageId, PlatformDisplay,
    PlatformError, PlatformSyncId, SurfaceId,
};

use self::ffi::*;

fn as_ptr(raw: u64) -> *mut c_void {
    raw as usize as *mut c_void
}

fn opt_ptr<F: Fn(u64) -> *mut c_void>(raw: Option<u64>, f: F) -> *mut c_void {
    raw.map(f).unwrap_or(std::ptr::null_mut())
}

struct DisplayState {
    ptr: u64,
    refs: u32,
}

/// The real EGL display driver.
pub struct EglPlatform {
    lib: Arc<EglLibrary>,
    state: Mutex<DisplayState>,
}

impl EglPlatform {
    /// Load the system EGL library.
    ///
    /// Fails with [`PlatformError::Unavailable`] if no EGL library exists or
    /// a core entry point is missing.
    pub fn load() -> Result<Arc<Self>, PlatformError> {
        let lib = EglLibrary::load()?;
        Ok(Arc::new(Self {
            lib: Arc::new(lib),
            state: Mutex::new(DisplayState { ptr: 0, refs: 0 }),
        }))
    }

    fn fns(&self) -> &EglFns {
        self.lib.fns()
    }

    fn driver_err(&self, call: &'static str) -> PlatformError {
        PlatformError::Driver {
            call,
            code: self.lib.error_code(),
        }
    }
}

impl PlatformDisplay for EglPlatform {
    fn connect(&self) -> Result<DisplayId, PlatformError> {
        let mut state = self.state.lock();
        if state.refs > 0 {
            state.refs += 1;
            return Ok(DisplayId::from_raw(state.ptr));
        }

        let dpy = unsafe { (self.fns().get_display)(std::ptr::null_mut()) };
        if dpy.is_null() {
            return Err(PlatformError::Unavailable("no default display".into()));
        }
        let (mut major, mut minor) = (0, 0);
        if unsafe { (self.fns().initialize)(dpy, &mut major, &mut minor) } == EGL_FALSE {
            return Err(PlatformError::Unavailable(format!(
                "display initialization failed with {:#06x}",
                self.lib.error_code()
            )));
        }

        debug!(
            version = %format!("{}.{}", major, minor),
            vendor = self.lib.query_string(dpy, EGL_VENDOR).as_deref(),
            client_apis = self.lib.query_string(dpy, EGL_CLIENT_APIS).as_deref(),
            extensions = self.lib.query_string(dpy, EGL_EXTENSIONS).as_deref(),
            "opened display connection"
        );

        state.ptr = dpy as u64;
        state.refs = 1;
        Ok(DisplayId::from_raw(state.ptr))
    }

    fn release(&self, display: DisplayId) {
        let mut state = self.state.lock();
        if state.refs == 0 || state.ptr != display.raw() {
            return;
        }
        state.refs -= 1;
        if state.refs == 0 {
            unsafe { (self.fns().terminate)(as_ptr(state.ptr)) };
            state.ptr = 0;
        }
    }

    fn display_extensions(&self, display: DisplayId) -> ExtensionSet {
        self.lib
            .query_string(as_ptr(display.raw()), EGL_EXTENSIONS)
            .map(|s| ExtensionSet::parse(&s))
            .unwrap_or_default()
    }

    fn bind_api(&self, _display: DisplayId, standard: GlStandard) -> Result<(), PlatformError> {
        let api = match standard {
            GlStandard::Gl => EGL_OPENGL_API,
            GlStandard::GlEs => EGL_OPENGL_ES_API,
        };
        if unsafe { (self.fns().bind_api)(api) } == EGL_FALSE {
            return Err(PlatformError::ApiNotSupported(standard));
        }
        Ok(())
    }

    fn choose_config(
        &self,
        display: DisplayId,
        request: &ConfigRequest,
    ) -> Result<ConfigId, PlatformError> {
        let mut attribs: Vec<EGLint> = Vec::new();
        if request.offscreen {
            attribs.extend([EGL_SURFACE_TYPE, EGL_PBUFFER_BIT]);
        }
        let renderable = match request.renderable {
            GlStandard::Gl => EGL_OPENGL_BIT,
            GlStandard::GlEs => EGL_OPENGL_ES2_BIT,
        };
        attribs.extend([EGL_RENDERABLE_TYPE, renderable]);
        attribs.extend([EGL_RED_SIZE, request.red_bits as EGLint]);
        attribs.extend([EGL_GREEN_SIZE, request.green_bits as EGLint]);
        attribs.extend([EGL_BLUE_SIZE, request.blue_bits as EGLint]);
        attribs.extend([EGL_ALPHA_SIZE, request.alpha_bits as EGLint]);
        attribs.push(EGL_NONE);

        let mut config: EGLConfig = std::ptr::null_mut();
        let mut num_configs: EGLint = 0;
        let ok = unsafe {
            (self.fns().choose_config)(
                as_ptr(display.raw()),
                attribs.as_ptr(),
                &mut config,
                1,
                &mut num_configs,
            )
        };
        if ok == EGL_FALSE {
            return Err(self.driver_err("eglChooseConfig"));
        }
        if num_configs == 0 {
            return Err(PlatformError::NoMatchingConfig);
        }
        Ok(ConfigId::from_raw(config as u64))
    }

    fn create_context(
        &self,
        display: DisplayId,
        config: ConfigId,
        standard: GlStandard,
        share: Option<ContextId>,
        client_version: Option<u32>,
    ) -> Result<ContextId, PlatformError> {
        let attribs: Vec<EGLint> = match standard {
            GlStandard::GlEs => vec![
                EGL_CONTEXT_CLIENT_VERSION,
                client_version.unwrap_or(2) as EGLint,
                EGL_NONE,
            ],
            GlStandard::Gl => vec![EGL_NONE],
        };
        let share_ptr = opt_ptr(share.map(ContextId::raw), as_ptr);
        let context = unsafe {
            (self.fns().create_context)(
                as_ptr(display.raw()),
                as_ptr(config.raw()),
                share_ptr,
                attribs.as_ptr(),
            )
        };
        if context.is_null() {
            return Err(self.driver_err("eglCreateContext"));
        }
        Ok(ContextId::from_raw(context as u64))
    }

    fn destroy_context(&self, display: DisplayId, context: ContextId) {
        unsafe { (self.fns().destroy_context)(as_ptr(display.raw()), as_ptr(context.raw())) };
    }

    fn create_offscreen_surface(
        &self,
        display: DisplayId,
        config: ConfigId,
        width: u32,
        height: u32,
    ) -> Result<SurfaceId, PlatformError> {
        let attribs = [
            EGL_WIDTH,
            width as EGLint,
            EGL_HEIGHT,
            height as EGLint,
            EGL_NONE,
        ];
        let surface = unsafe {
            (self.fns().create_pbuffer_surface)(
                as_ptr(display.raw()),
                as_ptr(config.raw()),
                attribs.as_ptr(),
            )
        };
        if surface.is_null() {
            return Err(self.driver_err("eglCreatePbufferSurface"));
        }
        Ok(SurfaceId::from_raw(surface as u64))
    }

    fn destroy_surface(&self, display: DisplayId, surface: SurfaceId) {
        unsafe { (self.fns().destroy_surface)(as_ptr(display.raw()), as_ptr(surface.raw())) };
    }

    fn make_current(
        &self,
        display: DisplayId,
        draw: Option<SurfaceId>,
        read: Option<SurfaceId>,
        context: Option<ContextId>,
    ) -> Result<(), PlatformError> {
        let ok = unsafe {
            (self.fns().make_current)(
                as_ptr(display.raw()),
                opt_ptr(draw.map(SurfaceId::raw), as_ptr),
                opt_ptr(read.map(SurfaceId::raw), as_ptr),
                opt_ptr(context.map(ContextId::raw), as_ptr),
            )
        };
        if ok == EGL_FALSE {
            return Err(self.driver_err("eglMakeCurrent"));
        }
        Ok(())
    }

    fn current(&self) -> CurrentBinding {
        let display = unsafe { (self.fns().get_current_display)() };
        let draw = unsafe { (self.fns().get_current_surface)(EGL_DRAW) };
        let read = unsafe { (self.fns().get_current_surface)(EGL_READ) };
        let context = unsafe { (self.fns().get_current_context)() };
        CurrentBinding {
            display: (!display.is_null()).then(|| DisplayId::from_raw(display as u64)),
            draw: (!draw.is_null()).then(|| SurfaceId::from_raw(draw as u64)),
            read: (!read.is_null()).then(|| SurfaceId::from_raw(read as u64)),
            context: (!context.is_null()).then(|| ContextId::from_raw(context as u64)),
        }
    }

    fn swap_buffers(&self, display: DisplayId, surface: SurfaceId) -> Result<(), PlatformError> {
        let ok =
            unsafe { (self.fns().swap_buffers)(as_ptr(display.raw()), as_ptr(surface.raw())) };
        if ok == EGL_FALSE {
            return Err(self.driver_err("eglSwapBuffers"));
        }
        Ok(())
    }

    fn load_gl(
        &self,
        _display: DisplayId,
        standard: GlStandard,
    ) -> Result<Arc<dyn GlApi>, PlatformError> {
        EglGlApi::load(&self.lib, standard).map(|api| Arc::new(api) as Arc<dyn GlApi>)
    }

    fn fence_sync_fns(&self, display: DisplayId) -> Option<DisplaySyncFns> {
        let extensions = self.display_extensions(display);
        if !extensions.has("EGL_KHR_fence_sync") {
            return None;
        }

        // All-or-nothing: a partially resolvable extension is treated as
        // absent so shim installation stays atomic. The resolved table keeps
        // the library alive for as long as any closure does.
        let ext = Arc::new(ResolvedSyncExt {
            create: self.lib.lookup("eglCreateSyncKHR")?,
            client_wait: self.lib.lookup("eglClientWaitSyncKHR")?,
            destroy: self.lib.lookup("eglDestroySyncKHR")?,
            get_attrib: self.lib.lookup("eglGetSyncAttribKHR")?,
            wait: if extensions.has("EGL_KHR_wait_sync") {
                self.lib.lookup("eglWaitSyncKHR")
            } else {
                None
            },
            _lib: self.lib.clone(),
        });

        let server_wait = ext.wait.is_some().then(|| {
            let ext = ext.clone();
            Arc::new(move |display: DisplayId, sync: PlatformSyncId| {
                let Some(wait) = ext.wait else {
                    return false;
                };
                (unsafe { wait(as_ptr(display.raw()), as_ptr(sync.raw()), 0) })
                    == EGL_TRUE as EGLint
            }) as Arc<dyn Fn(DisplayId, PlatformSyncId) -> bool + Send + Sync>
        });

        let create_ext = ext.clone();
        let wait_ext = ext.clone();
        let destroy_ext = ext.clone();
        let status_ext = ext.clone();
        Some(DisplaySyncFns {
            create: Arc::new(move |display| {
                let sync = unsafe {
                    (create_ext.create)(as_ptr(display.raw()), EGL_SYNC_FENCE_KHR, std::ptr::null())
                };
                (!sync.is_null()).then(|| PlatformSyncId::from_raw(sync as u64))
            }),
            client_wait: Arc::new(move |display, sync, flags, timeout| {
                let mut egl_flags = 0;
                if flags.contains(DisplayWaitFlags::FLUSH_COMMANDS) {
                    egl_flags |= EGL_SYNC_FLUSH_COMMANDS_BIT_KHR;
                }
                let result = unsafe {
                    (wait_ext.client_wait)(
                        as_ptr(display.raw()),
                        as_ptr(sync.raw()),
                        egl_flags,
                        timeout,
                    )
                };
                match result {
                    EGL_CONDITION_SATISFIED_KHR => DisplayWaitStatus::Satisfied,
                    EGL_TIMEOUT_EXPIRED_KHR => DisplayWaitStatus::TimedOut,
                    _ => DisplayWaitStatus::Failed,
                }
            }),
            destroy: Arc::new(move |display, sync| {
                unsafe { (destroy_ext.destroy)(as_ptr(display.raw()), as_ptr(sync.raw())) };
            }),
            status: Arc::new(move |display, sync| {
                let mut value: EGLint = 0;
                let ok = unsafe {
                    (status_ext.get_attrib)(
                        as_ptr(display.raw()),
                        as_ptr(sync.raw()),
                        EGL_SYNC_STATUS_KHR,
                        &mut value,
                    )
                };
                (ok == EGL_TRUE).then(|| value == EGL_SIGNALED_KHR)
            }),
            server_wait,
        })
    }

    fn image_fns(&self, display: DisplayId) -> Option<DisplayImageFns> {
        let extensions = self.display_extensions(display);
        if !extensions.has("EGL_KHR_image") && !extensions.has("EGL_KHR_image_base") {
            return None;
        }

        let ext = Arc::new(ResolvedImageExt {
            create: self.lib.lookup("eglCreateImageKHR")?,
            destroy: self.lib.lookup("eglDestroyImageKHR")?,
            bind_external: self.lib.lookup("glEGLImageTargetTexture2DOES"),
            _lib: self.lib.clone(),
        });

        let bind_external = ext.bind_external.is_some().then(|| {
            let ext = ext.clone();
            Arc::new(move |image: ImageId| {
                if let Some(bind) = ext.bind_external {
                    unsafe { bind(GL_TEXTURE_EXTERNAL_OES, as_ptr(image.raw())) };
                }
            }) as Arc<dyn Fn(ImageId) + Send + Sync>
        });

        let create_ext = ext.clone();
        let destroy_ext = ext;
        Some(DisplayImageFns {
            create_from_texture: Arc::new(move |display, context, texture| {
                let attribs = [EGL_GL_TEXTURE_LEVEL_KHR, 0, EGL_NONE];
                let buffer = texture as usize as EGLClientBuffer;
                let image = unsafe {
                    (create_ext.create)(
                        as_ptr(display.raw()),
                        as_ptr(context.raw()),
                        EGL_GL_TEXTURE_2D_KHR,
                        buffer,
                        attribs.as_ptr(),
                    )
                };
                (!image.is_null()).then(|| ImageId::from_raw(image as u64))
            }),
            destroy: Arc::new(move |display, image| {
                unsafe { (destroy_ext.destroy)(as_ptr(display.raw()), as_ptr(image.raw())) };
            }),
            bind_external,
        })
    }

    fn quirks(&self) -> DriverQuirks {
        DriverQuirks::SWAP_BEFORE_CLIENT_WAIT
    }
}

/// Display sync-extension entry points, resolved once. Holds the library so
/// the pointers stay valid for as long as any installed closure lives.
struct ResolvedSyncExt {
    create: PfnEglCreateSyncKhr,
    client_wait: PfnEglClientWaitSyncKhr,
    destroy: PfnEglDestroySyncKhr,
    get_attrib: PfnEglGetSyncAttribKhr,
    wait: Option<PfnEglWaitSyncKhr>,
    _lib: Arc<EglLibrary>,
}

/// Display image-extension entry points, resolved once.
struct ResolvedImageExt {
    create: PfnEglCreateImageKhr,
    destroy: PfnEglDestroyImageKhr,
    bind_external: Option<PfnGlEglImageTargetTexture2D>,
    _lib: Arc<EglLibrary>,
}

/// GL command interface loaded through the display's symbol registry.
///
/// Must be created while a context of the right family is current; the
/// version and extension queries below read from the bound context.
struct EglGlApi {
    standard: GlStandard,
    version: GlVersion,
    extensions: ExtensionSet,
    get_error: PfnGlGetError,
    gen_textures: PfnGlGenTextures,
    bind_texture: PfnGlBindTexture,
    delete_textures: PfnGlDeleteTextures,
    flush: PfnGlFlush,
    finish: PfnGlFinish,
    native_sync: Option<Arc<NativeGlFenceSync>>,
    _lib: Arc<EglLibrary>,
}

impl EglGlApi {
    fn load(lib: &Arc<EglLibrary>, standard: GlStandard) -> Result<Self, PlatformError> {
        fn gl<T: Copy>(lib: &EglLibrary, name: &'static str) -> Result<T, PlatformError> {
            lib.lookup(name)
                .ok_or(PlatformError::Unavailable(format!("missing GL entry point {}", name)))
        }

        let get_string: PfnGlGetString = gl(lib, "glGetString")?;
        let get_error: PfnGlGetError = gl(lib, "glGetError")?;
        let gen_textures: PfnGlGenTextures = gl(lib, "glGenTextures")?;
        let bind_texture: PfnGlBindTexture = gl(lib, "glBindTexture")?;
        let delete_textures: PfnGlDeleteTextures = gl(lib, "glDeleteTextures")?;
        let flush: PfnGlFlush = gl(lib, "glFlush")?;
        let finish: PfnGlFinish = gl(lib, "glFinish")?;

        let version = read_gl_string(get_string, GL_VERSION)
            .and_then(|s| GlVersion::parse(&s))
            .unwrap_or(GlVersion::ZERO);
        let extensions = read_extensions(lib, get_string, version);

        let native_sync = NativeGlFenceSync::resolve(lib);

        Ok(Self {
            standard,
            version,
            extensions,
            get_error,
            gen_textures,
            bind_texture,
            delete_textures,
            flush,
            finish,
            native_sync,
            _lib: lib.clone(),
        })
    }
}

fn read_gl_string(get_string: PfnGlGetString, what: u32) -> Option<String> {
    let ptr = unsafe { get_string(what) };
    if ptr.is_null() {
        return None;
    }
    let cstr = unsafe { std::ffi::CStr::from_ptr(ptr.cast()) };
    Some(cstr.to_string_lossy().into_owned())
}

/// Read the extension list, using indexed enumeration where the plain
/// string query is gone (desktop core profiles).
fn read_extensions(
    lib: &EglLibrary,
    get_string: PfnGlGetString,
    version: GlVersion,
) -> ExtensionSet {
    if version >= GlVersion::new(3, 0) {
        let stringi = lib.lookup::<PfnGlGetStringi>("glGetStringi");
        let integerv = lib.lookup::<PfnGlGetIntegerv>("glGetIntegerv");
        if let (Some(get_stringi), Some(get_integerv)) = (stringi, integerv) {
            let mut count: i32 = 0;
            unsafe { get_integerv(GL_NUM_EXTENSIONS, &mut count) };
            let mut set = ExtensionSet::new();
            for index in 0..count.max(0) as u32 {
                let ptr = unsafe { get_stringi(GL_EXTENSIONS, index) };
                if ptr.is_null() {
                    continue;
                }
                let name = unsafe { std::ffi::CStr::from_ptr(ptr.cast()) };
                set.add(name.to_string_lossy().into_owned());
            }
            return set;
        }
    }
    read_gl_string(get_string, GL_EXTENSIONS)
        .map(|s| ExtensionSet::parse(&s))
        .unwrap_or_default()
}

impl GlApi for EglGlApi {
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
        unsafe { (self.get_error)() }
    }

    fn gen_texture(&self) -> TextureId {
        let mut id: u32 = 0;
        unsafe { (self.gen_textures)(1, &mut id) };
        id
    }

    fn bind_texture(&self, target: TextureTarget, texture: TextureId) {
        let target = match target {
            TextureTarget::Texture2D => GL_TEXTURE_2D,
            TextureTarget::External => GL_TEXTURE_EXTERNAL_OES,
        };
        unsafe { (self.bind_texture)(target, texture) };
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { (self.delete_textures)(1, &texture) };
    }

    fn flush(&self) {
        unsafe { (self.flush)() };
    }

    fn finish(&self) {
        unsafe { (self.finish)() };
    }

    fn native_fence_sync(&self) -> Option<Arc<dyn FenceSync>> {
        self.native_sync
            .clone()
            .map(|sync| sync as Arc<dyn FenceSync>)
    }
}

/// The driver's own fence-sync entry points.
struct NativeGlFenceSync {
    fence_sync: PfnGlFenceSync,
    client_wait_sync: PfnGlClientWaitSync,
    wait_sync: PfnGlWaitSync,
    delete_sync: PfnGlDeleteSync,
    is_sync: PfnGlIsSync,
    _lib: Arc<EglLibrary>,
}

impl NativeGlFenceSync {
    fn resolve(lib: &Arc<EglLibrary>) -> Option<Arc<Self>> {
        Some(Arc::new(Self {
            fence_sync: lib.lookup("glFenceSync")?,
            client_wait_sync: lib.lookup("glClientWaitSync")?,
            wait_sync: lib.lookup("glWaitSync")?,
            delete_sync: lib.lookup("glDeleteSync")?,
            is_sync: lib.lookup("glIsSync")?,
            _lib: lib.clone(),
        }))
    }
}

impl FenceSync for NativeGlFenceSync {
    fn create(&self, condition: SyncCondition, flags: SyncFlags) -> Option<GlFence> {
        debug_assert_eq!(condition, SyncCondition::GpuCommandsComplete);
        debug_assert!(flags.is_empty());
        let sync = unsafe { (self.fence_sync)(GL_SYNC_GPU_COMMANDS_COMPLETE, 0) };
        (!sync.is_null()).then(|| GlFence::from_raw(sync as u64))
    }

    fn client_wait(&self, fence: &GlFence, flags: SyncFlags, timeout_ns: u64) -> WaitStatus {
        let mut gl_flags = 0;
        if flags.contains(SyncFlags::FLUSH_COMMANDS) {
            gl_flags |= GL_SYNC_FLUSH_COMMANDS_BIT;
        }
        let result =
            unsafe { (self.client_wait_sync)(as_ptr(fence.raw()), gl_flags, timeout_ns) };
        match result {
            GL_ALREADY_SIGNALED | GL_CONDITION_SATISFIED => WaitStatus::ConditionSatisfied,
            GL_TIMEOUT_EXPIRED => WaitStatus::TimeoutExpired,
            _ => WaitStatus::Failed,
        }
    }

    fn server_wait(&self, fence: &GlFence) {
        unsafe { (self.wait_sync)(as_ptr(fence.raw()), 0, GL_TIMEOUT_IGNORED) };
    }

    fn delete(&self, fence: GlFence) {
        unsafe { (self.delete_sync)(as_ptr(fence.raw())) };
    }

    fn is_valid(&self, fence: &GlFence) -> bool {
        unsafe { (self.is_sync)(as_ptr(fence.raw())) != 0 }
    }
}
