//! Raw EGL/GL types, constants, and the dynamically loaded symbol table.
//!
//! Entry points are resolved at load time from the system EGL library and,
//! for client-API symbols the display cannot hand out itself, from the GL
//! client libraries. Nothing links at build time; a machine without a GL
//! stack fails at [`EglLibrary::load`] with a normal error.

#![allow(clippy::missing_safety_doc)]

use std::ffi::{CStr, CString, c_char, c_void};

use libloading::Library;

use crate::PlatformError;

pub type EGLBoolean = u32;
pub type EGLint = i32;
pub type EGLenum = u32;
pub type EGLDisplay = *mut c_void;
pub type EGLConfig = *mut c_void;
pub type EGLContext = *mut c_void;
pub type EGLSurface = *mut c_void;
pub type EGLSyncKHR = *mut c_void;
pub type EGLImageKHR = *mut c_void;
pub type EGLClientBuffer = *mut c_void;
pub type EGLTimeKHR = u64;
pub type EGLNativeDisplayType = *mut c_void;
pub type GLsync = *mut c_void;

pub const EGL_FALSE: EGLBoolean = 0;
pub const EGL_TRUE: EGLBoolean = 1;

pub const EGL_SUCCESS: EGLint = 0x3000;
pub const EGL_ALPHA_SIZE: EGLint = 0x3021;
pub const EGL_BLUE_SIZE: EGLint = 0x3022;
pub const EGL_GREEN_SIZE: EGLint = 0x3023;
pub const EGL_RED_SIZE: EGLint = 0x3024;
pub const EGL_SURFACE_TYPE: EGLint = 0x3033;
pub const EGL_NONE: EGLint = 0x3038;
pub const EGL_RENDERABLE_TYPE: EGLint = 0x3040;
pub const EGL_VENDOR: EGLint = 0x3053;
pub const EGL_VERSION: EGLint = 0x3054;
pub const EGL_EXTENSIONS: EGLint = 0x3055;
pub const EGL_HEIGHT: EGLint = 0x3056;
pub const EGL_WIDTH: EGLint = 0x3057;
pub const EGL_DRAW: EGLint = 0x3059;
pub const EGL_READ: EGLint = 0x305A;
pub const EGL_CLIENT_APIS: EGLint = 0x308D;
pub const EGL_CONTEXT_CLIENT_VERSION: EGLint = 0x3098;

pub const EGL_PBUFFER_BIT: EGLint = 0x0001;
pub const EGL_OPENGL_ES2_BIT: EGLint = 0x0004;
pub const EGL_OPENGL_BIT: EGLint = 0x0008;

pub const EGL_OPENGL_ES_API: EGLenum = 0x30A0;
pub const EGL_OPENGL_API: EGLenum = 0x30A2;

pub const EGL_SYNC_STATUS_KHR: EGLint = 0x30F1;
pub const EGL_SIGNALED_KHR: EGLint = 0x30F2;
pub const EGL_TIMEOUT_EXPIRED_KHR: EGLint = 0x30F5;
pub const EGL_CONDITION_SATISFIED_KHR: EGLint = 0x30F6;
pub const EGL_SYNC_FENCE_KHR: EGLenum = 0x30F9;
pub const EGL_SYNC_FLUSH_COMMANDS_BIT_KHR: EGLint = 0x0001;

pub const EGL_GL_TEXTURE_2D_KHR: EGLenum = 0x30B1;
pub const EGL_GL_TEXTURE_LEVEL_KHR: EGLint = 0x30BC;

pub const GL_VERSION: u32 = 0x1F02;
pub const GL_EXTENSIONS: u32 = 0x1F03;
pub const GL_NUM_EXTENSIONS: u32 = 0x821D;
pub const GL_TEXTURE_2D: u32 = 0x0DE1;
pub const GL_TEXTURE_EXTERNAL_OES: u32 = 0x8D65;
pub const GL_SYNC_GPU_COMMANDS_COMPLETE: u32 = 0x9117;
pub const GL_SYNC_FLUSH_COMMANDS_BIT: u32 = 0x0000_0001;
pub const GL_ALREADY_SIGNALED: u32 = 0x911A;
pub const GL_TIMEOUT_EXPIRED: u32 = 0x911B;
pub const GL_CONDITION_SATISFIED: u32 = 0x911C;
pub const GL_WAIT_FAILED: u32 = 0x911D;
pub const GL_TIMEOUT_IGNORED: u64 = u64::MAX;

pub type PfnEglGetError = unsafe extern "C" fn() -> EGLint;
pub type PfnEglGetDisplay = unsafe extern "C" fn(EGLNativeDisplayType) -> EGLDisplay;
pub type PfnEglInitialize = unsafe extern "C" fn(EGLDisplay, *mut EGLint, *mut EGLint) -> EGLBoolean;
pub type PfnEglTerminate = unsafe extern "C" fn(EGLDisplay) -> EGLBoolean;
pub type PfnEglBindApi = unsafe extern "C" fn(EGLenum) -> EGLBoolean;
pub type PfnEglChooseConfig =
    unsafe extern "C" fn(EGLDisplay, *const EGLint, *mut EGLConfig, EGLint, *mut EGLint) -> EGLBoolean;
pub type PfnEglCreateContext =
    unsafe extern "C" fn(EGLDisplay, EGLConfig, EGLContext, *const EGLint) -> EGLContext;
pub type PfnEglDestroyContext = unsafe extern "C" fn(EGLDisplay, EGLContext) -> EGLBoolean;
pub type PfnEglCreatePbufferSurface =
    unsafe extern "C" fn(EGLDisplay, EGLConfig, *const EGLint) -> EGLSurface;
pub type PfnEglDestroySurface = unsafe extern "C" fn(EGLDisplay, EGLSurface) -> EGLBoolean;
pub type PfnEglMakeCurrent =
    unsafe extern "C" fn(EGLDisplay, EGLSurface, EGLSurface, EGLContext) -> EGLBoolean;
pub type PfnEglGetCurrentDisplay = unsafe extern "C" fn() -> EGLDisplay;
pub type PfnEglGetCurrentSurface = unsafe extern "C" fn(EGLint) -> EGLSurface;
pub type PfnEglGetCurrentContext = unsafe extern "C" fn() -> EGLContext;
pub type PfnEglSwapBuffers = unsafe extern "C" fn(EGLDisplay, EGLSurface) -> EGLBoolean;
pub type PfnEglQueryString = unsafe extern "C" fn(EGLDisplay, EGLint) -> *const c_char;
pub type PfnEglGetProcAddress = unsafe extern "C" fn(*const c_char) -> *const c_void;

pub type PfnEglCreateSyncKhr =
    unsafe extern "C" fn(EGLDisplay, EGLenum, *const EGLint) -> EGLSyncKHR;
pub type PfnEglClientWaitSyncKhr =
    unsafe extern "C" fn(EGLDisplay, EGLSyncKHR, EGLint, EGLTimeKHR) -> EGLint;
pub type PfnEglDestroySyncKhr = unsafe extern "C" fn(EGLDisplay, EGLSyncKHR) -> EGLBoolean;
pub type PfnEglGetSyncAttribKhr =
    unsafe extern "C" fn(EGLDisplay, EGLSyncKHR, EGLint, *mut EGLint) -> EGLBoolean;
pub type PfnEglWaitSyncKhr = unsafe extern "C" fn(EGLDisplay, EGLSyncKHR, EGLint) -> EGLint;
pub type PfnEglCreateImageKhr =
    unsafe extern "C" fn(EGLDisplay, EGLContext, EGLenum, EGLClientBuffer, *const EGLint) -> EGLImageKHR;
pub type PfnEglDestroyImageKhr = unsafe extern "C" fn(EGLDisplay, EGLImageKHR) -> EGLBoolean;

pub type PfnGlGetError = unsafe extern "C" fn() -> u32;
pub type PfnGlGetString = unsafe extern "C" fn(u32) -> *const u8;
pub type PfnGlGetStringi = unsafe extern "C" fn(u32, u32) -> *const u8;
pub type PfnGlGetIntegerv = unsafe extern "C" fn(u32, *mut i32);
pub type PfnGlGenTextures = unsafe extern "C" fn(i32, *mut u32);
pub type PfnGlBindTexture = unsafe extern "C" fn(u32, u32);
pub type PfnGlDeleteTextures = unsafe extern "C" fn(i32, *const u32);
pub type PfnGlFlush = unsafe extern "C" fn();
pub type PfnGlFinish = unsafe extern "C" fn();
pub type PfnGlFenceSync = unsafe extern "C" fn(u32, u32) -> GLsync;
pub type PfnGlClientWaitSync = unsafe extern "C" fn(GLsync, u32, u64) -> u32;
pub type PfnGlWaitSync = unsafe extern "C" fn(GLsync, u32, u64);
pub type PfnGlDeleteSync = unsafe extern "C" fn(GLsync);
pub type PfnGlIsSync = unsafe extern "C" fn(GLsync) -> u8;
pub type PfnGlEglImageTargetTexture2D = unsafe extern "C" fn(u32, *mut c_void);

/// Core EGL entry points, all required.
#[derive(Clone, Copy)]
pub struct EglFns {
    pub get_error: PfnEglGetError,
    pub get_display: PfnEglGetDisplay,
    pub initialize: PfnEglInitialize,
    pub terminate: PfnEglTerminate,
    pub bind_api: PfnEglBindApi,
    pub choose_config: PfnEglChooseConfig,
    pub create_context: PfnEglCreateContext,
    pub destroy_context: PfnEglDestroyContext,
    pub create_pbuffer_surface: PfnEglCreatePbufferSurface,
    pub destroy_surface: PfnEglDestroySurface,
    pub make_current: PfnEglMakeCurrent,
    pub get_current_display: PfnEglGetCurrentDisplay,
    pub get_current_surface: PfnEglGetCurrentSurface,
    pub get_current_context: PfnEglGetCurrentContext,
    pub swap_buffers: PfnEglSwapBuffers,
    pub query_string: PfnEglQueryString,
    pub get_proc_address: PfnEglGetProcAddress,
}

#[cfg(windows)]
const EGL_LIB_CANDIDATES: &[&str] = &["libEGL.dll"];
#[cfg(not(windows))]
const EGL_LIB_CANDIDATES: &[&str] = &["libEGL.so.1", "libEGL.so"];

#[cfg(windows)]
const CLIENT_LIB_CANDIDATES: &[&str] = &["libGLESv2.dll", "opengl32.dll"];
#[cfg(not(windows))]
const CLIENT_LIB_CANDIDATES: &[&str] =
    &["libGLESv2.so.2", "libGLESv2.so", "libGL.so.1", "libGL.so"];

fn required<T: Copy>(lib: &Library, name: &str) -> Result<T, PlatformError> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    unsafe { lib.get::<T>(&bytes) }
        .map(|sym| *sym)
        .map_err(|_| PlatformError::Unavailable(format!("missing display entry point {}", name)))
}

/// The loaded EGL library plus the GL client libraries used as a fallback
/// symbol source. The symbol registry is populated once here and treated as
/// immutable afterwards.
pub struct EglLibrary {
    fns: EglFns,
    client_libs: Vec<Library>,
    _lib: Library,
}

impl EglLibrary {
    /// Load the system EGL library and resolve the core entry points.
    pub fn load() -> Result<Self, PlatformError> {
        let lib = EGL_LIB_CANDIDATES
            .iter()
            .find_map(|name| unsafe { Library::new(name) }.ok())
            .ok_or_else(|| {
                PlatformError::Unavailable(format!(
                    "no EGL library found (tried {})",
                    EGL_LIB_CANDIDATES.join(", ")
                ))
            })?;

        let fns = EglFns {
            get_error: required(&lib, "eglGetError")?,
            get_display: required(&lib, "eglGetDisplay")?,
            initialize: required(&lib, "eglInitialize")?,
            terminate: required(&lib, "eglTerminate")?,
            bind_api: required(&lib, "eglBindAPI")?,
            choose_config: required(&lib, "eglChooseConfig")?,
            create_context: required(&lib, "eglCreateContext")?,
            destroy_context: required(&lib, "eglDestroyContext")?,
            create_pbuffer_surface: required(&lib, "eglCreatePbufferSurface")?,
            destroy_surface: required(&lib, "eglDestroySurface")?,
            make_current: required(&lib, "eglMakeCurrent")?,
            get_current_display: required(&lib, "eglGetCurrentDisplay")?,
            get_current_surface: required(&lib, "eglGetCurrentSurface")?,
            get_current_context: required(&lib, "eglGetCurrentContext")?,
            swap_buffers: required(&lib, "eglSwapBuffers")?,
            query_string: required(&lib, "eglQueryString")?,
            get_proc_address: required(&lib, "eglGetProcAddress")?,
        };

        let client_libs = CLIENT_LIB_CANDIDATES
            .iter()
            .filter_map(|name| unsafe { Library::new(name) }.ok())
            .collect();

        Ok(Self {
            fns,
            client_libs,
            _lib: lib,
        })
    }

    pub fn fns(&self) -> &EglFns {
        &self.fns
    }

    /// The display's last error code.
    pub fn error_code(&self) -> u32 {
        (unsafe { (self.fns.get_error)() }) as u32
    }

    /// Resolve an entry point by name, preferring the display's dynamic
    /// lookup and falling back to the client libraries for core GL symbols
    /// that some drivers refuse to hand out dynamically.
    pub fn lookup<T: Copy>(&self, name: &str) -> Option<T> {
        debug_assert_eq!(size_of::<T>(), size_of::<*const c_void>());
        let cname = CString::new(name).ok()?;
        let ptr = unsafe { (self.fns.get_proc_address)(cname.as_ptr()) };
        if !ptr.is_null() {
            return Some(unsafe { std::mem::transmute_copy::<*const c_void, T>(&ptr) });
        }
        for lib in &self.client_libs {
            if let Ok(sym) = unsafe { lib.get::<T>(cname.as_bytes_with_nul()) } {
                return Some(*sym);
            }
        }
        None
    }

    /// Query a display string attribute, or `None` if the driver returned
    /// nothing.
    pub fn query_string(&self, display: EGLDisplay, what: EGLint) -> Option<String> {
        let ptr = unsafe { (self.fns.query_string)(display, what) };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}
