//! Simulated display driver and GL interface.
//!
//! The mock GPU completes work instantly: fences are born signaled and
//! client waits return satisfied unless the profile forces another result.
//! What matters for the harness tests is not timing but bookkeeping - which
//! calls were made, in what order, and whether every resource created during
//! a failed negotiation step was unwound.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use vitrea_gl::{
    ExtensionSet, FenceSync, GlApi, GlFence, GlStandard, GlVersion, NO_ERROR, SyncCondition,
    SyncFlags, TextureId, TextureTarget, WaitStatus, native_sync_advertised,
};
use vitrea_platform::{
    ConfigId, ConfigRequest, ContextId, CurrentBinding, DisplayId, DisplayImageFns,
    DisplaySyncFns, DisplayWaitStatus, DriverQuirks, ImageId, PlatformDisplay, PlatformError,
    PlatformSyncId, SurfaceId,
};

use crate::{ApiProfile, DriverCall, DriverProfile};

const MOCK_DISPLAY: u64 = 1;

const GL_INVALID_OPERATION: u32 = 0x0502;
const BAD_ALLOC: u32 = 0x3003;
const BAD_CONTEXT: u32 = 0x3006;
const BAD_MATCH: u32 = 0x3009;

struct ContextRecord {
    standard: GlStandard,
    share: Option<u64>,
}

#[derive(Default)]
struct MockState {
    refs: u32,
    total_connects: u32,
    next_id: u64,
    next_texture: TextureId,
    contexts: HashMap<u64, ContextRecord>,
    surfaces: HashSet<u64>,
    current: HashMap<ThreadId, CurrentBinding>,
    syncs: HashMap<u64, bool>,
    images: HashMap<u64, TextureId>,
    textures: HashSet<TextureId>,
    pending_gl_errors: VecDeque<u32>,
    swaps: HashMap<u64, u32>,
    calls: Vec<DriverCall>,
}

impl MockState {
    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, call: DriverCall) {
        self.calls.push(call);
    }
}

/// A simulated display driver.
///
/// Implements [`PlatformDisplay`] against in-memory tables, with the
/// supported surface described by a [`DriverProfile`]. All state is behind
/// one mutex; every observable driver call is recorded.
pub struct MockDisplay {
    profile: DriverProfile,
    state: Arc<Mutex<MockState>>,
}

impl MockDisplay {
    pub fn new(profile: DriverProfile) -> Arc<Self> {
        Arc::new(Self {
            profile,
            state: Arc::new(Mutex::new(MockState::default())),
        })
    }

    fn api_profile(&self, standard: GlStandard) -> Option<&ApiProfile> {
        match standard {
            GlStandard::Gl => self.profile.desktop.as_ref(),
            GlStandard::GlEs => self.profile.gles.as_ref(),
        }
    }

    fn has_display_extension(&self, name: &str) -> bool {
        self.profile.display_extensions.iter().any(|ext| ext == name)
    }

    // =========================================================================
    // Assertion helpers
    // =========================================================================

    /// Every call the driver observed, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().calls.clone()
    }

    /// How many recorded calls match `pred`.
    pub fn count_calls(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|call| pred(call)).count()
    }

    /// Live references to the display connection.
    pub fn open_refs(&self) -> u32 {
        self.state.lock().refs
    }

    /// Total successful connects over the driver's lifetime.
    pub fn total_connects(&self) -> u32 {
        self.state.lock().total_connects
    }

    pub fn live_contexts(&self) -> usize {
        self.state.lock().contexts.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.state.lock().surfaces.len()
    }

    pub fn live_syncs(&self) -> usize {
        self.state.lock().syncs.len()
    }

    pub fn live_images(&self) -> usize {
        self.state.lock().images.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Buffer swaps issued against `surface`.
    pub fn swap_count(&self, surface: SurfaceId) -> u32 {
        self.state.lock().swaps.get(&surface.raw()).copied().unwrap_or(0)
    }

    pub fn total_swaps(&self) -> u32 {
        self.state.lock().swaps.values().sum()
    }

    /// Queue a driver error for the next error-state query.
    pub fn inject_gl_error(&self, code: u32) {
        self.state.lock().pending_gl_errors.push_back(code);
    }
}

impl PlatformDisplay for MockDisplay {
    fn connect(&self) -> Result<DisplayId, PlatformError> {
        let mut state = self.state.lock();
        state.record(DriverCall::Connect);
        if self.profile.fail_connect {
            return Err(PlatformError::Unavailable("simulated connect failure".into()));
        }
        state.refs += 1;
        state.total_connects += 1;
        Ok(DisplayId::from_raw(MOCK_DISPLAY))
    }

    fn release(&self, _display: DisplayId) {
        let mut state = self.state.lock();
        state.record(DriverCall::Release);
        state.refs = state.refs.saturating_sub(1);
    }

    fn display_extensions(&self, _display: DisplayId) -> ExtensionSet {
        self.profile.display_extensions.iter().cloned().collect()
    }

    fn bind_api(&self, _display: DisplayId, standard: GlStandard) -> Result<(), PlatformError> {
        self.state.lock().record(DriverCall::BindApi(standard));
        if self.api_profile(standard).is_none() {
            return Err(PlatformError::ApiNotSupported(standard));
        }
        Ok(())
    }

    fn choose_config(
        &self,
        _display: DisplayId,
        request: &ConfigRequest,
    ) -> Result<ConfigId, PlatformError> {
        self.state.lock().record(DriverCall::ChooseConfig(request.renderable));
        if self.profile.fail_choose_config || self.api_profile(request.renderable).is_none() {
            return Err(PlatformError::NoMatchingConfig);
        }
        let raw = match request.renderable {
            GlStandard::Gl => 0x10,
            GlStandard::GlEs => 0x20,
        };
        Ok(ConfigId::from_raw(raw))
    }

    fn create_context(
        &self,
        _display: DisplayId,
        _config: ConfigId,
        standard: GlStandard,
        share: Option<ContextId>,
        client_version: Option<u32>,
    ) -> Result<ContextId, PlatformError> {
        let mut state = self.state.lock();
        state.record(DriverCall::CreateContext {
            standard,
            share,
            client_version,
        });
        if self.profile.fail_create_context {
            return Err(PlatformError::Driver {
                call: "create_context",
                code: BAD_ALLOC,
            });
        }
        if let Some(share) = share {
            match state.contexts.get(&share.raw()) {
                Some(record) if record.standard == standard => {}
                _ => {
                    return Err(PlatformError::Driver {
                        call: "create_context",
                        code: BAD_MATCH,
                    });
                }
            }
        }
        if standard == GlStandard::GlEs {
            let supported = self.api_profile(standard).map(|p| p.version.major).unwrap_or(0);
            if client_version.unwrap_or(2) > supported {
                return Err(PlatformError::Driver {
                    call: "create_context",
                    code: BAD_MATCH,
                });
            }
        }
        let id = state.alloc();
        state.contexts.insert(
            id,
            ContextRecord {
                standard,
                share: share.map(ContextId::raw),
            },
        );
        Ok(ContextId::from_raw(id))
    }

    fn destroy_context(&self, _display: DisplayId, context: ContextId) {
        let mut state = self.state.lock();
        state.record(DriverCall::DestroyContext(context));
        state.contexts.remove(&context.raw());
    }

    fn create_offscreen_surface(
        &self,
        _display: DisplayId,
        _config: ConfigId,
        width: u32,
        height: u32,
    ) -> Result<SurfaceId, PlatformError> {
        let mut state = self.state.lock();
        state.record(DriverCall::CreateSurface { width, height });
        if self.profile.fail_create_surface {
            return Err(PlatformError::Driver {
                call: "create_pbuffer_surface",
                code: BAD_ALLOC,
            });
        }
        let id = state.alloc();
        state.surfaces.insert(id);
        Ok(SurfaceId::from_raw(id))
    }

    fn destroy_surface(&self, _display: DisplayId, surface: SurfaceId) {
        let mut state = self.state.lock();
        state.record(DriverCall::DestroySurface(surface));
        state.surfaces.remove(&surface.raw());
    }

    fn make_current(
        &self,
        display: DisplayId,
        draw: Option<SurfaceId>,
        read: Option<SurfaceId>,
        context: Option<ContextId>,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.record(DriverCall::MakeCurrent { context });
        if self.profile.fail_make_current {
            return Err(PlatformError::Driver {
                call: "make_current",
                code: BAD_CONTEXT,
            });
        }
        if let Some(context) = context {
            let context_alive = state.contexts.contains_key(&context.raw());
            let surfaces_alive = draw.is_none_or(|s| state.surfaces.contains(&s.raw()))
                && read.is_none_or(|s| state.surfaces.contains(&s.raw()));
            if !context_alive || !surfaces_alive {
                return Err(PlatformError::Driver {
                    call: "make_current",
                    code: BAD_CONTEXT,
                });
            }
            state.current.insert(
                thread::current().id(),
                CurrentBinding {
                    display: Some(display),
                    draw,
                    read,
                    context: Some(context),
                },
            );
        } else {
            state
                .current
                .insert(thread::current().id(), CurrentBinding::UNBOUND);
        }
        Ok(())
    }

    fn current(&self) -> CurrentBinding {
        self.state
            .lock()
            .current
            .get(&thread::current().id())
            .copied()
            .unwrap_or(CurrentBinding::UNBOUND)
    }

    fn swap_buffers(&self, _display: DisplayId, surface: SurfaceId) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.record(DriverCall::SwapBuffers(surface));
        *state.swaps.entry(surface.raw()).or_insert(0) += 1;
        Ok(())
    }

    fn load_gl(
        &self,
        _display: DisplayId,
        standard: GlStandard,
    ) -> Result<Arc<dyn GlApi>, PlatformError> {
        self.state.lock().record(DriverCall::LoadGl(standard));
        let profile = self
            .api_profile(standard)
            .ok_or_else(|| PlatformError::Unavailable(format!("no {} support", standard)))?;
        Ok(Arc::new(MockGl {
            standard,
            version: profile.version,
            extensions: profile.extensions.iter().cloned().collect(),
            state: self.state.clone(),
            broken_native_sync: self.profile.broken_native_sync,
            forced_native_wait: self.profile.forced_native_wait,
            error_on_bind_texture: self.profile.error_on_bind_texture,
        }))
    }

    fn fence_sync_fns(&self, _display: DisplayId) -> Option<DisplaySyncFns> {
        if !self.has_display_extension("EGL_KHR_fence_sync") {
            return None;
        }
        let forced = self.profile.forced_wait_status;

        let state = self.state.clone();
        let create = Arc::new(move |_display: DisplayId| {
            let mut state = state.lock();
            let id = state.alloc();
            state.syncs.insert(id, true);
            state.record(DriverCall::CreateSync);
            Some(PlatformSyncId::from_raw(id))
        });

        let state = self.state.clone();
        let client_wait = Arc::new(
            move |_display: DisplayId, sync: PlatformSyncId, flags, timeout| {
                let mut state = state.lock();
                state.record(DriverCall::ClientWaitSync { flags, timeout });
                if !state.syncs.contains_key(&sync.raw()) {
                    return DisplayWaitStatus::Failed;
                }
                forced.unwrap_or(DisplayWaitStatus::Satisfied)
            },
        );

        let state = self.state.clone();
        let destroy = Arc::new(move |_display: DisplayId, sync: PlatformSyncId| {
            let mut state = state.lock();
            state.record(DriverCall::DestroySync);
            state.syncs.remove(&sync.raw());
        });

        let state = self.state.clone();
        let status = Arc::new(move |_display: DisplayId, sync: PlatformSyncId| {
            let mut state = state.lock();
            state.record(DriverCall::SyncStatus);
            state.syncs.get(&sync.raw()).copied()
        });

        let server_wait = self.has_display_extension("EGL_KHR_wait_sync").then(|| {
            let state = self.state.clone();
            Arc::new(move |_display: DisplayId, sync: PlatformSyncId| {
                let mut state = state.lock();
                state.record(DriverCall::ServerWaitSync);
                state.syncs.contains_key(&sync.raw())
            }) as Arc<dyn Fn(DisplayId, PlatformSyncId) -> bool + Send + Sync>
        });

        Some(DisplaySyncFns {
            create,
            client_wait,
            destroy,
            status,
            server_wait,
        })
    }

    fn image_fns(&self, _display: DisplayId) -> Option<DisplayImageFns> {
        if !self.has_display_extension("EGL_KHR_image") {
            return None;
        }

        let state = self.state.clone();
        let create_from_texture = Arc::new(
            move |_display: DisplayId, _context: ContextId, texture: TextureId| {
                let mut state = state.lock();
                state.record(DriverCall::CreateImage { texture });
                let id = state.alloc();
                state.images.insert(id, texture);
                Some(ImageId::from_raw(id))
            },
        );

        let state = self.state.clone();
        let destroy = Arc::new(move |_display: DisplayId, image: ImageId| {
            let mut state = state.lock();
            state.record(DriverCall::DestroyImage(image));
            state.images.remove(&image.raw());
        });

        let state = self.state.clone();
        let error_on_bind = self.profile.error_on_bind_external;
        let bind_external = Some(Arc::new(move |image: ImageId| {
            let mut state = state.lock();
            state.record(DriverCall::BindExternalImage(image));
            if error_on_bind {
                state.pending_gl_errors.push_back(GL_INVALID_OPERATION);
            }
        }) as Arc<dyn Fn(ImageId) + Send + Sync>);

        Some(DisplayImageFns {
            create_from_texture,
            destroy,
            bind_external,
        })
    }

    fn quirks(&self) -> DriverQuirks {
        self.profile.quirks
    }
}

/// Simulated GPU command interface, sharing the driver's tables.
struct MockGl {
    standard: GlStandard,
    version: GlVersion,
    extensions: ExtensionSet,
    state: Arc<Mutex<MockState>>,
    broken_native_sync: bool,
    forced_native_wait: Option<WaitStatus>,
    error_on_bind_texture: bool,
}

impl GlApi for MockGl {
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
        self.state.lock().pending_gl_errors.pop_front().unwrap_or(NO_ERROR)
    }

    fn gen_texture(&self) -> TextureId {
        let mut state = self.state.lock();
        state.next_texture += 1;
        let id = state.next_texture;
        state.textures.insert(id);
        state.record(DriverCall::GenTexture(id));
        id
    }

    fn bind_texture(&self, target: TextureTarget, texture: TextureId) {
        let mut state = self.state.lock();
        state.record(DriverCall::BindTexture(target, texture));
        if self.error_on_bind_texture && target == TextureTarget::External {
            state.pending_gl_errors.push_back(GL_INVALID_OPERATION);
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.lock();
        state.record(DriverCall::DeleteTexture(texture));
        state.textures.remove(&texture);
    }

    fn flush(&self) {
        self.state.lock().record(DriverCall::Flush);
    }

    fn finish(&self) {
        self.state.lock().record(DriverCall::Finish);
    }

    fn native_fence_sync(&self) -> Option<Arc<dyn FenceSync>> {
        if self.broken_native_sync || !native_sync_advertised(self) {
            return None;
        }
        Some(Arc::new(MockNativeFence {
            state: self.state.clone(),
            forced: self.forced_native_wait,
        }))
    }
}

/// Native fence-sync entry points of the simulated driver.
struct MockNativeFence {
    state: Arc<Mutex<MockState>>,
    forced: Option<WaitStatus>,
}

impl FenceSync for MockNativeFence {
    fn create(&self, condition: SyncCondition, flags: SyncFlags) -> Option<GlFence> {
        debug_assert_eq!(condition, SyncCondition::GpuCommandsComplete);
        debug_assert!(flags.is_empty());
        let mut state = self.state.lock();
        let id = state.alloc();
        state.syncs.insert(id, true);
        state.record(DriverCall::NativeCreateFence);
        Some(GlFence::from_raw(id))
    }

    fn client_wait(&self, fence: &GlFence, flags: SyncFlags, timeout_ns: u64) -> WaitStatus {
        let mut state = self.state.lock();
        state.record(DriverCall::NativeClientWait {
            flags,
            timeout: timeout_ns,
        });
        if !state.syncs.contains_key(&fence.raw()) {
            return WaitStatus::Failed;
        }
        self.forced.unwrap_or(WaitStatus::ConditionSatisfied)
    }

    fn server_wait(&self, fence: &GlFence) {
        let mut state = self.state.lock();
        state.record(DriverCall::NativeServerWait);
        let _ = fence;
    }

    fn delete(&self, fence: GlFence) {
        let mut state = self.state.lock();
        state.record(DriverCall::NativeDeleteFence);
        state.syncs.remove(&fence.raw());
    }

    fn is_valid(&self, fence: &GlFence) -> bool {
        self.state.lock().syncs.contains_key(&fence.raw())
    }
}
