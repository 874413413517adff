//! Candidate negotiation: pick an API family the driver can actually serve.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vitrea_gl::{ExtensionSet, GlInterface, GlStandard, InterfaceError};
use vitrea_platform::{
    ConfigId, ConfigRequest, ContextId, DisplayImageFns, PlatformDisplay, PlatformError, SurfaceId,
};

use crate::context::{ContextOptions, DisplayConnection, GpuTestContext};
use crate::emulation::install_fence_sync;
use crate::restore::CurrentGuard;
use crate::HarnessError;

/// Why one candidate family was abandoned. Local recovery only: the
/// negotiator logs it and moves on to the next candidate.
#[derive(Debug)]
pub(crate) enum StepError {
    Platform(PlatformError),
    Interface(InterfaceError),
}

impl From<PlatformError> for StepError {
    fn from(err: PlatformError) -> Self {
        Self::Platform(err)
    }
}

impl From<InterfaceError> for StepError {
    fn from(err: InterfaceError) -> Self {
        Self::Interface(err)
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform(err) => err.fmt(f),
            Self::Interface(err) => err.fmt(f),
        }
    }
}

/// Everything a successful candidate produced.
pub(crate) struct Negotiated {
    pub display: Arc<DisplayConnection>,
    pub config: ConfigId,
    pub context: ContextId,
    pub surface: SurfaceId,
    pub standard: GlStandard,
    pub interface: Arc<GlInterface>,
    pub display_extensions: ExtensionSet,
    pub image_fns: Option<DisplayImageFns>,
}

pub(crate) fn negotiate(
    platform: &Arc<dyn PlatformDisplay>,
    options: ContextOptions,
    share: Option<&GpuTestContext>,
) -> Result<Negotiated, HarnessError> {
    let candidates: &[GlStandard] = match options.standard {
        Some(GlStandard::Gl) => &[GlStandard::Gl],
        Some(GlStandard::GlEs) => &[GlStandard::GlEs],
        None => &GlStandard::PREFERENCE_ORDER,
    };

    for &standard in candidates {
        // Object namespaces only span one family; a share context of a
        // different family rules the candidate out before touching the
        // driver.
        if let Some(share) = share {
            if share.standard() != standard {
                debug!(%standard, share = %share.standard(), "skipping candidate: share context family differs");
                continue;
            }
        }
        match try_candidate(platform, options, standard, share) {
            Ok(negotiated) => {
                info!(
                    %standard,
                    version = %negotiated.interface.version(),
                    sync = ?negotiated.interface.sync_backing(),
                    "negotiated GPU test context"
                );
                return Ok(negotiated);
            }
            Err(err) => {
                warn!(%standard, %err, "candidate failed, trying next");
            }
        }
    }

    Err(HarnessError::NoCompatibleContext)
}

fn try_candidate(
    platform: &Arc<dyn PlatformDisplay>,
    options: ContextOptions,
    standard: GlStandard,
    share: Option<&GpuTestContext>,
) -> Result<Negotiated, StepError> {
    let display = DisplayConnection::open(platform.clone())?;
    let display_id = display.id();

    platform.bind_api(display_id, standard)?;

    let request = ConfigRequest::minimal_offscreen(standard);
    let config = platform.choose_config(display_id, &request)?;

    let share_id = share.map(GpuTestContext::context_id);
    let context = create_context(platform, display_id, config, standard, share_id, options)?;

    // Everything acquired from here on is unwound in reverse order before
    // reporting the step failure.
    let surface = match platform.create_offscreen_surface(display_id, config, 1, 1) {
        Ok(surface) => surface,
        Err(err) => {
            platform.destroy_context(display_id, context);
            return Err(err.into());
        }
    };

    let unwind = |err: StepError| {
        platform.destroy_surface(display_id, surface);
        platform.destroy_context(display_id, context);
        err
    };

    // The prior binding comes back before this function returns, success or
    // not; the caller decides when the new context becomes current.
    let _restore = CurrentGuard::capture(platform.clone(), display_id);

    if let Err(err) =
        platform.make_current(display_id, Some(surface), Some(surface), Some(context))
    {
        return Err(unwind(err.into()));
    }

    let api = match platform.load_gl(display_id, standard) {
        Ok(api) => api,
        Err(err) => return Err(unwind(err.into())),
    };

    // Sync installation cannot fail the candidate; absence just degrades
    // the context's capabilities.
    let interface = install_fence_sync(platform, display_id, surface, api);

    if let Err(err) = interface.validate() {
        return Err(unwind(err.into()));
    }

    let display_extensions = platform.display_extensions(display_id);
    let image_fns = platform.image_fns(display_id);

    Ok(Negotiated {
        display,
        config,
        context,
        surface,
        standard,
        interface: Arc::new(interface),
        display_extensions,
        image_fns,
    })
}

fn create_context(
    platform: &Arc<dyn PlatformDisplay>,
    display: vitrea_platform::DisplayId,
    config: ConfigId,
    standard: GlStandard,
    share: Option<ContextId>,
    options: ContextOptions,
) -> Result<ContextId, PlatformError> {
    match standard {
        GlStandard::Gl => platform.create_context(display, config, standard, share, None),
        GlStandard::GlEs => {
            if options.try_newer_embedded_context {
                match platform.create_context(display, config, standard, share, Some(3)) {
                    Ok(context) => return Ok(context),
                    Err(err) => {
                        debug!(%err, "embedded version 3 context failed, falling back to version 2");
                    }
                }
            }
            platform.create_context(display, config, standard, share, Some(2))
        }
    }
}
