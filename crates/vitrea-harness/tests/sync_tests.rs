//! Fence-sync selection, emulation, and degraded operation.

use std::sync::Arc;

use vitrea_gl::{GlStandard, SyncBacking, SyncFlags, WAIT_FOREVER, WaitStatus};
use vitrea_harness::{ContextOptions, GpuTestContext, SyncError};
use vitrea_platform::{DISPLAY_WAIT_FOREVER, DisplayWaitFlags, DisplayWaitStatus, DriverQuirks};
use vitrea_test_utils::{DriverCall, DriverProfile, MockDisplay};

fn build(display: &Arc<MockDisplay>, standard: GlStandard) -> GpuTestContext {
    GpuTestContext::new(display.clone(), ContextOptions::for_standard(standard), None)
        .expect("context")
}

#[test]
fn modern_driver_uses_native_sync() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display, GlStandard::GlEs);

    assert_eq!(context.interface().sync_backing(), SyncBacking::Native);
    assert!(context.supports_fence_sync());

    let fence = context.insert_fence().unwrap();
    let status = context
        .client_wait_fence(&fence, SyncFlags::empty(), WAIT_FOREVER)
        .unwrap();
    assert_eq!(status, WaitStatus::ConditionSatisfied);
    context.delete_fence(fence).unwrap();

    // The display-level sync extension was never touched.
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::CreateSync)),
        0
    );
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::NativeCreateFence)),
        1
    );
    assert_eq!(display.total_swaps(), 0);
}

#[test]
fn legacy_driver_gets_the_emulation_shim() {
    let display = MockDisplay::new(DriverProfile::legacy_embedded());
    let context = build(&display, GlStandard::GlEs);

    assert_eq!(context.interface().sync_backing(), SyncBacking::Emulated);
    assert!(context.supports_fence_sync());
    // The shim advertises the capability through the extension list.
    assert!(context.interface().has_extension("GL_APPLE_sync"));

    let fence = context.insert_fence().unwrap();
    let status = context
        .client_wait_fence(&fence, SyncFlags::empty(), WAIT_FOREVER)
        .unwrap();
    assert_eq!(status, WaitStatus::ConditionSatisfied);
    context.delete_fence(fence).unwrap();

    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::CreateSync)),
        1
    );
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::ClientWaitSync { .. })),
        1
    );
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::DestroySync)),
        1
    );
    assert_eq!(display.live_syncs(), 0);
}

#[test]
fn no_sync_support_degrades_without_failing_construction() {
    let display = MockDisplay::new(DriverProfile::bare());
    let context = build(&display, GlStandard::GlEs);

    assert_eq!(context.interface().sync_backing(), SyncBacking::Unsupported);
    assert!(!context.supports_fence_sync());
    assert_eq!(context.insert_fence().unwrap_err(), SyncError::Unsupported);
}

#[test]
fn swap_before_wait_only_under_the_quirk() {
    let display = MockDisplay::new(
        DriverProfile::legacy_embedded().with_quirks(DriverQuirks::SWAP_BEFORE_CLIENT_WAIT),
    );
    let context = build(&display, GlStandard::GlEs);
    let fence = context.insert_fence().unwrap();
    context
        .client_wait_fence(&fence, SyncFlags::empty(), WAIT_FOREVER)
        .unwrap();
    assert_eq!(display.total_swaps(), 1);
    context.delete_fence(fence).unwrap();

    let display = MockDisplay::new(DriverProfile::legacy_embedded());
    let context = build(&display, GlStandard::GlEs);
    let fence = context.insert_fence().unwrap();
    context
        .client_wait_fence(&fence, SyncFlags::empty(), WAIT_FOREVER)
        .unwrap();
    assert_eq!(display.total_swaps(), 0);
}

#[test]
fn flush_flag_translates_to_the_display_flag() {
    let display = MockDisplay::new(DriverProfile::legacy_embedded());
    let context = build(&display, GlStandard::GlEs);
    let fence = context.insert_fence().unwrap();

    context
        .client_wait_fence(&fence, SyncFlags::FLUSH_COMMANDS, 1_000)
        .unwrap();
    assert_eq!(
        display.count_calls(|call| matches!(
            call,
            DriverCall::ClientWaitSync { flags, timeout: 1_000 }
                if flags.contains(DisplayWaitFlags::FLUSH_COMMANDS)
        )),
        1
    );

    context
        .client_wait_fence(&fence, SyncFlags::empty(), 2_000)
        .unwrap();
    assert_eq!(
        display.count_calls(|call| matches!(
            call,
            DriverCall::ClientWaitSync { flags, timeout: 2_000 } if flags.is_empty()
        )),
        1
    );
}

#[test]
fn wait_results_are_identical_for_native_and_emulated_backings() {
    // Timed out.
    let mut native_profile = DriverProfile::modern();
    native_profile.forced_native_wait = Some(WaitStatus::TimeoutExpired);
    let mut emulated_profile = DriverProfile::legacy_embedded();
    emulated_profile.forced_wait_status = Some(DisplayWaitStatus::TimedOut);

    for profile in [native_profile, emulated_profile] {
        let display = MockDisplay::new(profile);
        let context = build(&display, GlStandard::GlEs);
        let fence = context.insert_fence().unwrap();
        let status = context
            .client_wait_fence(&fence, SyncFlags::empty(), 10)
            .unwrap();
        assert_eq!(status, WaitStatus::TimeoutExpired);
        context.delete_fence(fence).unwrap();
    }

    // Failed.
    let mut native_profile = DriverProfile::modern();
    native_profile.forced_native_wait = Some(WaitStatus::Failed);
    let mut emulated_profile = DriverProfile::legacy_embedded();
    emulated_profile.forced_wait_status = Some(DisplayWaitStatus::Failed);

    for profile in [native_profile, emulated_profile] {
        let display = MockDisplay::new(profile);
        let context = build(&display, GlStandard::GlEs);
        let fence = context.insert_fence().unwrap();
        let status = context
            .client_wait_fence(&fence, SyncFlags::empty(), 10)
            .unwrap();
        assert_eq!(status, WaitStatus::Failed);
        context.delete_fence(fence).unwrap();
    }
}

#[test]
fn server_wait_falls_back_to_a_blocking_wait_without_the_extension() {
    // The legacy preset has no non-blocking wait extension.
    let display = MockDisplay::new(DriverProfile::legacy_embedded());
    let context = build(&display, GlStandard::GlEs);
    let fence = context.insert_fence().unwrap();

    context.server_wait_fence(&fence).unwrap();
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::ServerWaitSync)),
        0
    );
    assert_eq!(
        display.count_calls(|call| matches!(
            call,
            DriverCall::ClientWaitSync { timeout, .. } if *timeout == DISPLAY_WAIT_FOREVER
        )),
        1
    );
}

#[test]
fn server_wait_uses_the_non_blocking_entry_point_when_present() {
    let mut profile = DriverProfile::legacy_embedded();
    profile.display_extensions.push("EGL_KHR_wait_sync".to_owned());
    let display = MockDisplay::new(profile);
    let context = build(&display, GlStandard::GlEs);
    let fence = context.insert_fence().unwrap();

    context.server_wait_fence(&fence).unwrap();
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::ServerWaitSync)),
        1
    );
}

#[test]
fn fence_validity_follows_the_fence_lifetime() {
    for profile in [DriverProfile::modern(), DriverProfile::legacy_embedded()] {
        let display = MockDisplay::new(profile);
        let context = build(&display, GlStandard::GlEs);

        let fence = context.insert_fence().unwrap();
        assert!(context.fence_is_valid(&fence));
        let raw = vitrea_gl::GlFence::from_raw(fence.raw());
        context.delete_fence(fence).unwrap();
        assert!(!context.fence_is_valid(&raw));
    }
}
