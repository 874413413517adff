//! Deterministic teardown and display reference counting.

use std::sync::Arc;

use vitrea_harness::{ContextOptions, GpuTestContext};
use vitrea_platform::PlatformDisplay;
use vitrea_test_utils::{DriverCall, DriverProfile, MockDisplay};

fn build(display: &Arc<MockDisplay>) -> GpuTestContext {
    GpuTestContext::new(display.clone(), ContextOptions::new(), None).expect("context")
}

#[test]
fn destroy_is_idempotent() {
    let display = MockDisplay::new(DriverProfile::modern());
    let mut context = build(&display);

    context.destroy();
    context.destroy();
    drop(context);

    assert_eq!(display.live_contexts(), 0);
    assert_eq!(display.live_surfaces(), 0);
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::DestroyContext(_))),
        1
    );
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::DestroySurface(_))),
        1
    );
}

#[test]
fn destroying_a_never_current_context_is_fine() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display);
    drop(context);

    assert_eq!(display.live_contexts(), 0);
    assert_eq!(display.live_surfaces(), 0);
    assert_eq!(display.open_refs(), 0);
}

#[test]
fn destroying_the_current_context_unbinds_it_first() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display);
    context.make_current().unwrap();

    drop(context);
    assert!(display.current().is_unbound());
    assert_eq!(display.live_contexts(), 0);
}

#[test]
fn destroying_a_non_current_context_leaves_the_binding_alone() {
    let display = MockDisplay::new(DriverProfile::modern());
    let kept = build(&display);
    let dropped = build(&display);

    kept.make_current().unwrap();
    drop(dropped);
    assert_eq!(display.current().context, Some(kept.context_id()));
}

#[test]
fn the_display_closes_with_its_last_owner() {
    let display = MockDisplay::new(DriverProfile::modern());
    let first = build(&display);
    let second = build(&display);
    assert_eq!(display.open_refs(), 2);

    drop(first);
    assert_eq!(display.open_refs(), 1);
    drop(second);
    assert_eq!(display.open_refs(), 0);
}

#[test]
fn surface_is_released_before_the_context() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display);
    drop(context);

    let calls = display.calls();
    let surface_at = calls
        .iter()
        .position(|call| matches!(call, DriverCall::DestroySurface(_)))
        .expect("surface destroyed");
    let context_at = calls
        .iter()
        .position(|call| matches!(call, DriverCall::DestroyContext(_)))
        .expect("context destroyed");
    assert!(surface_at < context_at);
}
