//! Per-thread current-binding discipline and scoped restoration.

use std::sync::Arc;

use vitrea_harness::{ContextOptions, GpuTestContext};
use vitrea_platform::PlatformDisplay;
use vitrea_test_utils::{DriverProfile, MockDisplay};

fn build(display: &Arc<MockDisplay>) -> GpuTestContext {
    GpuTestContext::new(display.clone(), ContextOptions::new(), None).expect("context")
}

#[test]
fn make_current_then_not_current_leaves_nothing_bound() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display);

    context.make_current().unwrap();
    assert_eq!(display.current().context, Some(context.context_id()));

    context.make_not_current().unwrap();
    assert!(display.current().is_unbound());
}

#[test]
fn a_new_current_context_supersedes_the_prior_one() {
    let display = MockDisplay::new(DriverProfile::modern());
    let first = build(&display);
    let second = build(&display);

    first.make_current().unwrap();
    second.make_current().unwrap();
    assert_eq!(display.current().context, Some(second.context_id()));
}

#[test]
fn auto_restore_returns_to_the_exact_captured_binding() {
    let display = MockDisplay::new(DriverProfile::modern());
    let first = build(&display);
    let second = build(&display);

    first.make_current().unwrap();
    let captured = display.current();

    let guard = second.auto_restore();
    assert!(!guard.is_inert());
    second.make_current().unwrap();
    assert_eq!(display.current().context, Some(second.context_id()));

    drop(guard);
    assert_eq!(display.current(), captured);
}

#[test]
fn auto_restore_restores_the_unbound_state() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display);

    assert!(display.current().is_unbound());
    let guard = context.auto_restore();
    context.make_current().unwrap();
    drop(guard);
    assert!(display.current().is_unbound());
}

#[test]
fn auto_restore_is_inert_when_own_context_is_current() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display);

    context.make_current().unwrap();
    let guard = context.auto_restore();
    assert!(guard.is_inert());
    drop(guard);
    // Nothing was restored; the context stays bound.
    assert_eq!(display.current().context, Some(context.context_id()));
}

#[test]
fn bindings_are_per_thread() {
    let display = MockDisplay::new(DriverProfile::modern());
    let main_context = build(&display);
    main_context.make_current().unwrap();

    let worker_display = display.clone();
    std::thread::spawn(move || {
        // A fresh thread starts unbound regardless of the main thread.
        assert!(worker_display.current().is_unbound());
        let worker_context = build(&worker_display);
        worker_context.make_current().unwrap();
        assert_eq!(
            worker_display.current().context,
            Some(worker_context.context_id())
        );
    })
    .join()
    .unwrap();

    // The worker's binding never touched this thread.
    assert_eq!(display.current().context, Some(main_context.context_id()));
}
