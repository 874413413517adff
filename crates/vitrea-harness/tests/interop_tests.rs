//! Cross-API image export and import.

use std::sync::Arc;

use vitrea_gl::GlStandard;
use vitrea_harness::{ContextOptions, GpuTestContext};
use vitrea_test_utils::{DriverCall, DriverProfile, MockDisplay};

fn build(display: &Arc<MockDisplay>, standard: GlStandard) -> GpuTestContext {
    GpuTestContext::new(display.clone(), ContextOptions::for_standard(standard), None)
        .expect("context")
}

#[test]
fn export_and_import_round_trip() {
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display, GlStandard::GlEs);

    let texture = context.interface().gen_texture();
    let image = context.export_texture(texture).expect("export");

    let imported = context.import_external_texture(&image).expect("import");
    assert_ne!(imported, texture);
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::BindExternalImage(_))),
        1
    );

    context.release_external_image(image);
    assert_eq!(display.live_images(), 0);
}

#[test]
fn export_requires_the_display_export_extension() {
    let display = MockDisplay::new(
        DriverProfile::modern().without_display_extension("EGL_KHR_gl_texture_2D_image"),
    );
    let context = build(&display, GlStandard::GlEs);

    let texture = context.interface().gen_texture();
    assert!(context.export_texture(texture).is_none());
}

#[test]
fn interop_is_absent_without_the_image_extension() {
    let display =
        MockDisplay::new(DriverProfile::modern().without_display_extension("EGL_KHR_image"));
    let context = build(&display, GlStandard::GlEs);

    let texture = context.interface().gen_texture();
    assert!(context.export_texture(texture).is_none());
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::CreateImage { .. })),
        0
    );
}

#[test]
fn import_requires_the_gl_external_texture_extension() {
    // The modern desktop profile carries the display image extension but
    // not the GL-side external-texture one.
    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display, GlStandard::Gl);

    let texture = context.interface().gen_texture();
    let image = context.export_texture(texture).expect("export");
    assert!(context.import_external_texture(&image).is_none());
    context.release_external_image(image);
}

#[test]
fn import_rolls_back_when_the_storage_bind_fails() {
    let mut profile = DriverProfile::modern();
    profile.error_on_bind_external = true;
    let display = MockDisplay::new(profile);
    let context = build(&display, GlStandard::GlEs);

    let texture = context.interface().gen_texture();
    let image = context.export_texture(texture).expect("export");

    assert!(context.import_external_texture(&image).is_none());
    // The texture allocated for the import was deleted again.
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::DeleteTexture(_))),
        1
    );
    assert_eq!(display.live_textures(), 1);
    context.release_external_image(image);
}

#[test]
fn import_rolls_back_when_the_texture_bind_fails() {
    let mut profile = DriverProfile::modern();
    profile.error_on_bind_texture = true;
    let display = MockDisplay::new(profile);
    let context = build(&display, GlStandard::GlEs);

    let texture = context.interface().gen_texture();
    let image = context.export_texture(texture).expect("export");

    assert!(context.import_external_texture(&image).is_none());
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::DeleteTexture(_))),
        1
    );
    // The backing-store bind was never reached.
    assert_eq!(
        display.count_calls(|call| matches!(call, DriverCall::BindExternalImage(_))),
        0
    );
    context.release_external_image(image);
}

#[test]
fn stale_driver_errors_are_drained_before_import() {
    const GL_INVALID_ENUM: u32 = 0x0500;

    let display = MockDisplay::new(DriverProfile::modern());
    let context = build(&display, GlStandard::GlEs);

    let texture = context.interface().gen_texture();
    let image = context.export_texture(texture).expect("export");

    // A leftover error from unrelated work must not be blamed on the
    // import.
    display.inject_gl_error(GL_INVALID_ENUM);
    assert!(context.import_external_texture(&image).is_some());
    context.release_external_image(image);
}
