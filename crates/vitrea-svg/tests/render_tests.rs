//! SVG rendering and PNG output.

use vitrea_svg::{SvgError, TypefaceProvider, render_svg, render_svg_to_png, tiny_skia};

const BLUE_RECT: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32">
  <rect width="64" height="32" fill="#3355ff"/>
</svg>"##;

#[test]
fn renders_at_the_intrinsic_size() {
    let pixmap = render_svg(BLUE_RECT, &TypefaceProvider::new(), None).unwrap();
    assert_eq!(pixmap.width(), 64);
    assert_eq!(pixmap.height(), 32);

    let pixel = pixmap.pixel(10, 10).unwrap();
    assert_eq!(pixel.alpha(), 255);
    assert!(pixel.blue() > pixel.red());
}

#[test]
fn renders_at_an_explicit_size() {
    let pixmap = render_svg(BLUE_RECT, &TypefaceProvider::new(), Some((128, 64))).unwrap();
    assert_eq!(pixmap.width(), 128);
    assert_eq!(pixmap.height(), 64);
    // The document is scaled, not letterboxed: the far corner is covered.
    let pixel = pixmap.pixel(127, 63).unwrap();
    assert_eq!(pixel.alpha(), 255);
}

#[test]
fn zero_dimensions_are_rejected() {
    let err = render_svg(BLUE_RECT, &TypefaceProvider::new(), Some((0, 64))).unwrap_err();
    assert_eq!(err, SvgError::InvalidDimensions);
    let err = render_svg(BLUE_RECT, &TypefaceProvider::new(), Some((64, 0))).unwrap_err();
    assert_eq!(err, SvgError::InvalidDimensions);
}

#[test]
fn unparseable_markup_is_an_error() {
    let err = render_svg("definitely not markup", &TypefaceProvider::new(), None).unwrap_err();
    assert!(matches!(err, SvgError::Parse(_)));
}

#[test]
fn writes_a_decodable_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");

    render_svg_to_png(BLUE_RECT, &TypefaceProvider::new(), Some((32, 16)), &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let decoded = tiny_skia::Pixmap::decode_png(&bytes).unwrap();
    assert_eq!(decoded.width(), 32);
    assert_eq!(decoded.height(), 16);
}

#[test]
fn text_referencing_an_unregistered_family_still_renders() {
    // No fonts are registered, so the text produces no glyphs, but the
    // document itself renders.
    let markup = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32">
      <text x="4" y="20" font-family="F" font-size="12">hello</text>
    </svg>"##;
    let pixmap = render_svg(markup, &TypefaceProvider::new(), None).unwrap();
    assert_eq!(pixmap.width(), 64);
}
