//! Registered typefaces and style matching.

use std::sync::Arc;

use resvg::usvg::fontdb;
use tracing::debug;

/// Errors from parsing font data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypefaceError {
    /// The bytes did not parse as a font face.
    Unparseable,
}

impl std::fmt::Display for TypefaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparseable => write!(f, "font data did not parse as a face"),
        }
    }
}

impl std::error::Error for TypefaceError {}

/// One font face: a family name, its style coordinates, and the raw data.
#[derive(Debug, Clone)]
pub struct Typeface {
    family: String,
    weight: fontdb::Weight,
    stretch: fontdb::Stretch,
    style: fontdb::Style,
    data: Arc<Vec<u8>>,
}

impl Typeface {
    /// Parse a TrueType/OpenType font from raw bytes.
    ///
    /// The family name is read from the face itself and may come back
    /// empty; the provider rejects such faces at registration time.
    pub fn from_data(data: Vec<u8>) -> Result<Self, TypefaceError> {
        let data = Arc::new(data);
        let mut db = fontdb::Database::new();
        db.load_font_source(fontdb::Source::Binary(data.clone()));
        let face = db.faces().next().ok_or(TypefaceError::Unparseable)?;
        let family = face
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        Ok(Self {
            family,
            weight: face.weight,
            stretch: face.stretch,
            style: face.style,
            data,
        })
    }

    /// A face with explicit style coordinates and no backing data.
    ///
    /// Useful for exercising registration and matching without real font
    /// files; such a face is skipped when fonts are installed for
    /// rendering.
    pub fn with_traits(
        family: impl Into<String>,
        weight: fontdb::Weight,
        stretch: fontdb::Stretch,
        style: fontdb::Style,
    ) -> Self {
        Self {
            family: family.into(),
            weight,
            stretch,
            style,
            data: Arc::new(Vec::new()),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn weight(&self) -> fontdb::Weight {
        self.weight
    }

    pub fn stretch(&self) -> fontdb::Stretch {
        self.stretch
    }

    pub fn style(&self) -> fontdb::Style {
        self.style
    }
}

/// A family slot: the name plus its registered style variants.
#[derive(Debug, Clone)]
pub struct FontFamily {
    name: String,
    styles: Vec<Typeface>,
}

impl FontFamily {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    pub fn styles(&self) -> impl Iterator<Item = &Typeface> {
        self.styles.iter()
    }

    /// Pick the nearest style variant to the requested coordinates.
    ///
    /// Width differences dominate, then slant compatibility, then weight
    /// distance; the first-registered face wins ties.
    pub fn match_style(
        &self,
        weight: fontdb::Weight,
        stretch: fontdb::Stretch,
        style: fontdb::Style,
    ) -> Option<&Typeface> {
        self.styles.iter().min_by_key(|face| {
            let width = (stretch_rank(face.stretch) - stretch_rank(stretch)).abs() as u32;
            let slant = slant_penalty(style, face.style);
            let weight_distance = (face.weight.0 as i32 - weight.0 as i32).unsigned_abs();
            width * 1_000_000 + slant * 10_000 + weight_distance
        })
    }
}

fn stretch_rank(stretch: fontdb::Stretch) -> i32 {
    match stretch {
        fontdb::Stretch::UltraCondensed => 1,
        fontdb::Stretch::ExtraCondensed => 2,
        fontdb::Stretch::Condensed => 3,
        fontdb::Stretch::SemiCondensed => 4,
        fontdb::Stretch::Normal => 5,
        fontdb::Stretch::SemiExpanded => 6,
        fontdb::Stretch::Expanded => 7,
        fontdb::Stretch::ExtraExpanded => 8,
        fontdb::Stretch::UltraExpanded => 9,
    }
}

fn slant_penalty(want: fontdb::Style, have: fontdb::Style) -> u32 {
    use fontdb::Style::{Italic, Normal, Oblique};
    match (want, have) {
        (Normal, Normal) | (Italic, Italic) | (Oblique, Oblique) => 0,
        // Italic and oblique substitute for each other before upright does.
        (Italic, Oblique) | (Oblique, Italic) => 1,
        _ => 2,
    }
}

/// Registered typefaces, grouped into family slots.
///
/// The first registration under a family name claims the slot; later faces
/// with the same name append as style variants. Faces with an empty family
/// name are ignored without error.
#[derive(Debug, Clone, Default)]
pub struct TypefaceProvider {
    families: Vec<FontFamily>,
}

impl TypefaceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parsed typeface. Returns whether it was accepted.
    pub fn register_typeface(&mut self, typeface: Typeface) -> bool {
        if typeface.family().is_empty() {
            debug!("ignoring typeface with no family name");
            return false;
        }
        match self
            .families
            .iter_mut()
            .find(|family| family.name == typeface.family)
        {
            Some(family) => family.styles.push(typeface),
            None => self.families.push(FontFamily {
                name: typeface.family.clone(),
                styles: vec![typeface],
            }),
        }
        true
    }

    /// Parse and register raw font data. Unparseable data is ignored
    /// without error, like a nameless face.
    pub fn register_font_data(&mut self, data: Vec<u8>) -> bool {
        match Typeface::from_data(data) {
            Ok(typeface) => self.register_typeface(typeface),
            Err(err) => {
                debug!(%err, "ignoring unparseable font data");
                false
            }
        }
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|family| family.name.as_str())
    }

    /// Exact-name family lookup.
    pub fn family(&self, name: &str) -> Option<&FontFamily> {
        self.families.iter().find(|family| family.name == name)
    }

    /// Nearest-match selection within a family (see
    /// [`FontFamily::match_style`]).
    pub fn match_style(
        &self,
        family: &str,
        weight: fontdb::Weight,
        stretch: fontdb::Stretch,
        style: fontdb::Style,
    ) -> Option<&Typeface> {
        self.family(family)?.match_style(weight, stretch, style)
    }

    /// Load every registered face with real data into a render database.
    pub(crate) fn install_into(&self, db: &mut fontdb::Database) {
        for family in &self.families {
            for face in &family.styles {
                if face.data.is_empty() {
                    continue;
                }
                db.load_font_source(fontdb::Source::Binary(face.data.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(family: &str, weight: u16, style: fontdb::Style) -> Typeface {
        Typeface::with_traits(family, fontdb::Weight(weight), fontdb::Stretch::Normal, style)
    }

    #[test]
    fn two_faces_one_family() {
        let mut provider = TypefaceProvider::new();
        assert!(provider.register_typeface(face("F", 300, fontdb::Style::Normal)));
        assert!(provider.register_typeface(face("F", 400, fontdb::Style::Normal)));
        assert_eq!(provider.family_count(), 1);
        assert_eq!(provider.family("F").unwrap().style_count(), 2);
    }

    #[test]
    fn empty_family_name_is_ignored() {
        let mut provider = TypefaceProvider::new();
        assert!(!provider.register_typeface(face("", 400, fontdb::Style::Normal)));
        assert_eq!(provider.family_count(), 0);
    }

    #[test]
    fn unparseable_data_is_ignored() {
        let mut provider = TypefaceProvider::new();
        assert!(!provider.register_font_data(vec![0u8; 16]));
        assert_eq!(provider.family_count(), 0);
    }

    #[test]
    fn lookup_is_exact_match() {
        let mut provider = TypefaceProvider::new();
        provider.register_typeface(face("Bubble", 400, fontdb::Style::Normal));
        assert!(provider.family("Bubble").is_some());
        assert!(provider.family("Bub").is_none());
        assert!(provider.family("bubble").is_none());
    }

    #[test]
    fn nearest_weight_wins() {
        let mut provider = TypefaceProvider::new();
        provider.register_typeface(face("F", 300, fontdb::Style::Normal));
        provider.register_typeface(face("F", 700, fontdb::Style::Normal));
        let picked = provider
            .match_style("F", fontdb::Weight(400), fontdb::Stretch::Normal, fontdb::Style::Normal)
            .unwrap();
        assert_eq!(picked.weight(), fontdb::Weight(300));
    }

    #[test]
    fn slant_outranks_weight() {
        let mut provider = TypefaceProvider::new();
        provider.register_typeface(face("F", 400, fontdb::Style::Normal));
        provider.register_typeface(face("F", 900, fontdb::Style::Italic));
        let picked = provider
            .match_style("F", fontdb::Weight(400), fontdb::Stretch::Normal, fontdb::Style::Italic)
            .unwrap();
        assert_eq!(picked.style(), fontdb::Style::Italic);
        assert_eq!(picked.weight(), fontdb::Weight(900));
    }

    #[test]
    fn oblique_substitutes_for_italic() {
        let mut provider = TypefaceProvider::new();
        provider.register_typeface(face("F", 400, fontdb::Style::Normal));
        provider.register_typeface(face("F", 400, fontdb::Style::Oblique));
        let picked = provider
            .match_style("F", fontdb::Weight(400), fontdb::Stretch::Normal, fontdb::Style::Italic)
            .unwrap();
        assert_eq!(picked.style(), fontdb::Style::Oblique);
    }

    #[test]
    fn width_outranks_slant() {
        let mut provider = TypefaceProvider::new();
        provider.register_typeface(Typeface::with_traits(
            "F",
            fontdb::Weight(400),
            fontdb::Stretch::Condensed,
            fontdb::Style::Italic,
        ));
        provider.register_typeface(Typeface::with_traits(
            "F",
            fontdb::Weight(400),
            fontdb::Stretch::Normal,
            fontdb::Style::Normal,
        ));
        let picked = provider
            .match_style("F", fontdb::Weight(400), fontdb::Stretch::Normal, fontdb::Style::Italic)
            .unwrap();
        assert_eq!(picked.stretch(), fontdb::Stretch::Normal);
    }
}
