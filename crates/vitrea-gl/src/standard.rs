//! GL API families.

/// The API family a driver exposes and a context speaks.
///
/// Contexts, fence-sync objects, and shared object namespaces are all scoped
/// to one family; a desktop context cannot share with an embedded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlStandard {
    /// Desktop OpenGL.
    Gl,
    /// OpenGL ES.
    GlEs,
}

impl GlStandard {
    /// Negotiation order when the caller expressed no preference.
    pub const PREFERENCE_ORDER: [GlStandard; 2] = [GlStandard::Gl, GlStandard::GlEs];

    /// Human-readable family name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Gl => "OpenGL",
            Self::GlEs => "OpenGL ES",
        }
    }
}

impl std::fmt::Display for GlStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
