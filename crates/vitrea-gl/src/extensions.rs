//! Extension name sets with whole-word matching.

use ahash::AHashSet;

/// A set of extension names advertised by a driver or display.
///
/// Built from the driver's space-separated extension string, so lookups are
/// whole-word by construction: `GL_ARB_occlusion_query2` never satisfies a
/// probe for `GL_ARB_occlusion_query`.
#[derive(Debug, Clone, Default)]
pub struct ExtensionSet {
    names: AHashSet<String>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a space-separated extension string as returned by the driver.
    pub fn parse(extensions: &str) -> Self {
        Self {
            names: extensions.split_whitespace().map(str::to_owned).collect(),
        }
    }

    /// Whether `name` is advertised, matched as a whole extension name.
    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Advertise an additional extension name.
    ///
    /// Used when a compatibility shim makes a capability available that the
    /// driver itself did not report.
    pub fn add(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate the advertised names, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExtensionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_names_only() {
        let set = ExtensionSet::parse("GL_ARB_occlusion_query GL_ARB_occlusion_query2");
        assert!(set.has("GL_ARB_occlusion_query"));
        assert!(set.has("GL_ARB_occlusion_query2"));
        assert!(!set.has("GL_ARB_occlusion"));
        assert!(!set.has("query2"));
    }

    #[test]
    fn parse_ignores_extra_whitespace() {
        let set = ExtensionSet::parse("  GL_ARB_sync   EGL_KHR_image ");
        assert_eq!(set.len(), 2);
        assert!(set.has("EGL_KHR_image"));
    }

    #[test]
    fn add_advertises_new_name() {
        let mut set = ExtensionSet::parse("GL_NV_fence");
        assert!(!set.has("GL_APPLE_sync"));
        set.add("GL_APPLE_sync");
        assert!(set.has("GL_APPLE_sync"));
    }
}
