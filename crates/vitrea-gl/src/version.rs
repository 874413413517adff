//! Driver version handling.

/// A GL version as reported by the driver.
///
/// Ordering is major-then-minor, so `GlVersion::new(3, 2) > GlVersion::new(3, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
}

impl GlVersion {
    /// The zero version, reported by interfaces that failed to identify
    /// their driver. Never valid.
    pub const ZERO: GlVersion = GlVersion::new(0, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse a `GL_VERSION` string.
    ///
    /// Handles both the desktop form (`"4.6.0 NVIDIA 535.54"`) and the
    /// embedded form (`"OpenGL ES 3.2 Mesa 23.1"`). Returns `None` if no
    /// leading `major.minor` pair can be found.
    pub fn parse(version: &str) -> Option<Self> {
        let rest = version.trim();
        let rest = rest
            .strip_prefix("OpenGL ES-CM ")
            .or_else(|| rest.strip_prefix("OpenGL ES "))
            .unwrap_or(rest);
        let token = rest.split_whitespace().next()?;
        let mut nums = token.split('.');
        let major = nums.next()?.parse().ok()?;
        let minor = nums.next().unwrap_or("0").parse().ok()?;
        Some(Self { major, minor })
    }
}

impl std::fmt::Display for GlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_desktop_version_strings() {
        assert_eq!(GlVersion::parse("4.6.0 NVIDIA 535.54"), Some(GlVersion::new(4, 6)));
        assert_eq!(GlVersion::parse("3.1 Mesa 23.1.4"), Some(GlVersion::new(3, 1)));
    }

    #[test]
    fn parses_embedded_version_strings() {
        assert_eq!(GlVersion::parse("OpenGL ES 3.2 Mesa 23.1"), Some(GlVersion::new(3, 2)));
        assert_eq!(GlVersion::parse("OpenGL ES-CM 1.1"), Some(GlVersion::new(1, 1)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(GlVersion::parse(""), None);
        assert_eq!(GlVersion::parse("NVIDIA"), None);
    }

    #[test]
    fn orders_major_then_minor() {
        assert!(GlVersion::new(3, 2) > GlVersion::new(3, 0));
        assert!(GlVersion::new(4, 0) > GlVersion::new(3, 9));
    }
}
