//! Surface configuration requests.

use vitrea_gl::GlStandard;

/// What the harness asks of a pixel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRequest {
    /// The API family the configuration must be renderable with.
    pub renderable: GlStandard,
    /// Minimum bits per color channel.
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    /// Whether the configuration must support off-screen surfaces.
    pub offscreen: bool,
}

impl ConfigRequest {
    /// The minimal off-screen request the harness negotiates with: 8 bits
    /// per channel and off-screen capability. The surface is never
    /// displayed, so nothing more is needed.
    pub fn minimal_offscreen(renderable: GlStandard) -> Self {
        Self {
            renderable,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            offscreen: true,
        }
    }
}
