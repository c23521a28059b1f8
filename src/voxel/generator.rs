//! Capability interface for external frame producers (text scrollers, glyph rasterizers).

use super::frame::Frame;

/// Something that synthesizes a run of frames from textual input.
///
/// The output is treated as an already-valid animation fragment; how it is
/// rasterized is up to the implementation.
pub trait FrameGenerator {
    /// Generator-specific parameters (font, speed, orientation, ...).
    type Params;

    /// Produce frames for `input`.
    fn generate(&self, input: &str, params: &Self::Params) -> Vec<Frame>;
}
