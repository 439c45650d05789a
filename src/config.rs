//! Codec configuration.

/// Knobs that change how strictly frames are decoded.
///
/// Encoding is not configurable: the wire format is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Require the bytes consumed by a read to equal the root length header, and keep
    /// the walk inside the framed bytes. On by default.
    pub strict_framing: bool,
    /// Upper bound on any decoded element count or array dimension product.
    pub max_elements: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            strict_framing: true,
            max_elements: i32::MAX as usize,
        }
    }
}

impl CodecOptions {
    /// Sets [`strict_framing`](Self::strict_framing).
    #[must_use]
    pub fn strict_framing(mut self, strict: bool) -> Self {
        self.strict_framing = strict;
        self
    }

    /// Sets [`max_elements`](Self::max_elements).
    #[must_use]
    pub fn max_elements(mut self, max: usize) -> Self {
        self.max_elements = max;
        self
    }
}
