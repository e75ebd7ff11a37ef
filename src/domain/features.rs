use std::num::NonZeroU32;

/// Process-wide feature switches, read-only for the lifetime of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureConfig {
    pub svg: bool,
    pub png: bool,
    /// MathML style/box metrics (`mathoidStyle`).
    pub img: bool,
    /// Structural info: the `texvcinfo` and `graph` outputs.
    pub texvcinfo: bool,
    /// Gates the `speech` output format.
    pub speech: bool,
    /// Per-request speech default when the caller does not opt out.
    pub speech_on: bool,
    pub svgo: bool,
    /// Skip validation of TeX-family input unless structural info is requested.
    pub no_check: bool,
    pub dpi: Option<NonZeroU32>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            svg: true,
            png: true,
            img: true,
            texvcinfo: true,
            speech: true,
            speech_on: true,
            svgo: true,
            no_check: false,
            dpi: None,
        }
    }
}
