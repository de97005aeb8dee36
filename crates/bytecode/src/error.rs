// SPDX-License-Identifier: MIT

//! Extraction failure reasons, surfaced as the `ExtractionFailed` event
//! payload rather than thrown across component boundaries.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionFailed {
    #[error("artifact is empty or truncated")]
    Truncated,
    #[error("artifact exceeds the configured maximum size")]
    TooLarge,
    #[error("unknown container magic or unsupported container version")]
    UnsupportedFormat,
    #[error("artifact is missing required structural data (e.g. class name)")]
    Malformed,
}