//! Error types for the RSD crate.

use thiserror::Error;

/// Errors that can occur when decoding RSD streams.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] hitrun_common::Error),

    /// The stream ends before the audio payload begins.
    #[error("stream is {len} bytes, shorter than the {needed}-byte header")]
    Truncated { len: usize, needed: usize },

    /// The header declares zero channels.
    #[error("invalid channel count: {0}")]
    InvalidChannelCount(u32),

    /// The header tag names a codec this crate does not decode.
    #[error("unsupported RSD format {0:?}")]
    UnsupportedFormat(String),

    /// PCM payloads must be 8 or 16 bits per sample.
    #[error("unsupported PCM bit depth: {0}")]
    UnsupportedBitDepth(u32),
}

/// Result type for RSD operations.
pub type Result<T> = std::result::Result<T, Error>;
