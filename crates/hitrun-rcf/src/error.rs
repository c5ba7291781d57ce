//! Error types for the RCF crate.

use thiserror::Error;

/// Errors that can occur when working with RCF archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] hitrun_common::Error),

    /// The file does not start with the RCF signature.
    #[error("invalid RCF signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },

    /// Unsupported version.
    #[error("unsupported RCF version: {0}")]
    UnsupportedVersion(u32),

    /// A header table runs past the end of the file.
    #[error("{what} at offset {offset} runs past end of file ({file_len} bytes)")]
    OutOfBounds {
        what: &'static str,
        offset: u64,
        file_len: u64,
    },

    /// A directory entry points outside the file.
    #[error("entry {hash:#010x} spans {offset}..{end}, past end of file ({file_len} bytes)")]
    EntryOutOfBounds {
        hash: u32,
        offset: u64,
        end: u64,
        file_len: u64,
    },

    /// Two directory entries share a hash.
    #[error("duplicate directory hash {0:#010x}")]
    DuplicateHash(u32),

    /// No entry for the requested name or hash.
    #[error("entry not found: {0}")]
    NotFound(String),
}

/// Result type for RCF operations.
pub type Result<T> = std::result::Result<T, Error>;
