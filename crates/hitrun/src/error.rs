//! Error types for the facade.

use thiserror::Error;

/// Any error the loading helpers can return.
#[derive(Debug, Error)]
pub enum Error {
    /// The container could not be parsed.
    #[error("container: {0}")]
    Container(#[from] hitrun_p3d::Error),

    /// Archive lookup or open failed.
    #[error("archive: {0}")]
    Archive(#[from] hitrun_rcf::Error),

    /// Audio decoding failed.
    #[error("audio: {0}")]
    Audio(#[from] hitrun_rsd::Error),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
