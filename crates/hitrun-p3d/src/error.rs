//! Error types for Pure3D parsing and decoding.

use thiserror::Error;

use crate::ChunkType;

/// Errors that abort loading a container.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] hitrun_common::Error),

    /// Chunk sizes are inconsistent or run past their container.
    #[error("malformed chunk at offset {offset}: {reason}")]
    MalformedChunk { offset: usize, reason: String },

    /// The root chunk does not carry the Pure3D signature.
    #[error("unsupported container signature 0x{signature:08X}")]
    UnsupportedFormat { signature: u32 },
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from decoding a single chunk into a typed value.
///
/// These never abort a container load; the registry collects them as
/// warnings and moves on to the next sibling.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A payload read ran out of bytes.
    #[error("{0}")]
    Cursor(#[from] hitrun_common::Error),

    /// The decoder was handed a chunk of the wrong type.
    #[error("expected {expected} chunk, found {found}")]
    UnexpectedChunk { expected: ChunkType, found: ChunkType },

    /// A required child chunk is absent.
    #[error("{parent} is missing a {child} child")]
    MissingChild { parent: ChunkType, child: ChunkType },

    /// A declared count disagrees with what is actually present.
    #[error("{what}: declared {expected}, found {actual}")]
    CountMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An animation channel holds fewer bytes than its frame count needs.
    #[error("channel '{parameter}' declares {frames} frames needing {needed} bytes, only {available} present")]
    TruncatedChannel {
        parameter: String,
        frames: usize,
        needed: usize,
        available: usize,
    },

    /// A skeleton joint names a parent that does not precede it.
    #[error("joint {joint} has invalid parent {parent}")]
    InvalidParent { joint: usize, parent: u32 },

    /// A vertex index points past the vertex list.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    /// A palette index points past the palette.
    #[error("palette index {index} out of range for {palette_len} entries")]
    PaletteIndex { index: u8, palette_len: usize },

    /// Image format code not understood.
    #[error("unsupported image format {0}")]
    UnsupportedImageFormat(u32),

    /// Raw image bit depth not understood.
    #[error("unsupported raw pixel depth {0} bpp")]
    UnsupportedPixelDepth(u32),

    /// Embedded image failed to decode.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// An enumerated field carries a value outside its range.
    #[error("{field} has invalid value {value}")]
    InvalidValue { field: String, value: u32 },

    /// Image or sprite dimensions whose pixel buffer cannot be addressed.
    #[error("image size {width}x{height} is too large")]
    ImageTooLarge { width: u32, height: u32 },

    /// A name-based reference could not be resolved.
    #[error("{kind} '{name}' not found")]
    MissingReference { kind: &'static str, name: String },

    /// A prop refers to a joint the skeleton does not have.
    #[error("joint {joint} out of range for skeleton '{skeleton}' with {count} joints")]
    JointOutOfRange {
        skeleton: String,
        joint: u32,
        count: usize,
    },
}

/// Result type for chunk decoders.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
