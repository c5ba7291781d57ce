//! Pure3D chunk container parser and typed decoders.
//!
//! A Pure3D file is a tree of chunks. Every chunk starts with a 12-byte
//! [`ChunkHeader`] giving its type, the size of the header plus payload, and
//! the total size including all children. [`ChunkTree`] walks those sizes
//! into an index-based arena; [`DecoderRegistry`] turns chunks of known
//! types into [`Resource`] values.
//!
//! # Example
//!
//! ```
//! use hitrun_p3d::{ChunkBuilder, ChunkTree, ChunkType};
//!
//! let bytes = ChunkBuilder::new(ChunkType::ROOT)
//!     .child(ChunkBuilder::new(ChunkType::SKELETON))
//!     .to_bytes();
//!
//! let tree = ChunkTree::parse(bytes)?;
//! assert_eq!(tree.root().children().count(), 1);
//! # Ok::<(), hitrun_p3d::Error>(())
//! ```

mod chunk_type;
mod error;
mod header;
mod registry;
mod resource;
mod tree;
mod writer;

pub mod decode;

pub use chunk_type::ChunkType;
pub use error::{DecodeError, DecodeResult, Error, Result};
pub use header::ChunkHeader;
pub use registry::{DecodeFn, DecodeReport, DecodeWarning, DecoderRegistry};
pub use resource::Resource;
pub use tree::{ChunkRef, ChunkTree};
pub use writer::{ChunkBuilder, PayloadWriter};
