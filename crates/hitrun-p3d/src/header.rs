//! Chunk header structure.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::ChunkType;

/// The fixed header at the start of every chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct ChunkHeader {
    /// Chunk type tag.
    pub chunk_type: ChunkType,
    /// Size of this header plus the payload.
    pub payload_size: u32,
    /// Size of this header, the payload and all children.
    pub total_size: u32,
}

impl ChunkHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 12;

    pub fn new(chunk_type: ChunkType, payload_size: u32, total_size: u32) -> Self {
        Self {
            chunk_type,
            payload_size,
            total_size,
        }
    }

    /// Bytes occupied by children.
    #[inline]
    pub fn children_size(&self) -> u32 {
        let (payload, total) = (self.payload_size, self.total_size);
        total.saturating_sub(payload)
    }
}
