//! On-disk RCF structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// File header, at offset 0.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RcfHeader {
    pub magic: u32,
    pub version: u32,
    pub entry_count: u32,
    pub directory_offset: u32,
    /// Offset of the name table, or 0 when the archive carries none.
    pub names_offset: u32,
}

impl RcfHeader {
    /// `"RCF1"` read as a little-endian u32.
    pub const MAGIC: u32 = 0x3146_4352;
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 20;
}

/// One directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DirectoryEntry {
    pub hash: u32,
    pub offset: u32,
    pub size: u32,
}

impl DirectoryEntry {
    pub const SIZE: usize = 12;

    /// Byte range within the archive.
    pub fn range(&self) -> std::ops::Range<usize> {
        let (offset, size) = (self.offset as usize, self.size as usize);
        offset..offset + size
    }
}
