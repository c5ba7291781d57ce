//! RSD header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed header at the start of every RSD stream.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RsdHeader {
    /// Codec tag, e.g. `RSD4RADP`.
    pub magic: [u8; 8],
    pub channels: u32,
    /// Bits per sample per channel.
    pub bits: u32,
    pub sample_rate: u32,
}

impl RsdHeader {
    pub const SIZE: usize = 20;

    /// Audio data always starts here; the gap after the header is padding.
    pub const DATA_OFFSET: usize = 0x800;

    /// Codec named by the tag.
    pub fn format(&self) -> Option<RsdFormat> {
        match &self.magic {
            RsdFormat::PCM_MAGIC => Some(RsdFormat::Pcm),
            RsdFormat::RADP_MAGIC => Some(RsdFormat::Radp),
            _ => None,
        }
    }

    /// The tag as text, for messages.
    pub fn tag(&self) -> String {
        String::from_utf8_lossy(&self.magic).trim_end().to_string()
    }
}

/// Payload encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsdFormat {
    /// Little-endian PCM, 8 or 16 bit.
    Pcm,
    /// 4-bit adaptive delta PCM in 20-byte-per-channel blocks.
    Radp,
}

impl RsdFormat {
    pub const PCM_MAGIC: &'static [u8; 8] = b"RSD4PCM ";
    pub const RADP_MAGIC: &'static [u8; 8] = b"RSD4RADP";

    pub fn magic(self) -> &'static [u8; 8] {
        match self {
            Self::Pcm => Self::PCM_MAGIC,
            Self::Radp => Self::RADP_MAGIC,
        }
    }
}

impl std::fmt::Display for RsdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pcm => "PCM",
            Self::Radp => "RADP",
        })
    }
}
