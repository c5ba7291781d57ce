//! Builder for RCF archives.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use hitrun_common::hash::name_hash;
use rustc_hash::FxHashMap;
use zerocopy::IntoBytes;

use crate::header::{DirectoryEntry, RcfHeader};
use crate::Result;

/// Entry data starts on this boundary.
const ALIGNMENT: usize = 16;

/// Builder for RCF archives.
///
/// Layout: header, entry data (each 16-byte aligned), directory, name table.
///
/// # Example
///
/// ```
/// use hitrun_rcf::{RcfArchive, RcfWriter};
///
/// let mut writer = RcfWriter::new();
/// writer.add("sound/music/theme.rsd", b"RSD4".to_vec());
/// let bytes = writer.to_bytes()?;
///
/// let archive = RcfArchive::from_bytes("music.rcf", bytes)?;
/// assert_eq!(archive.read("SOUND\\MUSIC\\THEME.RSD")?, b"RSD4");
/// # Ok::<(), hitrun_rcf::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct RcfWriter {
    files: Vec<(String, Vec<u8>)>,
    index: FxHashMap<u32, usize>,
}

impl RcfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. A name that hashes like an earlier one replaces it.
    pub fn add(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> &mut Self {
        let name = name.into();
        let hash = name_hash(&name);
        let file = (name, data.into());
        match self.index.get(&hash) {
            Some(&i) => self.files[i] = file,
            None => {
                self.index.insert(hash, self.files.len());
                self.files.push(file);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Serialize the archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut directory = Vec::with_capacity(self.files.len());
        let mut position = align(RcfHeader::SIZE);
        for (name, data) in &self.files {
            directory.push(DirectoryEntry {
                hash: name_hash(name),
                offset: to_u32(position)?,
                size: to_u32(data.len())?,
            });
            position = align(position + data.len());
        }
        let directory_offset = position;
        let names_offset = directory_offset + directory.len() * DirectoryEntry::SIZE;

        let header = RcfHeader {
            magic: RcfHeader::MAGIC,
            version: RcfHeader::VERSION,
            entry_count: to_u32(directory.len())?,
            directory_offset: to_u32(directory_offset)?,
            names_offset: to_u32(names_offset)?,
        };

        writer.write_all(header.as_bytes())?;
        let mut written = RcfHeader::SIZE;
        for (_, data) in &self.files {
            written = pad(&mut writer, written)?;
            writer.write_all(data)?;
            written += data.len();
        }
        pad(&mut writer, written)?;

        writer.write_all(directory.as_bytes())?;

        writer.write_u32::<LittleEndian>(to_u32(self.files.len())?)?;
        for (name, _) in &self.files {
            writer.write_u32::<LittleEndian>(to_u32(name.len())?)?;
            writer.write_all(name.as_bytes())?;
        }

        tracing::debug!(entries = self.files.len(), directory_offset, "wrote archive");
        Ok(())
    }
}

fn align(position: usize) -> usize {
    position.next_multiple_of(ALIGNMENT)
}

/// Write zeros up to the next boundary, returning the new position.
fn pad<W: Write>(writer: &mut W, position: usize) -> io::Result<usize> {
    let aligned = align(position);
    writer.write_all(&[0u8; ALIGNMENT][..aligned - position])?;
    Ok(aligned)
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "archive does not fit 32-bit offsets").into()
    })
}
