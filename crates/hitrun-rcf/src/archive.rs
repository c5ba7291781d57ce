//! RCF archive reader.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use hitrun_common::hash::name_hash;
use hitrun_common::{ByteCursor, SeekFrom};
use memmap2::Mmap;
use rustc_hash::FxHashMap;

use crate::header::{DirectoryEntry, RcfHeader};
use crate::{ArchiveStream, Error, Result};

/// Storage behind an archive and all of its streams.
#[derive(Debug)]
pub(crate) enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Backing {
    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => &mmap[..],
            Self::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// An opened RCF archive.
///
/// Entries are keyed by [`name_hash`]. The optional name table maps hashes
/// back to literal file names for listing.
pub struct RcfArchive {
    name: String,
    data: Arc<Backing>,
    entries: Vec<DirectoryEntry>,
    by_hash: FxHashMap<u32, usize>,
    names: FxHashMap<u32, String>,
}

impl RcfArchive {
    /// Open and memory-map an archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::parse(name, Backing::Mapped(mmap))
    }

    /// Parse an archive held in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::parse(name.into(), Backing::Owned(bytes.into()))
    }

    fn parse(name: String, backing: Backing) -> Result<Self> {
        let data = backing.as_slice();
        let file_len = data.len() as u64;
        let mut cursor = ByteCursor::new(data);

        let header: RcfHeader = cursor.read_struct().map_err(|_| Error::OutOfBounds {
            what: "header",
            offset: 0,
            file_len,
        })?;
        let (magic, version) = (header.magic, header.version);
        if magic != RcfHeader::MAGIC {
            return Err(Error::InvalidMagic {
                expected: RcfHeader::MAGIC,
                actual: magic,
            });
        }
        if version != RcfHeader::VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let entries = read_directory(&mut cursor, &header)?;
        let mut by_hash = FxHashMap::default();
        by_hash.reserve(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let (hash, offset, size) = (entry.hash, entry.offset as u64, entry.size as u64);
            if offset + size > file_len {
                return Err(Error::EntryOutOfBounds {
                    hash,
                    offset,
                    end: offset + size,
                    file_len,
                });
            }
            if by_hash.insert(hash, index).is_some() {
                return Err(Error::DuplicateHash(hash));
            }
        }

        let mut names = FxHashMap::default();
        let names_offset = header.names_offset;
        if names_offset != 0 {
            for literal in read_name_table(&mut cursor, names_offset)? {
                let hash = name_hash(&literal);
                if !by_hash.contains_key(&hash) {
                    tracing::warn!(archive = %name, name = %literal, "name table entry has no directory record");
                    continue;
                }
                if let Some(previous) = names.insert(hash, literal) {
                    tracing::debug!(archive = %name, %previous, "name registered twice, keeping the last");
                }
            }
        }

        tracing::debug!(archive = %name, entries = entries.len(), names = names.len(), "opened archive");
        Ok(Self {
            name,
            data: Arc::new(backing),
            entries,
            by_hash,
            names,
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of directory entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directory records in file order.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn entry_by_hash(&self, hash: u32) -> Option<&DirectoryEntry> {
        self.by_hash.get(&hash).map(|&i| &self.entries[i])
    }

    /// Literal name of an entry, when the name table lists it.
    pub fn entry_name(&self, hash: u32) -> Option<&str> {
        self.names.get(&hash).map(String::as_str)
    }

    /// Known file names, in directory order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().filter_map(|e| self.entry_name(e.hash))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_hash.contains_key(&name_hash(name))
    }

    /// Open a stream over the entry for `name`.
    pub fn get_stream(&self, name: &str) -> Result<ArchiveStream> {
        let index = self
            .by_hash
            .get(&name_hash(name))
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(self.stream(&self.entries[*index]))
    }

    /// Open a stream by directory hash, skipping the name step.
    pub fn get_stream_by_hash(&self, hash: u32) -> Result<ArchiveStream> {
        let entry = self
            .entry_by_hash(hash)
            .ok_or_else(|| Error::NotFound(format!("{hash:#010x}")))?;
        Ok(self.stream(entry))
    }

    fn stream(&self, entry: &DirectoryEntry) -> ArchiveStream {
        let range = entry.range();
        ArchiveStream::new(Arc::clone(&self.data), range.start, range.len())
    }

    /// Copy an entry's bytes out.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.get_stream(name)?.as_bytes().to_vec())
    }

    /// Read several entries in parallel.
    #[cfg(feature = "parallel")]
    pub fn read_parallel(&self, names: &[&str]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        names.par_iter().map(|name| self.read(name)).collect()
    }
}

impl std::fmt::Debug for RcfArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcfArchive")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("names", &self.names.len())
            .finish()
    }
}

fn read_directory(cursor: &mut ByteCursor<'_>, header: &RcfHeader) -> Result<Vec<DirectoryEntry>> {
    let (count, offset) = (header.entry_count as usize, header.directory_offset as usize);
    let file_len = cursor.len() as u64;
    let directory = |cursor: &mut ByteCursor<'_>| -> hitrun_common::Result<Vec<DirectoryEntry>> {
        cursor.seek(SeekFrom::Start(offset))?;
        cursor.read_counted(count, DirectoryEntry::SIZE, |c| c.read_struct::<DirectoryEntry>())
    };
    directory(cursor).map_err(|_| Error::OutOfBounds {
        what: "directory",
        offset: offset as u64,
        file_len,
    })
}

fn read_name_table(cursor: &mut ByteCursor<'_>, offset: u32) -> Result<Vec<String>> {
    let file_len = cursor.len() as u64;
    let table = |cursor: &mut ByteCursor<'_>| -> hitrun_common::Result<Vec<String>> {
        cursor.seek(SeekFrom::Start(offset as usize))?;
        let count = cursor.read_u32()? as usize;
        cursor.read_counted(count, 4, |c| c.read_sized_string())
    };
    table(cursor).map_err(|_| Error::OutOfBounds {
        what: "name table",
        offset: offset as u64,
        file_len,
    })
}
