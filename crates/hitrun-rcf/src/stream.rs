//! Bounded readers over one archive entry.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use hitrun_common::ByteCursor;

use crate::archive::Backing;

/// A read-only view of one entry.
///
/// Streams share the archive's backing storage and keep it alive; each has
/// its own position, so clones can be read from different threads.
#[derive(Clone)]
pub struct ArchiveStream {
    data: Arc<Backing>,
    start: usize,
    len: usize,
    position: u64,
}

impl ArchiveStream {
    pub(crate) fn new(data: Arc<Backing>, start: usize, len: usize) -> Self {
        Self {
            data,
            start,
            len,
            position: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The entry's bytes, independent of the stream position.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data.as_slice()[self.start..self.start + self.len]
    }

    /// A cursor over the entry, starting at its first byte.
    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(self.as_bytes())
    }
}

impl fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveStream")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("position", &self.position)
            .finish()
    }
}

impl Read for ArchiveStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let position = self.position.min(self.len as u64) as usize;
        let available = &self.as_bytes()[position..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position += count as u64;
        Ok(count)
    }
}

impl Seek for ArchiveStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(n) => {
                self.position = n;
                return Ok(n);
            }
            SeekFrom::End(n) => (self.len as u64, n),
            SeekFrom::Current(n) => (self.position, n),
        };
        match base.checked_add_signed(offset) {
            Some(n) => {
                self.position = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(bytes: &[u8], start: usize, len: usize) -> ArchiveStream {
        ArchiveStream::new(Arc::new(Backing::Owned(bytes.to_vec())), start, len)
    }

    #[test]
    fn test_read_stays_in_bounds() {
        let mut s = stream(b"xxhelloyy", 2, 5);
        let mut out = Vec::new();
        s.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
        assert_eq!(s.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn test_seek() {
        let mut s = stream(b"xxhelloyy", 2, 5);
        assert_eq!(s.seek(SeekFrom::End(-2)).unwrap(), 3);
        let mut out = [0u8; 8];
        assert_eq!(s.read(&mut out).unwrap(), 2);
        assert_eq!(&out[..2], b"lo");

        assert!(s.seek(SeekFrom::Current(-10)).is_err());
        assert_eq!(s.position(), 5);

        // Past the end is allowed; reads there return nothing.
        assert_eq!(s.seek(SeekFrom::Start(50)).unwrap(), 50);
        assert_eq!(s.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_clones_have_independent_positions() {
        let mut a = stream(b"abcdef", 0, 6);
        let mut b = a.clone();
        let mut buf = [0u8; 3];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(a.cursor().read_u8().unwrap(), b'a');
    }
}
