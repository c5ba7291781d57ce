//! Bounds-checked cursor for zero-copy parsing of byte slices.
//!
//! This module provides [`ByteCursor`], a seekable reader over a borrowed
//! buffer. Every read either succeeds completely or fails with
//! [`Error::OutOfBounds`] and leaves the position where it was.

use zerocopy::FromBytes;

use crate::math::{Mat4, Quat, Vec2, Vec3};
use crate::{Error, Result};

/// Seek origin for [`ByteCursor::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// Absolute offset from the start of the buffer.
    Start(usize),
    /// Move forward from the current position.
    Forward(usize),
    /// Move backward from the current position.
    Backward(usize),
    /// Offset back from the end of the buffer.
    End(usize),
}

/// A bounds-checked binary reader over a byte slice.
///
/// # Example
///
/// ```
/// use hitrun_common::{ByteCursor, SeekFrom};
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut cursor = ByteCursor::new(&data);
///
/// assert_eq!(cursor.read_u32().unwrap(), 0x04030201);
/// cursor.seek(SeekFrom::End(2)).unwrap();
/// assert_eq!(cursor.read_u16().unwrap(), 0x0807);
/// assert!(cursor.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a new cursor at the start of a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// The whole underlying buffer.
    #[inline]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Move the cursor. Targets outside `[0, len]` fail without moving.
    pub fn seek(&mut self, from: SeekFrom) -> Result<usize> {
        let len = self.data.len();
        let target = match from {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Forward(count) => self.position.checked_add(count),
            SeekFrom::Backward(count) => self.position.checked_sub(count),
            SeekFrom::End(count) => len.checked_sub(count),
        };

        match target {
            Some(target) if target <= len => {
                self.position = target;
                Ok(target)
            }
            _ => {
                let (SeekFrom::Start(n) | SeekFrom::Forward(n) | SeekFrom::Backward(n) | SeekFrom::End(n)) = from;
                Err(self.out_of_bounds(n))
            }
        }
    }

    /// Advance the position by a number of bytes.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.seek(SeekFrom::Forward(count)).map(|_| ())
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    #[inline]
    fn out_of_bounds(&self, needed: usize) -> Error {
        Error::OutOfBounds {
            offset: self.position,
            needed,
            available: self.remaining(),
        }
    }

    /// Fail unless at least `needed` bytes remain.
    #[inline]
    pub fn ensure(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(self.out_of_bounds(needed));
        }
        Ok(())
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Split off the next `count` bytes as an independent cursor.
    pub fn sub_cursor(&mut self, count: usize) -> Result<ByteCursor<'a>> {
        self.read_bytes(count).map(ByteCursor::new)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_array::<1>().map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_array().map(i16::from_le_bytes)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read a u32 and treat any non-zero value as `true`.
    #[inline]
    pub fn read_bool32(&mut self) -> Result<bool> {
        self.read_u32().map(|v| v != 0)
    }

    /// Peek at a u32 without advancing.
    #[inline]
    pub fn peek_u32(&self) -> Result<u32> {
        let bytes = self.peek_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a string with a one-byte length prefix.
    ///
    /// Names in Pure3D payloads are padded with NULs; the text ends at the
    /// first NUL. Fails without moving if the length exceeds the buffer.
    pub fn read_lp_string(&mut self) -> Result<String> {
        let len = self.peek_bytes(1)?[0] as usize;
        self.ensure(1 + len)?;
        self.position += 1;
        let bytes = self.read_bytes(len)?;
        Ok(trim_nul(bytes))
    }

    /// Read a string with a four-byte length prefix.
    pub fn read_sized_string(&mut self) -> Result<String> {
        let len = self.peek_u32()? as usize;
        self.ensure(len.saturating_add(4))?;
        self.position += 4;
        let bytes = self.read_bytes(len)?;
        Ok(trim_nul(bytes))
    }

    /// Read a four-character code, trimmed of trailing NULs and spaces.
    pub fn read_fourcc(&mut self) -> Result<String> {
        let bytes = self.read_array::<4>()?;
        let text = trim_nul(&bytes);
        Ok(text.trim_end_matches(' ').to_string())
    }

    /// Read a UTF-8 string of a specific length.
    pub fn read_string(&mut self, length: usize) -> Result<&'a str> {
        let bytes = self.peek_bytes(length)?;
        let text = std::str::from_utf8(bytes)?;
        self.position += length;
        Ok(text)
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.peek_bytes(size)?;
        let value = T::read_from_bytes(bytes).map_err(|_| self.out_of_bounds(size))?;
        self.position += size;
        Ok(value)
    }

    /// Read `count` elements of `elem_size` bytes each.
    ///
    /// The total size is checked up front, so a short buffer fails before
    /// any element is consumed.
    pub fn read_counted<T, F>(&mut self, count: usize, elem_size: usize, mut read: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let total = count
            .checked_mul(elem_size)
            .ok_or_else(|| self.out_of_bounds(usize::MAX))?;
        self.ensure(total)?;
        let start = self.position;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            match read(self) {
                Ok(value) => out.push(value),
                Err(e) => {
                    self.position = start;
                    return Err(e);
                }
            }
        }
        Ok(out)
    }

    /// Read a 2D vector.
    pub fn read_vec2(&mut self) -> Result<Vec2> {
        let b = self.read_array::<8>()?;
        Ok(Vec2::new(f32_at(&b, 0), f32_at(&b, 4)))
    }

    /// Read a 3D vector.
    pub fn read_vec3(&mut self) -> Result<Vec3> {
        let b = self.read_array::<12>()?;
        Ok(Vec3::new(f32_at(&b, 0), f32_at(&b, 4), f32_at(&b, 8)))
    }

    /// Read a quaternion stored as `w, x, y, z` floats.
    pub fn read_quat(&mut self) -> Result<Quat> {
        let b = self.read_array::<16>()?;
        Ok(Quat::new(
            f32_at(&b, 0),
            f32_at(&b, 4),
            f32_at(&b, 8),
            f32_at(&b, 12),
        ))
    }

    /// Read a column-major 4x4 matrix.
    pub fn read_mat4(&mut self) -> Result<Mat4> {
        let b = self.read_array::<64>()?;
        let mut m = [0.0f32; 16];
        for (i, v) in m.iter_mut().enumerate() {
            *v = f32_at(&b, i * 4);
        }
        Ok(Mat4::from_cols_array(&m))
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.peek_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        self.position += expected.len();
        Ok(())
    }
}

#[inline]
fn f32_at(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn trim_nul(bytes: &[u8]) -> String {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x01u8, 0x02, 0x03, 0x04, // u32: 0x04030201
            0xFF, 0xFF, // i16: -1
            0x00, 0x00, 0x80, 0x3F, // f32: 1.0
        ];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u32().unwrap(), 0x04030201);
        assert_eq!(cursor.read_i16().unwrap(), -1);
        assert_eq!(cursor.read_f32().unwrap(), 1.0);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_failed_read_keeps_position() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().unwrap();

        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfBounds {
                offset: 1,
                needed: 4,
                available: 2
            }
        ));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn test_seek_modes() {
        let data = [0u8; 16];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.seek(SeekFrom::Start(4)).unwrap(), 4);
        assert_eq!(cursor.seek(SeekFrom::Forward(6)).unwrap(), 10);
        assert_eq!(cursor.seek(SeekFrom::Backward(3)).unwrap(), 7);
        assert_eq!(cursor.seek(SeekFrom::End(0)).unwrap(), 16);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_seek_out_of_range_keeps_position() {
        let data = [0u8; 8];
        let mut cursor = ByteCursor::new(&data);
        cursor.seek(SeekFrom::Start(2)).unwrap();

        assert!(cursor.seek(SeekFrom::Start(9)).is_err());
        assert!(cursor.seek(SeekFrom::Forward(7)).is_err());
        assert!(cursor.seek(SeekFrom::Backward(3)).is_err());
        assert!(cursor.seek(SeekFrom::End(9)).is_err());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_lp_string_trims_padding() {
        let data = b"\x08homer\0\0\0rest";
        let mut cursor = ByteCursor::new(data);

        assert_eq!(cursor.read_lp_string().unwrap(), "homer");
        assert_eq!(cursor.position(), 9);
    }

    #[test]
    fn test_lp_string_longer_than_buffer_fails() {
        let data = b"\x10short";
        let mut cursor = ByteCursor::new(data);

        assert!(cursor.read_lp_string().is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_sized_string_and_fourcc() {
        let data = b"\x03\0\0\0abcTEX\0";
        let mut cursor = ByteCursor::new(data);

        assert_eq!(cursor.read_sized_string().unwrap(), "abc");
        assert_eq!(cursor.read_fourcc().unwrap(), "TEX");
    }

    #[test]
    fn test_read_counted_checks_total_first() {
        let data = [1u8, 0, 2, 0, 3];
        let mut cursor = ByteCursor::new(&data);

        assert!(cursor.read_counted(3, 2, |c| c.read_u16()).is_err());
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_counted(2, 2, |c| c.read_u16()).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let cursor = ByteCursor::new(&data);

        assert_eq!(cursor.peek_u32().unwrap(), 0x04030201);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_expect_magic() {
        let mut cursor = ByteCursor::new(b"RSD4RADP");
        assert!(cursor.expect_magic(b"RSD4PCM ").is_err());
        assert_eq!(cursor.position(), 0);
        cursor.expect_magic(b"RSD4RADP").unwrap();
        assert!(cursor.is_empty());
    }

    proptest! {
        #[test]
        fn prop_reads_never_move_on_failure(data in proptest::collection::vec(any::<u8>(), 0..32), start in 0usize..40) {
            let mut cursor = ByteCursor::new(&data);
            let _ = cursor.seek(SeekFrom::Start(start));
            let before = cursor.position();
            if cursor.read_mat4().is_err() {
                prop_assert_eq!(cursor.position(), before);
            }
            let before = cursor.position();
            if cursor.read_lp_string().is_err() {
                prop_assert_eq!(cursor.position(), before);
            }
        }
    }
}
