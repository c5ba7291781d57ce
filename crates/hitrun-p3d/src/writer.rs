//! Builders for writing Pure3D containers.
//!
//! [`ChunkBuilder`] computes the size fields of each header from its payload
//! and children; [`PayloadWriter`] lays out payload fields in the encoding
//! the decoders expect.

use hitrun_common::math::{Mat4, Quat, Vec2, Vec3};
use zerocopy::IntoBytes;

use crate::{ChunkHeader, ChunkType};

/// A chunk being built, before serialization.
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    chunk_type: ChunkType,
    payload: Vec<u8>,
    children: Vec<ChunkBuilder>,
}

impl ChunkBuilder {
    pub fn new(chunk_type: ChunkType) -> Self {
        Self {
            chunk_type,
            payload: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the payload bytes.
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Add a child chunk.
    pub fn child(mut self, child: ChunkBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Add multiple children.
    pub fn children(mut self, children: impl IntoIterator<Item = ChunkBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    /// Header plus payload size.
    pub fn payload_size(&self) -> u32 {
        (ChunkHeader::SIZE + self.payload.len()) as u32
    }

    /// Size including all children.
    pub fn total_size(&self) -> u32 {
        self.payload_size() + self.children.iter().map(ChunkBuilder::total_size).sum::<u32>()
    }

    /// Append the encoded chunk to `out`.
    pub fn write_into(&self, out: &mut Vec<u8>) {
        let header = ChunkHeader::new(self.chunk_type, self.payload_size(), self.total_size());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.payload);
        for child in &self.children {
            child.write_into(out);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_size() as usize);
        self.write_into(&mut out);
        out
    }
}

/// Little-endian payload field writer.
#[derive(Debug, Clone, Default)]
pub struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.buf.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(mut self, v: i16) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// One-byte length prefix, then the text. Longer names are cut at 255 bytes.
    pub fn lp_string(mut self, s: &str) -> Self {
        let bytes = &s.as_bytes()[..s.len().min(u8::MAX as usize)];
        self.buf.push(bytes.len() as u8);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Four-character code, NUL padded.
    pub fn fourcc(mut self, code: &str) -> Self {
        let mut raw = [0u8; 4];
        for (dst, src) in raw.iter_mut().zip(code.bytes()) {
            *dst = src;
        }
        self.buf.extend_from_slice(&raw);
        self
    }

    pub fn vec2(self, v: Vec2) -> Self {
        self.f32(v.x).f32(v.y)
    }

    pub fn vec3(self, v: Vec3) -> Self {
        self.f32(v.x).f32(v.y).f32(v.z)
    }

    pub fn quat(self, q: Quat) -> Self {
        self.f32(q.w).f32(q.x).f32(q.y).f32(q.z)
    }

    pub fn mat4(self, m: &Mat4) -> Self {
        m.to_cols_array().into_iter().fold(self, PayloadWriter::f32)
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

impl From<PayloadWriter> for Vec<u8> {
    fn from(writer: PayloadWriter) -> Self {
        writer.finish()
    }
}
