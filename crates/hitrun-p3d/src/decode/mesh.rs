//! Mesh and skin decoding.

use hitrun_common::math::{Vec2, Vec3};
use hitrun_common::ByteCursor;

use super::check_count;
use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    TriangleList,
    TriangleStrip,
    LineList,
    LineStrip,
}

impl PrimitiveType {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::TriangleList,
            1 => Self::TriangleStrip,
            2 => Self::LineList,
            3 => Self::LineStrip,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub low: Vec3,
    pub high: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub centre: Vec3,
    pub radius: f32,
}

/// One draw call worth of geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimGroup {
    pub shader: String,
    pub primitive: PrimitiveType,
    pub vertex_types: u32,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// UV sets, in channel order.
    pub uvs: Vec<Vec<Vec2>>,
    /// ARGB packed colours.
    pub colours: Vec<u32>,
    pub indices: Vec<u32>,
    /// Skinning: up to four joint indices per vertex.
    pub matrices: Vec<[u8; 4]>,
    pub weights: Vec<Vec3>,
}

impl PrimGroup {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// A static mesh or, when `skeleton` is set, a skin bound to a skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub version: u32,
    pub skeleton: Option<String>,
    pub prim_groups: Vec<PrimGroup>,
    pub bounding_box: Option<BoundingBox>,
    pub bounding_sphere: Option<BoundingSphere>,
}

/// Index range within a [`FlatMesh`] drawn with one primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub primitive: PrimitiveType,
    pub first_index: usize,
    pub index_count: usize,
}

/// All prim groups of a mesh concatenated into shared buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub draws: Vec<DrawRange>,
}

impl Mesh {
    /// Concatenate prim groups, rebasing each group's indices onto the shared
    /// vertex buffer. Groups without normals get zero normals.
    pub fn flatten(&self) -> FlatMesh {
        let mut flat = FlatMesh::default();
        for group in &self.prim_groups {
            let base = flat.positions.len() as u32;
            flat.positions.extend_from_slice(&group.positions);
            if group.normals.len() == group.positions.len() {
                flat.normals.extend_from_slice(&group.normals);
            } else {
                flat.normals.resize(flat.positions.len(), Vec3::ZERO);
            }

            flat.draws.push(DrawRange {
                primitive: group.primitive,
                first_index: flat.indices.len(),
                index_count: group.indices.len(),
            });
            flat.indices.extend(group.indices.iter().map(|i| i + base));
        }
        flat
    }

    pub fn vertex_count(&self) -> usize {
        self.prim_groups.iter().map(PrimGroup::vertex_count).sum()
    }
}

/// Decode a `Mesh` chunk.
pub fn decode_mesh(chunk: ChunkRef<'_>) -> DecodeResult<Mesh> {
    let mut cursor = chunk.cursor();
    let (name, version, skeleton) = match chunk.chunk_type() {
        ChunkType::MESH => (cursor.read_lp_string()?, cursor.read_u32()?, None),
        ChunkType::SKIN => {
            let name = cursor.read_lp_string()?;
            let version = cursor.read_u32()?;
            (name, version, Some(cursor.read_lp_string()?))
        }
        found => {
            return Err(DecodeError::UnexpectedChunk {
                expected: ChunkType::MESH,
                found,
            })
        }
    };
    let prim_group_count = cursor.read_u32()? as usize;

    let mut mesh = Mesh {
        name,
        version,
        skeleton,
        prim_groups: Vec::with_capacity(prim_group_count.min(chunk.child_count())),
        bounding_box: None,
        bounding_sphere: None,
    };

    for child in chunk.children() {
        let mut cursor = child.cursor();
        match child.chunk_type() {
            ChunkType::PRIM_GROUP => mesh.prim_groups.push(decode_prim_group(child)?),
            ChunkType::BOUNDING_BOX => {
                mesh.bounding_box = Some(BoundingBox {
                    low: cursor.read_vec3()?,
                    high: cursor.read_vec3()?,
                })
            }
            ChunkType::BOUNDING_SPHERE => {
                mesh.bounding_sphere = Some(BoundingSphere {
                    centre: cursor.read_vec3()?,
                    radius: cursor.read_f32()?,
                })
            }
            _ => {}
        }
    }

    check_count("prim groups", prim_group_count, mesh.prim_groups.len())?;
    Ok(mesh)
}

/// Decode a `Skin` chunk; identical to a mesh plus a skeleton name.
pub fn decode_skin(chunk: ChunkRef<'_>) -> DecodeResult<Mesh> {
    super::expect_type(chunk, ChunkType::SKIN)?;
    decode_mesh(chunk)
}

fn read_list<'a, T>(
    chunk: ChunkRef<'a>,
    elem_size: usize,
    read: impl FnMut(&mut ByteCursor<'a>) -> hitrun_common::Result<T>,
) -> DecodeResult<Vec<T>> {
    let mut cursor = chunk.cursor();
    let count = cursor.read_u32()? as usize;
    Ok(cursor.read_counted(count, elem_size, read)?)
}

fn decode_prim_group(chunk: ChunkRef<'_>) -> DecodeResult<PrimGroup> {
    let mut cursor = chunk.cursor();
    let _version = cursor.read_u32()?;
    let shader = cursor.read_lp_string()?;
    let primitive_code = cursor.read_u32()?;
    let vertex_types = cursor.read_u32()?;
    let vertex_count = cursor.read_u32()? as usize;
    let index_count = cursor.read_u32()? as usize;
    let _matrix_count = cursor.read_u32()?;

    let primitive = PrimitiveType::from_u32(primitive_code).ok_or_else(|| DecodeError::InvalidValue {
        field: "primitive type".to_string(),
        value: primitive_code,
    })?;

    let mut group = PrimGroup {
        shader,
        primitive,
        vertex_types,
        positions: Vec::new(),
        normals: Vec::new(),
        uvs: Vec::new(),
        colours: Vec::new(),
        indices: Vec::new(),
        matrices: Vec::new(),
        weights: Vec::new(),
    };

    for child in chunk.children() {
        match child.chunk_type() {
            ChunkType::POSITION_LIST => group.positions = read_list(child, 12, |c| c.read_vec3())?,
            ChunkType::NORMAL_LIST => group.normals = read_list(child, 12, |c| c.read_vec3())?,
            ChunkType::COLOUR_LIST => group.colours = read_list(child, 4, |c| c.read_u32())?,
            ChunkType::INDEX_LIST => group.indices = read_list(child, 4, |c| c.read_u32())?,
            ChunkType::MATRIX_LIST => group.matrices = read_list(child, 4, |c| c.read_array())?,
            ChunkType::WEIGHT_LIST => group.weights = read_list(child, 12, |c| c.read_vec3())?,
            ChunkType::UV_LIST => {
                let mut cursor = child.cursor();
                let count = cursor.read_u32()? as usize;
                let _channel = cursor.read_u32()?;
                group.uvs.push(cursor.read_counted(count, 8, |c| c.read_vec2())?);
            }
            _ => {}
        }
    }

    check_count("positions", vertex_count, group.positions.len())?;
    check_count("indices", index_count, group.indices.len())?;
    for (what, len) in [
        ("normals", group.normals.len()),
        ("colours", group.colours.len()),
        ("matrices", group.matrices.len()),
        ("weights", group.weights.len()),
    ] {
        if len != 0 {
            check_count(what, vertex_count, len)?;
        }
    }
    for uvs in &group.uvs {
        check_count("uvs", vertex_count, uvs.len())?;
    }
    if let Some(&index) = group.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(DecodeError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }

    Ok(group)
}
