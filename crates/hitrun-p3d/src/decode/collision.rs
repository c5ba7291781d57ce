//! Collision object decoding.

use hitrun_common::math::Vec3;

use super::{check_count, expect_type, required_child};
use crate::{ChunkRef, ChunkType, DecodeResult};

/// A primitive collision shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    Sphere {
        centre: Vec3,
        radius: f32,
    },
    Cylinder {
        centre: Vec3,
        axis: Vec3,
        radius: f32,
        half_length: f32,
        flat_end: bool,
    },
    /// Oriented box: centre, three unit axes and the half extent along each.
    OrientedBox {
        centre: Vec3,
        axes: [Vec3; 3],
        half_extents: Vec3,
    },
}

impl CollisionShape {
    /// The eight corners of an oriented box; empty for other shapes.
    pub fn box_corners(&self) -> Vec<Vec3> {
        let Self::OrientedBox {
            centre,
            axes,
            half_extents,
        } = *self
        else {
            return Vec::new();
        };

        let mut corners = Vec::with_capacity(8);
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sz in [-1.0, 1.0] {
                    corners.push(
                        centre
                            + axes[0] * (sx * half_extents.x)
                            + axes[1] * (sy * half_extents.y)
                            + axes[2] * (sz * half_extents.z),
                    );
                }
            }
        }
        corners
    }
}

/// A node of the collision volume hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionVolume {
    pub object_reference: u32,
    pub owner_index: i32,
    pub shape: Option<CollisionShape>,
    pub sub_volumes: Vec<CollisionVolume>,
}

impl CollisionVolume {
    /// All shapes in this volume and its descendants, depth first.
    pub fn shapes(&self) -> Vec<CollisionShape> {
        let mut out: Vec<_> = self.shape.into_iter().collect();
        for sub in &self.sub_volumes {
            out.extend(sub.shapes());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionObject {
    pub name: String,
    pub version: u32,
    pub material: String,
    pub sub_object_count: u32,
    pub owner_count: u32,
    pub volumes: Vec<CollisionVolume>,
}

pub fn decode_collision_object(chunk: ChunkRef<'_>) -> DecodeResult<CollisionObject> {
    expect_type(chunk, ChunkType::COLLISION_OBJECT)?;
    let mut cursor = chunk.cursor();

    Ok(CollisionObject {
        name: cursor.read_lp_string()?,
        version: cursor.read_u32()?,
        material: cursor.read_lp_string()?,
        sub_object_count: cursor.read_u32()?,
        owner_count: cursor.read_u32()?,
        volumes: chunk
            .children_of_type(ChunkType::COLLISION_VOLUME)
            .map(decode_volume)
            .collect::<DecodeResult<_>>()?,
    })
}

fn decode_volume(chunk: ChunkRef<'_>) -> DecodeResult<CollisionVolume> {
    let mut cursor = chunk.cursor();
    let object_reference = cursor.read_u32()?;
    let owner_index = cursor.read_i32()?;
    let sub_volume_count = cursor.read_u32()? as usize;

    let mut volume = CollisionVolume {
        object_reference,
        owner_index,
        shape: None,
        sub_volumes: Vec::with_capacity(sub_volume_count.min(chunk.child_count())),
    };

    for child in chunk.children() {
        let shape = match child.chunk_type() {
            ChunkType::COLLISION_VOLUME => {
                volume.sub_volumes.push(decode_volume(child)?);
                continue;
            }
            ChunkType::COLLISION_SPHERE => decode_sphere(child)?,
            ChunkType::COLLISION_CYLINDER => decode_cylinder(child)?,
            ChunkType::COLLISION_OBBOX => decode_oriented_box(child)?,
            _ => continue,
        };
        if volume.shape.replace(shape).is_some() {
            tracing::debug!(offset = child.offset(), "collision volume with more than one shape");
        }
    }

    check_count("sub volumes", sub_volume_count, volume.sub_volumes.len())?;
    Ok(volume)
}

fn vectors(chunk: ChunkRef<'_>) -> DecodeResult<Vec<Vec3>> {
    chunk
        .children_of_type(ChunkType::COLLISION_VECTOR)
        .map(|v| -> DecodeResult<Vec3> { Ok(v.cursor().read_vec3()?) })
        .collect()
}

fn decode_sphere(chunk: ChunkRef<'_>) -> DecodeResult<CollisionShape> {
    let radius = chunk.cursor().read_f32()?;
    let centre = required_child(chunk, ChunkType::COLLISION_VECTOR)?.cursor().read_vec3()?;
    Ok(CollisionShape::Sphere { centre, radius })
}

fn decode_cylinder(chunk: ChunkRef<'_>) -> DecodeResult<CollisionShape> {
    let mut cursor = chunk.cursor();
    let radius = cursor.read_f32()?;
    let half_length = cursor.read_f32()?;
    let flat_end = cursor.read_u16()? != 0;

    let vectors = vectors(chunk)?;
    check_count("cylinder vectors", 2, vectors.len())?;
    Ok(CollisionShape::Cylinder {
        centre: vectors[0],
        axis: vectors[1],
        radius,
        half_length,
        flat_end,
    })
}

/// Payload holds the half extents; the four vector children are the centre
/// followed by the x, y and z axes.
fn decode_oriented_box(chunk: ChunkRef<'_>) -> DecodeResult<CollisionShape> {
    let half_extents = chunk.cursor().read_vec3()?;

    let vectors = vectors(chunk)?;
    check_count("oriented box vectors", 4, vectors.len())?;
    Ok(CollisionShape::OrientedBox {
        centre: vectors[0],
        axes: [vectors[1], vectors[2], vectors[3]],
        half_extents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkBuilder, ChunkTree, DecodeError, PayloadWriter};

    fn vector(v: Vec3) -> ChunkBuilder {
        ChunkBuilder::new(ChunkType::COLLISION_VECTOR).payload(PayloadWriter::new().vec3(v))
    }

    fn volume(shape: ChunkBuilder, subs: Vec<ChunkBuilder>) -> ChunkBuilder {
        ChunkBuilder::new(ChunkType::COLLISION_VOLUME)
            .payload(PayloadWriter::new().u32(0).i32(-1).u32(subs.len() as u32))
            .child(shape)
            .children(subs)
    }

    fn object(volumes: Vec<ChunkBuilder>) -> ChunkBuilder {
        ChunkBuilder::new(ChunkType::COLLISION_OBJECT)
            .payload(PayloadWriter::new().lp_string("car").u32(1).lp_string("metal").u32(1).u32(0))
            .children(volumes)
    }

    fn obbox(children: Vec<ChunkBuilder>) -> ChunkBuilder {
        ChunkBuilder::new(ChunkType::COLLISION_OBBOX)
            .payload(PayloadWriter::new().vec3(Vec3::new(1.0, 2.0, 3.0)))
            .children(children)
    }

    fn decode(chunk: ChunkBuilder) -> DecodeResult<CollisionObject> {
        let tree = ChunkTree::parse(ChunkBuilder::new(ChunkType::ROOT).child(chunk).to_bytes()).unwrap();
        let result = decode_collision_object(tree.root().children().next().unwrap());
        result
    }

    #[test]
    fn test_oriented_box_reads_each_vector() {
        let centre = Vec3::new(10.0, 0.0, 0.0);
        let object = decode(object(vec![volume(
            obbox(vec![vector(centre), vector(Vec3::Y), vector(Vec3::Z), vector(Vec3::X)]),
            vec![],
        )]))
        .unwrap();

        assert_eq!(object.material, "metal");
        let shape = object.volumes[0].shape.unwrap();
        assert_eq!(
            shape,
            CollisionShape::OrientedBox {
                centre,
                axes: [Vec3::Y, Vec3::Z, Vec3::X],
                half_extents: Vec3::new(1.0, 2.0, 3.0),
            }
        );

        let corners = shape.box_corners();
        assert_eq!(corners.len(), 8);
        assert_eq!(corners[0], Vec3::new(7.0, -1.0, -2.0));
    }

    #[test]
    fn test_oriented_box_needs_four_vectors() {
        let err = decode(object(vec![volume(obbox(vec![vector(Vec3::ZERO)]), vec![])])).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::CountMismatch {
                expected: 4,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_nested_volumes() {
        let sphere = ChunkBuilder::new(ChunkType::COLLISION_SPHERE)
            .payload(PayloadWriter::new().f32(0.5))
            .child(vector(Vec3::Z));
        let inner = volume(sphere.clone(), vec![]);
        let object = decode(object(vec![volume(sphere, vec![inner])])).unwrap();

        let shapes = object.volumes[0].shapes();
        assert_eq!(shapes.len(), 2);
        assert_eq!(
            shapes[1],
            CollisionShape::Sphere {
                centre: Vec3::Z,
                radius: 0.5
            }
        );
    }
}
