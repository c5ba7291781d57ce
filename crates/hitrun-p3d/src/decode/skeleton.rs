//! Skeleton decoding.

use hitrun_common::math::Mat4;

use super::{check_count, expect_type};
use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint; `None` for a root.
    pub parent: Option<usize>,
    pub dof: i32,
    pub free_axis: i32,
    pub primary_axis: i32,
    pub secondary_axis: i32,
    pub twist_axis: i32,
    /// Transform relative to the parent joint.
    pub rest_pose: Mat4,
}

/// A joint hierarchy. Parents always precede their children.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub name: String,
    pub version: u32,
    pub joints: Vec<Joint>,
}

impl Skeleton {
    /// Parent value that marks a root joint.
    pub const NO_PARENT: u32 = u32::MAX;

    /// Find a joint index by name.
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Model-space transform of every joint.
    ///
    /// Resolved in order, so each parent is final before its children are
    /// visited; a root joint's transform is its own rest pose.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut transforms: Vec<Mat4> = Vec::with_capacity(self.joints.len());
        for joint in &self.joints {
            let parent = match joint.parent {
                Some(index) => transforms[index],
                None => Mat4::IDENTITY,
            };
            transforms.push(parent * joint.rest_pose);
        }
        transforms
    }
}

/// Map the on-disk parent field to a parent index.
///
/// Joint 0 may name itself (parent 0) as a root, any joint may use
/// [`Skeleton::NO_PARENT`]; every other parent must come earlier.
fn resolve_parent(joint: usize, parent: u32) -> DecodeResult<Option<usize>> {
    if parent == Skeleton::NO_PARENT || (joint == 0 && parent == 0) {
        return Ok(None);
    }
    if (parent as usize) < joint {
        return Ok(Some(parent as usize));
    }
    Err(DecodeError::InvalidParent { joint, parent })
}

pub fn decode_skeleton(chunk: ChunkRef<'_>) -> DecodeResult<Skeleton> {
    expect_type(chunk, ChunkType::SKELETON)?;
    let mut cursor = chunk.cursor();

    let name = cursor.read_lp_string()?;
    let version = cursor.read_u32()?;
    let joint_count = cursor.read_u32()? as usize;

    let mut joints = Vec::with_capacity(joint_count.min(chunk.child_count()));
    for (index, child) in chunk.children_of_type(ChunkType::SKELETON_JOINT).enumerate() {
        let mut cursor = child.cursor();
        let name = cursor.read_lp_string()?;
        let parent = resolve_parent(index, cursor.read_u32()?)?;
        joints.push(Joint {
            name,
            parent,
            dof: cursor.read_i32()?,
            free_axis: cursor.read_i32()?,
            primary_axis: cursor.read_i32()?,
            secondary_axis: cursor.read_i32()?,
            twist_axis: cursor.read_i32()?,
            rest_pose: cursor.read_mat4()?,
        });
    }

    check_count("skeleton joints", joint_count, joints.len())?;
    Ok(Skeleton {
        name,
        version,
        joints,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{ChunkBuilder, ChunkTree, PayloadWriter};
    use hitrun_common::math::Vec3;

    pub(crate) fn joint_chunk(name: &str, parent: u32, rest_pose: Mat4) -> ChunkBuilder {
        let payload = PayloadWriter::new()
            .lp_string(name)
            .u32(parent)
            .i32(0)
            .i32(0)
            .i32(0)
            .i32(0)
            .i32(0)
            .mat4(&rest_pose);
        ChunkBuilder::new(ChunkType::SKELETON_JOINT).payload(payload)
    }

    pub(crate) fn skeleton_chunk(name: &str, joints: Vec<ChunkBuilder>) -> ChunkBuilder {
        let payload = PayloadWriter::new()
            .lp_string(name)
            .u32(0)
            .u32(joints.len() as u32);
        ChunkBuilder::new(ChunkType::SKELETON).payload(payload).children(joints)
    }

    fn decode(chunk: ChunkBuilder) -> DecodeResult<Skeleton> {
        let tree = ChunkTree::parse(ChunkBuilder::new(ChunkType::ROOT).child(chunk).to_bytes()).unwrap();
        let result = decode_skeleton(tree.root().children().next().unwrap());
        result
    }

    fn offset(x: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_single_root_with_sentinel() {
        let skeleton = decode(skeleton_chunk(
            "s",
            vec![joint_chunk("root", Skeleton::NO_PARENT, Mat4::IDENTITY)],
        ))
        .unwrap();
        assert_eq!(skeleton.joints.len(), 1);
        assert_eq!(skeleton.joints[0].parent, None);
    }

    #[test]
    fn test_root_naming_itself() {
        let skeleton = decode(skeleton_chunk("s", vec![joint_chunk("root", 0, Mat4::IDENTITY)])).unwrap();
        assert_eq!(skeleton.joints[0].parent, None);
    }

    #[test]
    fn test_forward_parent_rejected() {
        let err = decode(skeleton_chunk(
            "s",
            vec![
                joint_chunk("root", 0, Mat4::IDENTITY),
                joint_chunk("a", 1, Mat4::IDENTITY),
            ],
        ))
        .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidParent { joint: 1, parent: 1 }));

        let err = decode(skeleton_chunk(
            "s",
            vec![
                joint_chunk("root", 0, Mat4::IDENTITY),
                joint_chunk("a", 2, Mat4::IDENTITY),
                joint_chunk("b", 0, Mat4::IDENTITY),
            ],
        ))
        .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidParent { joint: 1, parent: 2 }));
    }

    #[test]
    fn test_world_transforms_chain() {
        let skeleton = decode(skeleton_chunk(
            "s",
            vec![
                joint_chunk("root", 0, offset(1.0)),
                joint_chunk("spine", 0, offset(2.0)),
                joint_chunk("head", 1, offset(4.0)),
            ],
        ))
        .unwrap();

        let world = skeleton.world_transforms();
        assert_eq!(world[0].translation(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(world[1].translation(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(world[2].translation(), Vec3::new(7.0, 0.0, 0.0));
        assert_eq!(skeleton.joint_index("head"), Some(2));
    }

    #[test]
    fn test_huge_joint_count_is_a_mismatch() {
        let chunk = ChunkBuilder::new(ChunkType::SKELETON)
            .payload(PayloadWriter::new().lp_string("s").u32(0).u32(u32::MAX));
        let err = decode(chunk).unwrap_err();
        assert!(matches!(err, DecodeError::CountMismatch { actual: 0, .. }));
    }
}
