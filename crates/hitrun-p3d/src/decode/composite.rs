//! Composite drawables and model assembly.
//!
//! A composite drawable names a skeleton and a list of props; each prop names
//! a mesh and the joint it hangs from. [`CompositeModel`] resolves those names
//! against the meshes and skeletons decoded alongside it.

use hitrun_common::math::Mat4;
use rustc_hash::FxHashMap;

use super::expect_type;
use super::mesh::{decode_mesh, Mesh};
use super::shader::{decode_shader, Shader};
use super::skeleton::{decode_skeleton, Skeleton};
use super::texture::{decode_texture, Texture};
use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult, Resource};

/// A prop entry as stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct PropRef {
    /// Name of the mesh this prop draws.
    pub name: String,
    pub translucent: bool,
    /// Joint index in the drawable's skeleton.
    pub joint: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeDrawable {
    pub name: String,
    pub skeleton: String,
    pub props: Vec<PropRef>,
}

pub fn decode_composite_drawable(chunk: ChunkRef<'_>) -> DecodeResult<CompositeDrawable> {
    expect_type(chunk, ChunkType::COMPOSITE_DRAWABLE)?;
    let mut cursor = chunk.cursor();
    let name = cursor.read_lp_string()?;
    let skeleton = cursor.read_lp_string()?;

    let mut props = Vec::new();
    if let Some(list) = chunk.first_child_of_type(ChunkType::COMPOSITE_DRAWABLE_PROP_LIST) {
        let declared = list.cursor().read_u32()? as usize;
        for prop in list.children_of_type(ChunkType::COMPOSITE_DRAWABLE_PROP) {
            let mut cursor = prop.cursor();
            props.push(PropRef {
                name: cursor.read_lp_string()?,
                translucent: cursor.read_bool32()?,
                joint: cursor.read_u32()?,
            });
        }
        super::check_count("drawable props", declared, props.len())?;
    }

    Ok(CompositeDrawable {
        name,
        skeleton,
        props,
    })
}

/// A prop placed in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableProp {
    /// Index into [`CompositeModel::meshes`].
    pub mesh_index: usize,
    pub transform: Mat4,
}

/// Meshes, skeletons and materials of one model, with every prop resolved to
/// a mesh and a model-space transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeModel {
    pub meshes: Vec<Mesh>,
    pub skeletons: Vec<Skeleton>,
    pub shaders: Vec<Shader>,
    pub textures: Vec<Texture>,
    pub props: Vec<DrawableProp>,
}

impl CompositeModel {
    /// Decode the composite-related children of `parent` and assemble them.
    ///
    /// A child that fails to decode is logged and left out; only assembly
    /// itself can fail.
    pub fn from_chunk(parent: ChunkRef<'_>) -> DecodeResult<Self> {
        let mut resources = Vec::new();
        for child in parent.children() {
            let decoded = match child.chunk_type() {
                ChunkType::COMPOSITE_DRAWABLE => decode_composite_drawable(child).map(Resource::CompositeDrawable),
                ChunkType::SKELETON => decode_skeleton(child).map(Resource::Skeleton),
                ChunkType::MESH | ChunkType::SKIN => decode_mesh(child).map(Resource::Mesh),
                ChunkType::SHADER => decode_shader(child).map(Resource::Shader),
                ChunkType::TEXTURE => decode_texture(child).map(Resource::Texture),
                _ => continue,
            };
            match decoded {
                Ok(resource) => resources.push(resource),
                Err(error) => tracing::warn!(
                    chunk_type = %child.chunk_type(),
                    offset = child.offset(),
                    %error,
                    "skipping undecodable composite child"
                ),
            }
        }
        Self::assemble(&resources)
    }

    /// Assemble from already-decoded resources.
    ///
    /// Props naming a mesh that is not present are skipped. A drawable whose
    /// skeleton is missing, or a prop whose joint is past the end of it, fails.
    pub fn assemble(resources: &[Resource]) -> DecodeResult<Self> {
        let mut model = CompositeModel::default();
        let mut drawables = Vec::new();

        for resource in resources {
            match resource {
                Resource::Mesh(mesh) => model.meshes.push(mesh.clone()),
                Resource::Skeleton(skeleton) => model.skeletons.push(skeleton.clone()),
                Resource::Shader(shader) => model.shaders.push(shader.clone()),
                Resource::Texture(texture) => model.textures.push(texture.clone()),
                Resource::CompositeDrawable(drawable) => drawables.push(drawable),
                _ => {}
            }
        }

        let mesh_names: FxHashMap<&str, usize> = model
            .meshes
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.as_str(), i))
            .collect();
        let joint_transforms: FxHashMap<&str, Vec<Mat4>> = model
            .skeletons
            .iter()
            .map(|s| (s.name.as_str(), s.world_transforms()))
            .collect();

        let mut props = Vec::new();
        for drawable in drawables {
            if drawable.props.is_empty() {
                continue;
            }
            let transforms = joint_transforms.get(drawable.skeleton.as_str()).ok_or_else(|| {
                DecodeError::MissingReference {
                    kind: "skeleton",
                    name: drawable.skeleton.clone(),
                }
            })?;

            for prop in &drawable.props {
                let Some(&mesh_index) = mesh_names.get(prop.name.as_str()) else {
                    tracing::debug!(prop = %prop.name, "prop has no matching mesh");
                    continue;
                };
                let transform = *transforms.get(prop.joint as usize).ok_or_else(|| {
                    DecodeError::JointOutOfRange {
                        skeleton: drawable.skeleton.clone(),
                        joint: prop.joint,
                        count: transforms.len(),
                    }
                })?;
                props.push(DrawableProp {
                    mesh_index,
                    transform,
                });
            }
        }

        model.props = props;
        Ok(model)
    }

    pub fn mesh(&self, prop: &DrawableProp) -> Option<&Mesh> {
        self.meshes.get(prop.mesh_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::mesh::tests::{mesh_chunk, prim_group_chunk};
    use crate::decode::skeleton::tests::{joint_chunk, skeleton_chunk};
    use crate::{ChunkBuilder, ChunkTree, PayloadWriter};
    use hitrun_common::math::Vec3;

    fn drawable(skeleton: &str, props: &[(&str, u32)]) -> ChunkBuilder {
        let list = props.iter().fold(
            ChunkBuilder::new(ChunkType::COMPOSITE_DRAWABLE_PROP_LIST)
                .payload(PayloadWriter::new().u32(props.len() as u32)),
            |list, &(name, joint)| {
                list.child(
                    ChunkBuilder::new(ChunkType::COMPOSITE_DRAWABLE_PROP)
                        .payload(PayloadWriter::new().lp_string(name).u32(0).u32(joint)),
                )
            },
        );
        ChunkBuilder::new(ChunkType::COMPOSITE_DRAWABLE)
            .payload(PayloadWriter::new().lp_string("car").lp_string(skeleton))
            .child(list)
    }

    fn model(children: Vec<ChunkBuilder>) -> DecodeResult<CompositeModel> {
        let tree = ChunkTree::parse(ChunkBuilder::new(ChunkType::ROOT).children(children).to_bytes()).unwrap();
        let result = CompositeModel::from_chunk(tree.root());
        result
    }

    fn tri(name: &str) -> ChunkBuilder {
        mesh_chunk(name, vec![prim_group_chunk(&[Vec3::ZERO, Vec3::X, Vec3::Y], &[0, 1, 2])])
    }

    fn skeleton() -> ChunkBuilder {
        skeleton_chunk(
            "car_skel",
            vec![
                joint_chunk("root", 0, Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))),
                joint_chunk("wheel", 0, Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))),
            ],
        )
    }

    #[test]
    fn test_props_resolve_to_joint_transforms() {
        let model = model(vec![
            tri("body"),
            tri("wheel"),
            skeleton(),
            drawable("car_skel", &[("body", 0), ("wheel", 1), ("antenna", 1)]),
        ])
        .unwrap();

        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.props.len(), 2);
        assert_eq!(model.props[0].mesh_index, 0);
        assert_eq!(model.props[0].transform.translation(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(model.mesh(&model.props[1]).unwrap().name, "wheel");
        assert_eq!(model.props[1].transform.translation(), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_broken_sibling_is_skipped() {
        let broken_texture =
            ChunkBuilder::new(ChunkType::TEXTURE).payload(PayloadWriter::new().lp_string("t").bytes(&[0; 36]));
        let model = model(vec![
            broken_texture,
            tri("body"),
            skeleton(),
            drawable("car_skel", &[("body", 1)]),
        ])
        .unwrap();

        assert!(model.textures.is_empty());
        assert_eq!(model.props.len(), 1);
        assert_eq!(model.props[0].transform.translation(), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_missing_skeleton() {
        let err = model(vec![tri("body"), drawable("nope", &[("body", 0)])]).unwrap_err();
        assert!(matches!(err, DecodeError::MissingReference { kind: "skeleton", .. }));
    }

    #[test]
    fn test_joint_out_of_range() {
        let err = model(vec![tri("body"), skeleton(), drawable("car_skel", &[("body", 5)])]).unwrap_err();
        assert!(matches!(err, DecodeError::JointOutOfRange { joint: 5, count: 2, .. }));
    }
}
