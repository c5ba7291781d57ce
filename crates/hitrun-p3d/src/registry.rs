//! Dispatch from chunk type to decoder.

use rustc_hash::FxHashMap;

use crate::decode::{
    animation, collision, composite, font, mesh, shader, skeleton, texture,
};
use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult, Resource};

/// A decoder for one chunk type.
pub type DecodeFn = fn(ChunkRef<'_>) -> DecodeResult<Resource>;

/// A chunk that failed to decode. Its siblings are unaffected.
#[derive(Debug)]
pub struct DecodeWarning {
    pub chunk_type: ChunkType,
    pub offset: usize,
    pub error: DecodeError,
}

/// Outcome of decoding the children of one chunk.
#[derive(Debug, Default)]
pub struct DecodeReport {
    pub resources: Vec<Resource>,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Maps chunk types to decoders.
///
/// An empty registry decodes nothing; [`DecoderRegistry::standard`] knows
/// every built-in type.
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: FxHashMap<ChunkType, DecodeFn>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(ChunkType::TEXTURE, |c| texture::decode_texture(c).map(Resource::Texture));
        registry.register(ChunkType::SPRITE, |c| texture::decode_sprite(c).map(Resource::Sprite));
        registry.register(ChunkType::TEXTURE_FONT, |c| font::decode_font(c).map(Resource::Font));
        registry.register(ChunkType::SHADER, |c| shader::decode_shader(c).map(Resource::Shader));
        registry.register(ChunkType::MESH, |c| mesh::decode_mesh(c).map(Resource::Mesh));
        registry.register(ChunkType::SKIN, |c| mesh::decode_skin(c).map(Resource::Mesh));
        registry.register(ChunkType::SKELETON, |c| {
            skeleton::decode_skeleton(c).map(Resource::Skeleton)
        });
        registry.register(ChunkType::COMPOSITE_DRAWABLE, |c| {
            composite::decode_composite_drawable(c).map(Resource::CompositeDrawable)
        });
        registry.register(ChunkType::ANIMATION, |c| {
            animation::decode_animation(c).map(Resource::Animation)
        });
        registry.register(ChunkType::COLLISION_OBJECT, |c| {
            collision::decode_collision_object(c).map(Resource::CollisionObject)
        });
        registry
    }

    /// Register a decoder, returning the one it replaces.
    pub fn register(&mut self, chunk_type: ChunkType, decoder: DecodeFn) -> Option<DecodeFn> {
        self.decoders.insert(chunk_type, decoder)
    }

    pub fn unregister(&mut self, chunk_type: ChunkType) -> Option<DecodeFn> {
        self.decoders.remove(&chunk_type)
    }

    pub fn is_registered(&self, chunk_type: ChunkType) -> bool {
        self.decoders.contains_key(&chunk_type)
    }

    /// Registered types, in no particular order.
    pub fn chunk_types(&self) -> impl Iterator<Item = ChunkType> + '_ {
        self.decoders.keys().copied()
    }

    /// Decode one chunk. `None` when its type has no decoder.
    pub fn decode(&self, chunk: ChunkRef<'_>) -> Option<DecodeResult<Resource>> {
        self.decoders.get(&chunk.chunk_type()).map(|decode| decode(chunk))
    }

    /// Decode every registered child of `parent`, in file order.
    pub fn decode_children(&self, parent: ChunkRef<'_>) -> DecodeReport {
        let mut report = DecodeReport::default();

        for child in parent.children() {
            let Some(result) = self.decode(child) else {
                tracing::debug!(chunk = %child.chunk_type(), offset = child.offset(), "no decoder, skipping");
                continue;
            };
            match result {
                Ok(resource) => {
                    tracing::debug!(kind = resource.kind(), name = resource.name(), "decoded");
                    report.resources.push(resource);
                }
                Err(error) => {
                    tracing::warn!(
                        chunk = %child.chunk_type(),
                        offset = child.offset(),
                        %error,
                        "failed to decode chunk"
                    );
                    report.warnings.push(DecodeWarning {
                        chunk_type: child.chunk_type(),
                        offset: child.offset(),
                        error,
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::shader::tests::shader_chunk;
    use crate::decode::skeleton::tests::{joint_chunk, skeleton_chunk};
    use crate::{ChunkBuilder, ChunkTree, PayloadWriter};
    use hitrun_common::math::Mat4;

    fn tree(children: Vec<ChunkBuilder>) -> ChunkTree {
        ChunkTree::parse(ChunkBuilder::new(ChunkType::ROOT).children(children).to_bytes()).unwrap()
    }

    #[test]
    fn test_failure_does_not_stop_siblings() {
        // Declares two joints but carries one.
        let broken = ChunkBuilder::new(ChunkType::SKELETON)
            .payload(PayloadWriter::new().lp_string("bad").u32(0).u32(2))
            .child(joint_chunk("root", 0, Mat4::IDENTITY));
        let tree = tree(vec![
            broken,
            ChunkBuilder::new(ChunkType(0x1234_5678)).payload(vec![1, 2, 3]),
            skeleton_chunk("good", vec![joint_chunk("root", 0, Mat4::IDENTITY)]),
            shader_chunk("body_m", "body.bmp", &[]),
        ]);

        let report = DecoderRegistry::standard().decode_children(tree.root());
        assert_eq!(report.resources.len(), 2);
        assert_eq!(report.resources[0].name(), "good");
        assert_eq!(report.resources[1].kind(), "shader");

        assert_eq!(report.warnings.len(), 1);
        let warning = &report.warnings[0];
        assert_eq!(warning.chunk_type, ChunkType::SKELETON);
        assert_eq!(warning.offset, 12);
        assert!(matches!(warning.error, DecodeError::CountMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_register_replaces() {
        fn always_fails(chunk: ChunkRef<'_>) -> DecodeResult<Resource> {
            Err(DecodeError::MissingChild {
                parent: chunk.chunk_type(),
                child: ChunkType::SKELETON_JOINT,
            })
        }

        let mut registry = DecoderRegistry::standard();
        assert!(registry.register(ChunkType::SKELETON, always_fails).is_some());

        let tree = tree(vec![skeleton_chunk("s", vec![joint_chunk("root", 0, Mat4::IDENTITY)])]);
        let report = registry.decode_children(tree.root());
        assert!(report.resources.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_registry_skips_everything() {
        let tree = tree(vec![skeleton_chunk("s", vec![joint_chunk("root", 0, Mat4::IDENTITY)])]);
        let report = DecoderRegistry::new().decode_children(tree.root());
        assert!(report.resources.is_empty());
        assert!(report.is_clean());
        assert!(DecoderRegistry::new().decode(tree.root()).is_none());
    }
}
