//! Typed decoders for individual chunk types.
//!
//! Each decoder takes a [`ChunkRef`] and reads its payload and children into
//! an owned value. Decoders never touch state outside the chunk subtree
//! they are handed.

pub mod animation;
pub mod collision;
pub mod composite;
pub mod font;
pub mod mesh;
pub mod shader;
pub mod skeleton;
pub mod texture;

pub use animation::{Animation, AnimationGroup, Channel, ChannelValues};
pub use collision::{CollisionObject, CollisionShape, CollisionVolume};
pub use composite::{CompositeDrawable, CompositeModel, DrawableProp, PropRef};
pub use font::{Font, Glyph};
pub use mesh::{BoundingBox, BoundingSphere, FlatMesh, Mesh, PrimGroup, PrimitiveType};
pub use shader::{FilterMode, Shader, ShaderParam, ShaderParamValue, UvMode};
pub use skeleton::{Joint, Skeleton};
pub use texture::{Image, ImageFormat, Sprite, Texture};

use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult};

/// Fail unless `chunk` has the expected type.
pub(crate) fn expect_type(chunk: ChunkRef<'_>, expected: ChunkType) -> DecodeResult<()> {
    let found = chunk.chunk_type();
    if found != expected {
        return Err(DecodeError::UnexpectedChunk { expected, found });
    }
    Ok(())
}

/// First child of the given type, or [`DecodeError::MissingChild`].
pub(crate) fn required_child(chunk: ChunkRef<'_>, child: ChunkType) -> DecodeResult<ChunkRef<'_>> {
    chunk
        .first_child_of_type(child)
        .ok_or(DecodeError::MissingChild {
            parent: chunk.chunk_type(),
            child,
        })
}

/// Fail unless a declared count matches the actual one.
pub(crate) fn check_count(what: &'static str, expected: usize, actual: usize) -> DecodeResult<()> {
    if expected != actual {
        return Err(DecodeError::CountMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
