//! Chunk type tags.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A 32-bit chunk type tag.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(transparent)]
pub struct ChunkType(pub u32);

macro_rules! chunk_types {
    ($($(#[$doc:meta])* $name:ident = $value:expr, $label:expr;)*) => {
        impl ChunkType {
            $(
                $(#[$doc])*
                pub const $name: Self = Self($value);
            )*

            /// Human-readable name of a known type.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$name => Some($label),)*
                    _ => None,
                }
            }
        }
    };
}

chunk_types! {
    /// Root signature chunk (`P3D\xFF`).
    ROOT = 0xFF44_3350, "P3D";

    MESH = 0x0001_0000, "Mesh";
    SKIN = 0x0001_0001, "Skin";
    PRIM_GROUP = 0x0001_0002, "PrimGroup";
    BOUNDING_BOX = 0x0001_0003, "BoundingBox";
    BOUNDING_SPHERE = 0x0001_0004, "BoundingSphere";
    POSITION_LIST = 0x0001_0005, "PositionList";
    NORMAL_LIST = 0x0001_0006, "NormalList";
    UV_LIST = 0x0001_0007, "UVList";
    COLOUR_LIST = 0x0001_0008, "ColourList";
    INDEX_LIST = 0x0001_000A, "IndexList";
    MATRIX_LIST = 0x0001_000B, "MatrixList";
    WEIGHT_LIST = 0x0001_000C, "WeightList";

    SHADER = 0x0001_1000, "Shader";
    SHADER_TEXTURE_PARAM = 0x0001_1002, "ShaderTextureParam";
    SHADER_INT_PARAM = 0x0001_1003, "ShaderIntParam";
    SHADER_FLOAT_PARAM = 0x0001_1004, "ShaderFloatParam";
    SHADER_COLOUR_PARAM = 0x0001_1005, "ShaderColourParam";

    TEXTURE = 0x0001_9000, "Texture";
    IMAGE = 0x0001_9001, "Image";
    IMAGE_DATA = 0x0001_9002, "ImageData";
    SPRITE = 0x0001_9005, "Sprite";

    TEXTURE_FONT = 0x0002_2000, "TextureFont";
    FONT_GLYPHS = 0x0002_2001, "FontGlyphs";

    SKELETON = 0x0000_4500, "Skeleton";
    SKELETON_JOINT = 0x0000_4501, "SkeletonJoint";
    COMPOSITE_DRAWABLE = 0x0000_4512, "CompositeDrawable";
    COMPOSITE_DRAWABLE_PROP_LIST = 0x0000_4514, "CompositeDrawablePropList";
    COMPOSITE_DRAWABLE_PROP = 0x0000_4515, "CompositeDrawableProp";

    ANIMATION = 0x0012_1000, "Animation";
    ANIMATION_GROUP = 0x0012_1001, "AnimationGroup";
    ANIMATION_GROUP_LIST = 0x0012_1002, "AnimationGroupList";
    VECTOR2_CHANNEL = 0x0012_1103, "Vector2Channel";
    VECTOR3_CHANNEL = 0x0012_1104, "Vector3Channel";
    QUATERNION_CHANNEL = 0x0012_1105, "QuaternionChannel";
    COMPRESSED_QUATERNION_CHANNEL = 0x0012_1111, "CompressedQuaternionChannel";

    COLLISION_OBJECT = 0x0701_0000, "CollisionObject";
    COLLISION_VOLUME = 0x0701_0001, "CollisionVolume";
    COLLISION_SPHERE = 0x0701_0002, "CollisionSphere";
    COLLISION_CYLINDER = 0x0701_0003, "CollisionCylinder";
    COLLISION_OBBOX = 0x0701_0004, "CollisionOrientedBoundingBox";
    COLLISION_VECTOR = 0x0701_0007, "CollisionVector";
}

impl From<u32> for ChunkType {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08X})", self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_signature_bytes() {
        assert_eq!(ChunkType::ROOT.0.to_le_bytes(), *b"P3D\xFF");
    }

    #[test]
    fn test_display() {
        assert_eq!(ChunkType::SKELETON.to_string(), "Skeleton (0x00004500)");
        assert_eq!(ChunkType(0x1234).to_string(), "0x00001234");
    }
}
