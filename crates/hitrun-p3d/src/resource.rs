//! The sum of everything a registered decoder can produce.

use crate::decode::{
    Animation, CollisionObject, CompositeDrawable, Font, Mesh, Shader, Skeleton, Sprite, Texture,
};

/// A decoded chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Texture(Texture),
    Sprite(Sprite),
    Font(Font),
    Shader(Shader),
    /// A mesh or a skin; skins carry a skeleton name.
    Mesh(Mesh),
    Skeleton(Skeleton),
    Animation(Animation),
    CollisionObject(CollisionObject),
    CompositeDrawable(CompositeDrawable),
}

impl Resource {
    pub fn name(&self) -> &str {
        match self {
            Self::Texture(r) => &r.name,
            Self::Sprite(r) => &r.name,
            Self::Font(r) => &r.name,
            Self::Shader(r) => &r.name,
            Self::Mesh(r) => &r.name,
            Self::Skeleton(r) => &r.name,
            Self::Animation(r) => &r.name,
            Self::CollisionObject(r) => &r.name,
            Self::CompositeDrawable(r) => &r.name,
        }
    }

    /// Short lowercase label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Texture(_) => "texture",
            Self::Sprite(_) => "sprite",
            Self::Font(_) => "font",
            Self::Shader(_) => "shader",
            Self::Mesh(m) if m.skeleton.is_some() => "skin",
            Self::Mesh(_) => "mesh",
            Self::Skeleton(_) => "skeleton",
            Self::Animation(_) => "animation",
            Self::CollisionObject(_) => "collision",
            Self::CompositeDrawable(_) => "composite",
        }
    }
}
