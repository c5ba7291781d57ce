//! Name-keyed ownership of decoded resources.
//!
//! [`ResourceStore`] owns textures, shaders and fonts behind `Arc`s and hands
//! out either strong references or [`ResourceRef`] weak handles. Texture
//! lookups fall back to a placeholder instead of failing.

mod handle;
mod store;

pub use handle::ResourceRef;
pub use store::{ResourceStore, FALLBACK_TEXTURE_NAME};
