//! The name-keyed resource store.

use std::sync::Arc;

use hitrun_p3d::decode::{Font, Image, Shader, Sprite, Texture};
use hitrun_p3d::DecodeResult;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ResourceRef;

/// Name of the texture returned for missing lookups.
pub const FALLBACK_TEXTURE_NAME: &str = "error";

/// One kind of resource, keyed by name.
#[derive(Debug)]
struct Shelf<T> {
    items: RwLock<FxHashMap<String, Arc<T>>>,
}

impl<T> Shelf<T> {
    fn new() -> Self {
        Self {
            items: RwLock::new(FxHashMap::default()),
        }
    }

    fn add(&self, kind: &'static str, name: String, item: Arc<T>) -> Option<Arc<T>> {
        let previous = self.items.write().insert(name, item);
        if previous.is_some() {
            tracing::debug!(kind, "replaced existing resource");
        }
        previous
    }

    fn get(&self, name: &str) -> Option<Arc<T>> {
        self.items.read().get(name).cloned()
    }

    fn weak(&self, name: &str) -> ResourceRef<T> {
        self.items
            .read()
            .get(name)
            .map(ResourceRef::new)
            .unwrap_or_default()
    }

    fn remove(&self, name: &str) -> Option<Arc<T>> {
        self.items.write().remove(name)
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.items.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn clear(&self) {
        self.items.write().clear();
    }
}

/// Shared owner of decoded textures, shaders and fonts.
///
/// Adding under an existing name replaces the old value. Texture lookups
/// never miss: an unknown name yields a 2x2 magenta and black checker.
/// The store is `Send + Sync`; writes take a per-kind lock.
///
/// # Example
///
/// ```
/// use hitrun_resource::ResourceStore;
///
/// let store = ResourceStore::new();
/// let texture = store.texture("missing.bmp");
/// assert_eq!(texture.name, "error");
/// assert!(!store.texture_weak("missing.bmp").is_resolvable());
/// ```
#[derive(Debug)]
pub struct ResourceStore {
    textures: Shelf<Texture>,
    shaders: Shelf<Shader>,
    fonts: Shelf<Font>,
    fallback: Arc<Texture>,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore {
    pub fn new() -> Self {
        Self {
            textures: Shelf::new(),
            shaders: Shelf::new(),
            fonts: Shelf::new(),
            fallback: Arc::new(fallback_texture()),
        }
    }

    /// The texture handed out for missing names.
    pub fn fallback_texture(&self) -> Arc<Texture> {
        Arc::clone(&self.fallback)
    }

    /// Store a texture, returning the one it replaced.
    pub fn add_texture(&self, name: impl Into<String>, texture: impl Into<Arc<Texture>>) -> Option<Arc<Texture>> {
        self.textures.add("texture", name.into(), texture.into())
    }

    /// Store a sprite as a single texture under the sprite's name.
    ///
    /// Fails, leaving the store untouched, when the frames cannot be
    /// stitched to the sprite's native size.
    pub fn add_sprite(&self, sprite: &Sprite) -> DecodeResult<Option<Arc<Texture>>> {
        let texture = Texture::from_image(sprite.name.clone(), sprite.stitch()?);
        Ok(self.add_texture(sprite.name.clone(), texture))
    }

    /// Look up a texture, falling back to the error texture.
    pub fn texture(&self, name: &str) -> Arc<Texture> {
        self.try_texture(name).unwrap_or_else(|| {
            tracing::debug!(name, "texture not found, using fallback");
            self.fallback_texture()
        })
    }

    /// Look up a texture without the fallback.
    pub fn try_texture(&self, name: &str) -> Option<Arc<Texture>> {
        self.textures.get(name)
    }

    pub fn texture_weak(&self, name: &str) -> ResourceRef<Texture> {
        self.textures.weak(name)
    }

    pub fn remove_texture(&self, name: &str) -> Option<Arc<Texture>> {
        self.textures.remove(name)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Texture names, sorted.
    pub fn texture_names(&self) -> Vec<String> {
        self.textures.names()
    }

    pub fn add_shader(&self, name: impl Into<String>, shader: impl Into<Arc<Shader>>) -> Option<Arc<Shader>> {
        self.shaders.add("shader", name.into(), shader.into())
    }

    pub fn shader(&self, name: &str) -> Option<Arc<Shader>> {
        self.shaders.get(name)
    }

    pub fn shader_weak(&self, name: &str) -> ResourceRef<Shader> {
        self.shaders.weak(name)
    }

    pub fn remove_shader(&self, name: &str) -> Option<Arc<Shader>> {
        self.shaders.remove(name)
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn shader_names(&self) -> Vec<String> {
        self.shaders.names()
    }

    /// The diffuse texture a shader names, looked up now.
    ///
    /// A shader without a texture, or naming one that is not stored, gets
    /// the fallback.
    pub fn shader_texture(&self, shader: &Shader) -> Arc<Texture> {
        match &shader.texture {
            Some(name) => self.texture(name),
            None => self.fallback_texture(),
        }
    }

    pub fn add_font(&self, name: impl Into<String>, font: impl Into<Arc<Font>>) -> Option<Arc<Font>> {
        self.fonts.add("font", name.into(), font.into())
    }

    pub fn font(&self, name: &str) -> Option<Arc<Font>> {
        self.fonts.get(name)
    }

    pub fn font_weak(&self, name: &str) -> ResourceRef<Font> {
        self.fonts.weak(name)
    }

    pub fn remove_font(&self, name: &str) -> Option<Arc<Font>> {
        self.fonts.remove(name)
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn font_names(&self) -> Vec<String> {
        self.fonts.names()
    }

    /// Total number of stored resources, not counting the fallback.
    pub fn len(&self) -> usize {
        self.texture_count() + self.shader_count() + self.font_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored resource. Outstanding `Arc`s stay valid.
    pub fn clear(&self) {
        self.textures.clear();
        self.shaders.clear();
        self.fonts.clear();
    }
}

/// 2x2 RGBA checker: magenta, black / black, magenta.
fn fallback_texture() -> Texture {
    const MAGENTA: [u8; 4] = [0xFF, 0x00, 0xFF, 0xFF];
    const BLACK: [u8; 4] = [0x00, 0x00, 0x00, 0xFF];
    let pixels = [MAGENTA, BLACK, BLACK, MAGENTA].concat();
    Texture::from_image(
        FALLBACK_TEXTURE_NAME,
        Image::from_rgba(FALLBACK_TEXTURE_NAME, 2, 2, pixels),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitrun_p3d::decode::UvMode;

    fn texture(name: &str) -> Texture {
        Texture::from_image(name, Image::from_rgba(name, 1, 1, vec![1, 2, 3, 4]))
    }

    fn shader(name: &str, texture: Option<&str>) -> Shader {
        Shader {
            name: name.to_string(),
            version: 0,
            pddi_shader: "simple".to_string(),
            translucent: false,
            vertex_needs: 0,
            vertex_mask: 0,
            params: Vec::new(),
            texture: texture.map(str::to_string),
            filter: None,
            uv_mode: UvMode::Repeat,
            two_sided: false,
            alpha_test: false,
        }
    }

    #[test]
    fn test_missing_texture_falls_back() {
        let store = ResourceStore::new();
        let texture = store.texture("nonexistent-texture");
        assert_eq!(texture.name, FALLBACK_TEXTURE_NAME);
        assert_eq!((texture.width(), texture.height(), texture.channels()), (2, 2, 4));
        assert_eq!(&texture.pixels()[..8], &[0xFF, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0xFF]);
        assert!(store.try_texture("nonexistent-texture").is_none());
    }

    #[test]
    fn test_missing_weak_is_unresolved() {
        let store = ResourceStore::new();
        assert!(!store.texture_weak("nonexistent").is_resolvable());
        assert!(store.shader_weak("nonexistent").resolve().is_none());
        assert!(store.font_weak("nonexistent").resolve().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let store = ResourceStore::new();
        assert!(store.add_texture("car.bmp", texture("first")).is_none());
        let weak = store.texture_weak("car.bmp");

        let replaced = store.add_texture("car.bmp", texture("second")).unwrap();
        assert_eq!(replaced.name, "first");
        drop(replaced);

        assert_eq!(store.texture("car.bmp").name, "second");
        assert!(!weak.is_resolvable());
        assert_eq!(store.texture_count(), 1);
    }

    #[test]
    fn test_removal_keeps_outstanding_owners() {
        let store = ResourceStore::new();
        store.add_texture("a", texture("a"));
        let strong = store.texture("a");
        let weak = store.texture_weak("a");

        store.remove_texture("a");
        assert!(weak.is_resolvable());
        drop(strong);
        assert!(!weak.is_resolvable());
    }

    #[test]
    fn test_shader_texture_resolves_at_use() {
        let store = ResourceStore::new();
        let body = shader("body_m", Some("body.bmp"));
        assert_eq!(store.shader_texture(&body).name, FALLBACK_TEXTURE_NAME);

        store.add_texture("body.bmp", texture("body.bmp"));
        assert_eq!(store.shader_texture(&body).name, "body.bmp");
        assert_eq!(store.shader_texture(&shader("plain", None)).name, FALLBACK_TEXTURE_NAME);
    }

    #[test]
    fn test_sprite_registers_as_texture() {
        let store = ResourceStore::new();
        let sprite = Sprite {
            name: "hud_icon".to_string(),
            native_width: 2,
            native_height: 1,
            shader: "hud_m".to_string(),
            image_width: 1,
            image_height: 1,
            blit_border: 0,
            frames: vec![
                Image::from_rgba("a", 1, 1, vec![1, 1, 1, 1]),
                Image::from_rgba("b", 1, 1, vec![2, 2, 2, 2]),
            ],
        };
        store.add_sprite(&sprite).unwrap();

        let texture = store.texture("hud_icon");
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.pixels(), &[1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_oversized_sprite_is_not_stored() {
        let store = ResourceStore::new();
        let sprite = Sprite {
            name: "hud_icon".to_string(),
            native_width: u32::MAX,
            native_height: u32::MAX,
            shader: "hud_m".to_string(),
            image_width: 1,
            image_height: 1,
            blit_border: 0,
            frames: vec![Image::from_rgba("a", 1, 1, vec![1, 1, 1, 1])],
        };
        assert!(store.add_sprite(&sprite).is_err());
        assert!(store.try_texture("hud_icon").is_none());
    }

    #[test]
    fn test_concurrent_access() {
        let store = ResourceStore::new();
        std::thread::scope(|s| {
            for t in 0..4 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..50 {
                        store.add_texture(format!("t{t}_{i}"), texture("x"));
                        let _ = store.texture(&format!("t{t}_{}", i / 2));
                    }
                });
            }
        });
        assert_eq!(store.texture_count(), 200);
        assert_eq!(store.texture_names()[0], "t0_0");
    }
}
