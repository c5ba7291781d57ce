//! Loading pipelines: container to store, archive to audio.

use std::sync::Arc;

use hitrun_p3d::decode::CompositeModel;
use hitrun_p3d::{ChunkTree, ChunkType, DecodeWarning, DecoderRegistry, Resource};
use hitrun_rcf::RcfArchive;
use hitrun_resource::ResourceStore;
use hitrun_rsd::PcmBuffer;

use crate::Result;

/// What [`load_container`] does with decoded resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Add textures and sprites to the store.
    pub register_textures: bool,
    pub register_shaders: bool,
    pub register_fonts: bool,
    /// Build a [`CompositeModel`] when the container has a composite drawable.
    pub assemble_composite: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            register_textures: true,
            register_shaders: true,
            register_fonts: true,
            assemble_composite: true,
        }
    }
}

/// Outcome of loading one container.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Every decoded resource, in file order.
    pub resources: Vec<Resource>,
    /// Chunks that failed to decode; their siblings were still loaded.
    pub warnings: Vec<DecodeWarning>,
    pub composite: Option<CompositeModel>,
    /// Number of resources added to the store.
    pub registered: usize,
    /// Bytes after the root chunk that were not parsed.
    pub trailing_bytes: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Parse a container, decode its top-level chunks and register named
/// resources in `store`.
///
/// Only a malformed container is an error. Chunks that fail to decode, and a
/// composite model that cannot be assembled, are reported as warnings.
pub fn load_container(
    bytes: impl Into<Arc<[u8]>>,
    registry: &DecoderRegistry,
    store: &ResourceStore,
    options: &LoadOptions,
) -> Result<LoadReport> {
    let tree = ChunkTree::parse(bytes)?;
    let root = tree.root();
    let decoded = registry.decode_children(root);

    let mut report = LoadReport {
        resources: decoded.resources,
        warnings: decoded.warnings,
        trailing_bytes: tree.trailing_bytes(),
        ..LoadReport::default()
    };

    let mut sprite_warnings = Vec::new();
    for resource in &report.resources {
        let added = match resource {
            Resource::Texture(t) if options.register_textures => {
                store.add_texture(t.name.clone(), t.clone());
                true
            }
            Resource::Sprite(s) if options.register_textures => match store.add_sprite(s) {
                Ok(_) => true,
                Err(error) => {
                    tracing::warn!(sprite = %s.name, %error, "failed to stitch sprite");
                    let offset = root
                        .children_of_type(ChunkType::SPRITE)
                        .find(|c| c.cursor().read_lp_string().is_ok_and(|name| name == s.name))
                        .map_or(0, |c| c.offset());
                    sprite_warnings.push(DecodeWarning {
                        chunk_type: ChunkType::SPRITE,
                        offset,
                        error,
                    });
                    false
                }
            },
            Resource::Shader(s) if options.register_shaders => {
                store.add_shader(s.name.clone(), s.clone());
                true
            }
            Resource::Font(f) if options.register_fonts => {
                store.add_font(f.name.clone(), f.clone());
                true
            }
            _ => false,
        };
        report.registered += added as usize;
    }
    report.warnings.extend(sprite_warnings);

    let has_composite = report
        .resources
        .iter()
        .any(|r| matches!(r, Resource::CompositeDrawable(_)));
    if options.assemble_composite && has_composite {
        match CompositeModel::assemble(&report.resources) {
            Ok(model) => report.composite = Some(model),
            Err(error) => {
                let offset = root
                    .first_child_of_type(ChunkType::COMPOSITE_DRAWABLE)
                    .map_or(0, |c| c.offset());
                tracing::warn!(%error, "failed to assemble composite model");
                report.warnings.push(DecodeWarning {
                    chunk_type: ChunkType::COMPOSITE_DRAWABLE,
                    offset,
                    error,
                });
            }
        }
    }

    tracing::debug!(
        resources = report.resources.len(),
        warnings = report.warnings.len(),
        registered = report.registered,
        "loaded container"
    );
    Ok(report)
}

/// Decode an RSD stream stored in an archive.
pub fn load_audio(archive: &RcfArchive, name: &str) -> Result<PcmBuffer> {
    let stream = archive.get_stream(name)?;
    Ok(hitrun_rsd::decode(stream.as_bytes())?)
}
