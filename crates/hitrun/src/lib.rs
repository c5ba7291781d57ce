//! Hitrun - Simpsons: Hit & Run asset ingestion library.
//!
//! This crate provides a unified interface to the hitrun crates and the
//! glue that connects them.
//!
//! # Crates
//!
//! - [`hitrun_common`] - Byte cursor, name hashing, math types
//! - [`hitrun_p3d`] - Pure3D chunk container and typed decoders
//! - [`hitrun_rcf`] - RCF archive reading and writing
//! - [`hitrun_rsd`] - RSD audio decoding (PCM and RADP)
//! - [`hitrun_resource`] - Name-keyed resource store
//!
//! # Example
//!
//! ```no_run
//! use hitrun::prelude::*;
//!
//! let archive = RcfArchive::open("art.rcf")?;
//! let bytes = archive.read("art\\cars\\famil_v.p3d")?;
//!
//! let registry = DecoderRegistry::standard();
//! let store = ResourceStore::new();
//! let report = load_container(bytes, &registry, &store, &LoadOptions::default())?;
//! println!("{} resources, {} warnings", report.resources.len(), report.warnings.len());
//!
//! let music = load_audio(&archive, "sound\\music\\theme.rsd")?;
//! println!("{:?} of audio", music.duration());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod load;

// Re-export all sub-crates
pub use hitrun_common as common;
pub use hitrun_p3d as p3d;
pub use hitrun_rcf as rcf;
pub use hitrun_resource as resource;
pub use hitrun_rsd as rsd;

pub use error::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::load::{load_audio, load_container, LoadOptions, LoadReport};
    pub use hitrun_common::hash::name_hash;
    pub use hitrun_common::ByteCursor;
    pub use hitrun_p3d::decode::CompositeModel;
    pub use hitrun_p3d::{ChunkTree, ChunkType, DecoderRegistry, Resource};
    pub use hitrun_rcf::{ArchiveStream, RcfArchive, RcfWriter};
    pub use hitrun_resource::{ResourceRef, ResourceStore};
    pub use hitrun_rsd::PcmBuffer;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
