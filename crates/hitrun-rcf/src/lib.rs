//! RCF archive reader for Simpsons: Hit & Run game files.
//!
//! An RCF archive is a flat blob of files indexed by a directory of
//! `{hash, offset, size}` records, where the hash is a CRC32C of the
//! normalized file name (see [`hitrun_common::hash::name_hash`]). An optional
//! name table lists the literal names for browsing.
//!
//! Archives on disk are memory-mapped. Every [`ArchiveStream`] shares the
//! mapping and can be read on any thread.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use hitrun_rcf::RcfArchive;
//!
//! let archive = RcfArchive::open("music00.rcf")?;
//! for name in archive.filenames() {
//!     println!("{name}");
//! }
//!
//! let mut stream = archive.get_stream("sound\\music\\theme.rsd")?;
//! let mut header = [0u8; 8];
//! stream.read_exact(&mut header)?;
//! # Ok::<(), hitrun_rcf::Error>(())
//! ```

mod archive;
mod error;
pub mod header;
mod stream;
mod writer;

pub use archive::RcfArchive;
pub use error::{Error, Result};
pub use header::{DirectoryEntry, RcfHeader};
pub use stream::ArchiveStream;
pub use writer::RcfWriter;
