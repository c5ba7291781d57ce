//! Common utilities for hitrun.
//!
//! This crate provides the foundational types shared by the format crates:
//!
//! - [`ByteCursor`] - Bounds-checked, seekable reading over byte slices
//! - [`hash`] - Normalized CRC32C name hashing
//! - [`math`] - Vectors, quaternions and column-major matrices decoded from assets

mod cursor;
mod error;

pub mod hash;
pub mod math;

pub use cursor::{ByteCursor, SeekFrom};
pub use error::{Error, Result};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
