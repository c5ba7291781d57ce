//! Name hashing.
//!
//! Archive directories key their entries by a CRC32C (Castagnoli) of the
//! normalized file name: ASCII lowercased, with `/` mapped to `\`. The hash
//! is stable across platforms and uses SSE4.2 when available.

/// Compute CRC32C hash of a byte slice.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Normalize a file name the way archive directories store it.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' => '\\',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Hash a file name for archive lookup.
///
/// `Sound\\Music.rsd`, `sound/music.rsd` and `SOUND\\MUSIC.RSD` all hash to
/// the same value.
pub fn name_hash(name: &str) -> u32 {
    let mut crc = 0u32;
    let mut buf = [0u8; 4];
    for c in name.chars() {
        let c = match c {
            '/' => '\\',
            c => c.to_ascii_lowercase(),
        };
        crc = crc32c::crc32c_append(crc, c.encode_utf8(&mut buf).as_bytes());
    }
    crc
}
