//! Zstandard decompression (requires the `zstd` feature).
//!
//! Newer resource compilers can emit Zstandard instead of zlib. Entries are
//! stored as a single complete frame with no length prefix, so the frame
//! magic at payload offset 0 is the only marker.

#![cfg(feature = "zstd")]

use std::io::{self, Read};

use crate::{Error, Result};

/// Zstandard frame magic (`0xFD2FB528` little-endian).
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Whether `data` starts with [`ZSTD_MAGIC`].
#[inline]
pub fn is_zstd(data: &[u8]) -> bool {
    data.starts_with(&ZSTD_MAGIC)
}

/// Decompress a complete Zstandard frame, refusing output beyond `limit`.
///
/// Returns [`Error::Zstd`] if the decoder cannot be initialised, the frame is
/// corrupt, or the output is too large.
pub fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let decoder = zstd::Decoder::new(data).map_err(Error::Zstd)?;
    let mut out = Vec::new();
    decoder
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(Error::Zstd)?;
    if out.len() > limit {
        return Err(Error::Zstd(io::Error::new(
            io::ErrorKind::InvalidData,
            "decompressed size exceeds limit",
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_frame() {
        let packed = zstd::encode_all(&b"{\"layers\": [1, 2]}"[..], 3).unwrap();
        assert!(is_zstd(&packed));
        assert_eq!(decompress(&packed, 1024).unwrap(), b"{\"layers\": [1, 2]}");
        assert!(decompress(&packed, 4).is_err());
    }
}
