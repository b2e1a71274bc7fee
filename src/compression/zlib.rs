//! zlib inflation.
//!
//! Used both to decode entries and as a correctness oracle while guessing
//! where the data table starts, so the decoder is strict: the stream must
//! reach its end marker inside the supplied bytes.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;

use crate::{Error, Result};

/// zlib header pairs (CMF, FLG) emitted at the four compression levels.
pub const ZLIB_MAGIC: [[u8; 2]; 4] = [[0x78, 0x01], [0x78, 0x5E], [0x78, 0x9C], [0x78, 0xDA]];

/// Whether `data` starts with one of the [`ZLIB_MAGIC`] pairs.
#[inline]
pub fn is_zlib(data: &[u8]) -> bool {
    data.len() >= 2 && ZLIB_MAGIC.iter().any(|m| data[..2] == *m)
}

/// Inflate a complete zlib stream.
///
/// `size_hint` pre-sizes the output (the embedding tool records the
/// uncompressed length for most entries). Output beyond `limit` bytes is an
/// error.
///
/// Returns [`Error::Zlib`] on a corrupt, truncated or oversized stream.
pub fn inflate(data: &[u8], size_hint: usize, limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size_hint.min(limit));
    ZlibDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(Error::Zlib)?;
    if out.len() > limit {
        return Err(Error::Zlib(io::Error::new(
            io::ErrorKind::InvalidData,
            "inflated size exceeds limit",
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn inflates_default_level_stream() {
        let packed = compress(b"{\"layers\": []}");
        assert!(is_zlib(&packed));
        assert_eq!(inflate(&packed, 0, 1 << 20).unwrap(), b"{\"layers\": []}");
    }

    #[test]
    fn rejects_truncated_stream() {
        let packed = compress(&[7u8; 4096]);
        assert!(inflate(&packed[..packed.len() - 3], 4096, 1 << 20).is_err());
    }

    #[test]
    fn rejects_garbage_after_magic() {
        assert!(inflate(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF, 0xFF], 0, 1 << 20).is_err());
    }

    #[test]
    fn inflates_past_the_initial_buffer_without_hint() {
        let doc: Vec<u8> = (0..5000u32).flat_map(|i| i.to_be_bytes()).collect();
        let packed = compress(&doc);
        assert_eq!(inflate(&packed, 0, 1 << 20).unwrap(), doc);
        assert_eq!(inflate(&packed, doc.len(), 1 << 20).unwrap(), doc);
    }

    #[test]
    fn small_limit_is_exact() {
        let packed = compress(&[3u8; 50]);
        assert!(inflate(&packed, 0, 10).is_err());
        assert!(inflate(&packed, 0, 49).is_err());
        assert_eq!(inflate(&packed, 0, 50).unwrap().len(), 50);
    }

    #[test]
    fn enforces_output_limit() {
        let packed = compress(&[0u8; 100_000]);
        assert!(inflate(&packed, 0, 1024).is_err());
        assert_eq!(inflate(&packed, 0, 200_000).unwrap().len(), 100_000);
    }
}
