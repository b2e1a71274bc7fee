//! Data table records.
//!
//! Compression is detected from the payload itself rather than from the
//! tree node flags, so a record can be decoded from its offset alone.

use crate::compression::zlib;
use crate::utils::{be_u32_at, bytes_at, contains};
use crate::{Error, Result};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// What a decoded record contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Contains the catalog document marker.
    Json,
    /// Starts with the PNG signature.
    Png,
    Other,
}

/// Classify decoded bytes. PNG wins over the marker.
pub fn classify(bytes: &[u8], marker: &[u8]) -> EntryKind {
    if bytes.starts_with(&PNG_SIGNATURE) {
        EntryKind::Png
    } else if contains(bytes, marker) {
        EntryKind::Json
    } else {
        EntryKind::Other
    }
}

/// The `TotalSize` field of the record at `data_base + data_offset`.
pub fn entry_size(buf: &[u8], data_base: usize, data_offset: u32) -> Option<u32> {
    be_u32_at(buf, data_base.checked_add(data_offset as usize)?)
}

/// Read the record at `data_base + data_offset`, inflating it if needed.
///
/// Returns [`Error::InvalidRange`] if the record runs past the buffer, or a
/// decompression error; callers treat both as "entry unusable".
pub fn read_entry(buf: &[u8], data_base: usize, data_offset: u32, limit: usize) -> Result<Vec<u8>> {
    let at = data_base
        .checked_add(data_offset as usize)
        .ok_or(Error::InvalidRange)?;
    let size = be_u32_at(buf, at).ok_or(Error::InvalidRange)? as usize;
    let payload = bytes_at(buf, at + 4, size).ok_or(Error::InvalidRange)?;
    decode_payload(payload, limit)
}

/// Decode one record payload.
///
/// * zlib magic at offset 0: the payload is a bare zlib stream.
/// * zlib magic at offset 4: a `u32 BE` uncompressed length, then zlib.
/// * Zstandard frame magic (with the `zstd` feature): one zstd frame.
/// * Anything else is returned unchanged.
pub fn decode_payload(payload: &[u8], limit: usize) -> Result<Vec<u8>> {
    if zlib::is_zlib(payload) {
        return zlib::inflate(payload, 0, limit);
    }
    if let Some(hint) = be_u32_at(payload, 0)
        && (hint as usize) <= limit
        && zlib::is_zlib(&payload[4..])
    {
        return zlib::inflate(&payload[4..], hint as usize, limit);
    }
    #[cfg(feature = "zstd")]
    if crate::compression::zstd::is_zstd(payload) {
        return crate::compression::zstd::decompress(payload, limit);
    }
    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;

    const LIMIT: usize = 1 << 20;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn record(payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn reads_raw_and_compressed_records() {
        let doc = br#"{"tilesetId": 1}"#;
        let mut buf = vec![0xEE; 8];
        let raw_at = 0u32;
        buf.extend(record(b"plain bytes"));
        let packed_at = (buf.len() - 8) as u32;
        buf.extend(record(&zlib(doc)));

        assert_eq!(read_entry(&buf, 8, raw_at, LIMIT).unwrap(), b"plain bytes");
        assert_eq!(read_entry(&buf, 8, packed_at, LIMIT).unwrap(), doc);
        assert_eq!(entry_size(&buf, 8, raw_at), Some(11));
    }

    #[test]
    fn reads_length_prefixed_zlib() {
        let doc = br#"{"tilesetId": 3, "width": 20}"#;
        let mut payload = (doc.len() as u32).to_be_bytes().to_vec();
        payload.extend(zlib(doc));
        let buf = record(&payload);
        assert_eq!(read_entry(&buf, 0, 0, LIMIT).unwrap(), doc);
    }

    #[test]
    fn corrupt_stream_is_an_error() {
        let buf = record(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(read_entry(&buf, 0, 0, LIMIT), Err(Error::Zlib(_))));
    }

    #[test]
    fn overrunning_record_is_invalid_range() {
        let mut buf = 100u32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"short");
        assert!(matches!(read_entry(&buf, 0, 0, LIMIT), Err(Error::InvalidRange)));
        assert!(matches!(read_entry(&buf, usize::MAX, 1, LIMIT), Err(Error::InvalidRange)));
    }

    #[test]
    fn classifies_by_content() {
        let marker = b"\"tilesetId\"";
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"IHDR\"tilesetId\"");
        assert_eq!(classify(&png, marker), EntryKind::Png);
        assert_eq!(classify(br#"{"tilesetId": 0}"#, marker), EntryKind::Json);
        assert_eq!(classify(b"{}", marker), EntryKind::Other);
    }
}
